use crate::element_generator::generate_element;
use crate::error::XMLSamplerError;
use crate::generate::GenerationContext;
use crate::schema::{GroupModel, GroupNode, Particle};
use crate::tree::XmlNode;

/// Append the repetitions of `group` to `parent`.
pub(crate) fn generate_group(
    context: &mut GenerationContext<'_>,
    group: &GroupNode,
    parent: &mut XmlNode,
) -> Result<(), XMLSamplerError> {
    let repetitions = context.occurrences(group.min_occurs, group.max_occurs);

    for _ in 0..repetitions {
        match group.model {
            // `all` keeps declaration order
            GroupModel::Sequence | GroupModel::All => {
                for particle in &group.children {
                    generate_particle(context, particle, parent)?;
                }
            }
            GroupModel::Choice => {
                if let Some(particle) = context.randomizer.choose(&group.children) {
                    generate_particle(context, particle, parent)?;
                }
            }
        }
    }

    Ok(())
}

fn generate_particle(
    context: &mut GenerationContext<'_>,
    particle: &Particle,
    parent: &mut XmlNode,
) -> Result<(), XMLSamplerError> {
    match particle {
        Particle::Element(element) => {
            let count = context.occurrences(element.min_occurs, element.max_occurs);
            for _ in 0..count {
                let child = generate_element(context, element)?;
                parent.children.push(child);
            }
        }
        Particle::Group(group) => generate_group(context, group, parent)?,
        Particle::Any(_) => {}
    }

    Ok(())
}
