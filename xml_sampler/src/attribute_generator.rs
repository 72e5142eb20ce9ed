use crate::error::XMLSamplerError;
use crate::generate::GenerationContext;
use crate::schema::{AttributeNode, AttributeUse};
use crate::tree::XmlNode;

/// Add the attributes declared for an element, in declaration order.
pub(crate) fn generate_attributes(
    context: &mut GenerationContext<'_>,
    attributes: &[AttributeNode],
    node: &mut XmlNode,
) -> Result<(), XMLSamplerError> {
    for attribute in attributes {
        let included = match attribute.use_ {
            AttributeUse::Prohibited => false,
            AttributeUse::Optional => {
                context.randomizer.probability() <= context.config.randomization.inclusion_probability
            }
            AttributeUse::Required => true,
        };
        if !included {
            continue;
        }

        let simple = context.resolve(attribute.type_id, &attribute.name)?;
        if let Some(value) = context.value(&attribute.name, simple.as_deref())? {
            node.attributes.push((attribute.name.clone(), value));
        }
    }

    Ok(())
}
