use crate::attribute_generator::generate_attributes;
use crate::builtin::BuiltinKind;
use crate::error::XMLSamplerError;
use crate::generate::GenerationContext;
use crate::group_generator::generate_group;
use crate::schema::{ElementNode, TypeDef};
use crate::tree::XmlNode;

/// Elements nested deeper than this are treated as runaway recursion.
const MAX_ELEMENT_DEPTH: usize = 64;

/// Generate one occurrence of `element`.
///
/// The caller has already decided how many occurrences to produce.
pub(crate) fn generate_element(
    context: &mut GenerationContext<'_>,
    element: &ElementNode,
) -> Result<XmlNode, XMLSamplerError> {
    if context.depth >= MAX_ELEMENT_DEPTH {
        return Err(XMLSamplerError::DataTypesFormatError(format!(
            "Element '{}' is nested more than {} levels deep",
            element.name, MAX_ELEMENT_DEPTH
        )));
    }

    context.depth += 1;
    let result = build_element(context, element);
    context.depth -= 1;

    result
}

fn build_element(
    context: &mut GenerationContext<'_>,
    element: &ElementNode,
) -> Result<XmlNode, XMLSamplerError> {
    let mut node = XmlNode::new(&element.name);
    let model = context.model;

    match model.get(element.type_id) {
        TypeDef::Builtin(BuiltinKind::AnyType) => {}
        TypeDef::Complex(complex) => {
            generate_attributes(context, &complex.attributes, &mut node)?;
            if let Some(content) = &complex.content {
                generate_group(context, content, &mut node)?;
            }
        }
        TypeDef::Builtin(_) | TypeDef::Restriction { .. } => {
            let simple = context.resolve(element.type_id, &element.name)?;
            node.text = context.value(&element.name, simple.as_deref())?;
        }
    }

    Ok(node)
}
