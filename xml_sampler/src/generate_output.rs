use crate::error::XMLSamplerError;
use crate::tree::XmlNode;
use xml_builder::{XMLBuilder, XMLElement, XMLVersion};

fn build_element(node: &XmlNode) -> Result<XMLElement, XMLSamplerError> {
    let mut element = XMLElement::new(&node.name);
    for (name, value) in &node.attributes {
        element.add_attribute(name, value);
    }

    if let Some(text) = &node.text {
        element
            .add_text(text.clone())
            .map_err(|err| XMLSamplerError::XMLBuilderError(err.to_string()))?;
    }

    for child in &node.children {
        let child = build_element(child)?;
        element
            .add_child(child)
            .map_err(|err| XMLSamplerError::XMLBuilderError(err.to_string()))?;
    }

    Ok(element)
}

/// Serialize a generated document as XML 1.1 in UTF-8.
pub fn generate_output(root: &XmlNode) -> Result<String, XMLSamplerError> {
    let mut xml = XMLBuilder::new()
        .version(XMLVersion::XML1_1)
        .encoding("UTF-8".into())
        .build();

    xml.set_root_element(build_element(root)?);

    let mut writer: Vec<u8> = Vec::new();
    xml.generate(&mut writer)
        .map_err(|err| XMLSamplerError::XMLBuilderError(err.to_string()))?;

    String::from_utf8(writer).map_err(|err| {
        XMLSamplerError::XMLBuilderError(format!("Unable to convert XML output to string: {}", err))
    })
}
