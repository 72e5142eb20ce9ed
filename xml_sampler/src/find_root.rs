use crate::error::XMLSamplerError;
use crate::schema::{ElementNode, SchemaModel};

/// Root element of the document: the first top-level element that no other
/// element uses through `ref`.
pub fn find_root_element(model: &SchemaModel) -> Result<&ElementNode, XMLSamplerError> {
    if model.elements().is_empty() {
        return Err(XMLSamplerError::DataTypesFormatError(
            "No elements found".to_string(),
        ));
    }

    let independent_elements: Vec<&ElementNode> = model
        .elements()
        .iter()
        .filter(|element| !model.is_referenced(&element.name))
        .collect();

    match independent_elements.as_slice() {
        [] => Err(XMLSamplerError::DataTypesFormatError(
            "No independent elements found".to_string(),
        )),
        [root] => Ok(*root),
        [root, others @ ..] => {
            let others: Vec<&str> = others.iter().map(|element| element.name.as_str()).collect();
            tracing::warn!(
                "Multiple independent (root) elements found, using '{}' and ignoring {:?}",
                root.name,
                others
            );
            Ok(*root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(model: &mut SchemaModel, name: &str) {
        let type_id = model.builtin_type("string").unwrap();
        model.add_element(ElementNode {
            name: name.to_string(),
            type_id,
            min_occurs: 1,
            max_occurs: Some(1),
        });
    }

    #[test]
    fn test_no_elements() {
        let model = SchemaModel::new();
        match find_root_element(&model) {
            Err(XMLSamplerError::DataTypesFormatError(error)) => assert_eq!(error, "No elements found"),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_referenced_elements_are_skipped() {
        let mut model = SchemaModel::new();
        element(&mut model, "Child");
        element(&mut model, "Root");
        model.add_reference("Child");

        assert_eq!(find_root_element(&model).unwrap().name, "Root");
    }

    #[test]
    fn test_first_independent_element_wins() {
        let mut model = SchemaModel::new();
        element(&mut model, "First");
        element(&mut model, "Second");

        assert_eq!(find_root_element(&model).unwrap().name, "First");
    }

    #[test]
    fn test_all_elements_referenced() {
        let mut model = SchemaModel::new();
        element(&mut model, "A");
        element(&mut model, "B");
        model.add_reference("A");
        model.add_reference("B");

        match find_root_element(&model) {
            Err(XMLSamplerError::DataTypesFormatError(error)) => {
                assert_eq!(error, "No independent elements found")
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
