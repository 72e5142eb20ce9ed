use crate::builtin::BuiltinKind;
use crate::error::XMLSamplerError;
use crate::facets::FacetSet;
use std::collections::{HashMap, HashSet};

/// Restriction chains deeper than this are treated as malformed.
const MAX_RESTRICTION_DEPTH: usize = 64;

/// Index of a type definition in a [`SchemaModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUse {
    Required,
    Optional,
    Prohibited,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeNode {
    pub name: String,
    pub type_id: TypeId,
    pub use_: AttributeUse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub name: String,
    pub type_id: TypeId,
    pub min_occurs: usize,
    /// `None` for `maxOccurs="unbounded"`
    pub max_occurs: Option<usize>,
}

/// `xs:any` wildcard. Never produces content.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyNode {
    pub min_occurs: usize,
    pub max_occurs: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupModel {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    Element(ElementNode),
    Group(GroupNode),
    Any(AnyNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub model: GroupModel,
    pub min_occurs: usize,
    pub max_occurs: Option<usize>,
    pub children: Vec<Particle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub content: Option<GroupNode>,
    pub attributes: Vec<AttributeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Builtin(BuiltinKind),
    Restriction { base: TypeId, facets: FacetSet },
    Complex(ComplexType),
}

/// A simple type with its restriction chain flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    pub kind: BuiltinKind,
    pub facets: FacetSet,
}

/// Read-only content model of one schema: an arena of type definitions plus
/// the top-level element declarations.
#[derive(Debug, Default)]
pub struct SchemaModel {
    types: Vec<TypeDef>,
    builtins: HashMap<String, TypeId>,
    elements: Vec<ElementNode>,
    /// Top-level elements used through `ref`
    references: HashSet<String>,
}

impl SchemaModel {
    pub fn new() -> SchemaModel {
        SchemaModel::default()
    }

    pub fn add_type(&mut self, type_def: TypeDef) -> TypeId {
        self.types.push(type_def);
        TypeId(self.types.len() - 1)
    }

    pub(crate) fn replace_type(&mut self, id: TypeId, type_def: TypeDef) {
        self.types[id.0] = type_def;
    }

    /// Id of the builtin type named `name`, creating it on first use.
    ///
    /// Derived builtins are registered as a restriction of their primitive.
    pub fn builtin_type(&mut self, name: &str) -> Option<TypeId> {
        if let Some(id) = self.builtins.get(name) {
            return Some(*id);
        }

        let (kind, facets) = BuiltinKind::from_local_name(name)?;
        let id = if facets == FacetSet::new() {
            self.add_type(TypeDef::Builtin(kind))
        } else {
            let base = self.builtin_type(kind.name())?;
            self.add_type(TypeDef::Restriction { base, facets })
        };
        self.builtins.insert(name.to_string(), id);

        Some(id)
    }

    pub fn get(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0]
    }

    pub fn add_element(&mut self, element: ElementNode) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[ElementNode] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&ElementNode> {
        self.elements.iter().find(|element| element.name == name)
    }

    pub(crate) fn add_reference(&mut self, name: &str) {
        self.references.insert(name.to_string());
    }

    pub fn is_referenced(&self, name: &str) -> bool {
        self.references.contains(name)
    }

    /// Flatten the restriction chain of `id` down to its builtin kind.
    ///
    /// Returns `None` for complex types. `node` names the element or
    /// attribute using the type in error messages.
    pub fn resolve_simple(&self, id: TypeId, node: &str) -> Result<Option<SimpleType>, XMLSamplerError> {
        let mut facets = FacetSet::new();
        let mut current = id;

        for _ in 0..MAX_RESTRICTION_DEPTH {
            match self.get(current) {
                TypeDef::Builtin(kind) => {
                    return Ok(Some(SimpleType {
                        kind: *kind,
                        facets,
                    }));
                }
                TypeDef::Restriction {
                    base,
                    facets: restriction,
                } => {
                    facets.inherit(restriction);
                    current = *base;
                }
                TypeDef::Complex(_) => {
                    if current == id {
                        return Ok(None);
                    }

                    return Err(XMLSamplerError::DataTypesFormatError(format!(
                        "Simple type of '{}' restricts a complex type",
                        node
                    )));
                }
            }
        }

        Err(XMLSamplerError::DataTypesFormatError(format!(
            "Restriction chain of '{}' is too deep",
            node
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_restriction_chain() {
        let mut model = SchemaModel::new();
        let integer = model.builtin_type("integer").unwrap();
        let bounded = model.add_type(TypeDef::Restriction {
            base: integer,
            facets: FacetSet {
                min_inclusive: Some("10".to_string()),
                max_inclusive: Some("100".to_string()),
                ..FacetSet::new()
            },
        });
        let narrowed = model.add_type(TypeDef::Restriction {
            base: bounded,
            facets: FacetSet {
                max_inclusive: Some("50".to_string()),
                ..FacetSet::new()
            },
        });

        let resolved = model.resolve_simple(narrowed, "Value").unwrap().unwrap();
        assert_eq!(resolved.kind, BuiltinKind::Integer);
        assert_eq!(resolved.facets.min_inclusive.as_deref(), Some("10"));
        assert_eq!(resolved.facets.max_inclusive.as_deref(), Some("50"));
    }

    #[test]
    fn test_builtin_types_are_interned() {
        let mut model = SchemaModel::new();
        let first = model.builtin_type("positiveInteger").unwrap();
        let second = model.builtin_type("positiveInteger").unwrap();
        assert_eq!(first, second);

        let resolved = model.resolve_simple(first, "Value").unwrap().unwrap();
        assert_eq!(resolved.kind, BuiltinKind::Integer);
        assert_eq!(resolved.facets.min_inclusive.as_deref(), Some("1"));
    }

    #[test]
    fn test_complex_type_is_not_simple() {
        let mut model = SchemaModel::new();
        let complex = model.add_type(TypeDef::Complex(ComplexType {
            content: None,
            attributes: vec![],
        }));

        assert_eq!(model.resolve_simple(complex, "Value").unwrap(), None);
    }

    #[test]
    fn test_cyclic_restriction_is_rejected() {
        let mut model = SchemaModel::new();
        let first = model.add_type(TypeDef::Builtin(BuiltinKind::String));
        let second = model.add_type(TypeDef::Restriction {
            base: first,
            facets: FacetSet::new(),
        });
        model.replace_type(
            first,
            TypeDef::Restriction {
                base: second,
                facets: FacetSet::new(),
            },
        );

        match model.resolve_simple(second, "Leaf") {
            Err(XMLSamplerError::DataTypesFormatError(error)) => {
                assert_eq!(error, "Restriction chain of 'Leaf' is too deep")
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
