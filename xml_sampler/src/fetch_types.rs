use crate::builtin::BuiltinKind;
use crate::error::XMLSamplerError;
use crate::facets::FacetSet;
use crate::schema::{
    AnyNode, AttributeNode, AttributeUse, ComplexType, ElementNode, GroupModel, GroupNode,
    Particle, SchemaModel, TypeDef, TypeId,
};
use std::collections::HashMap;
use xsd_parser::Schemas;
use xsd_parser::models::schema::xs::{
    AttributeType, AttributeUseType, ComplexBaseType, ComplexBaseTypeContent, ElementType,
    ElementTypeContent, Facet, FacetType, GroupType, GroupTypeContent, Restriction,
    RestrictionContent, SchemaContent, SimpleBaseType, SimpleBaseTypeContent,
};
use xsd_parser::models::schema::{MaxOccurs, QName};

fn unsupported(construct: &str) -> XMLSamplerError {
    XMLSamplerError::DataTypesFormatError(format!("Unsupported schema construct: {}", construct))
}

fn get_qname(qname: &QName) -> Result<String, XMLSamplerError> {
    String::from_utf8(qname.local_name().to_vec())
        .map_err(|err| XMLSamplerError::XSDParserError(err.to_string()))
}

fn get_max_occurs(max_occurs: &MaxOccurs) -> Option<usize> {
    match max_occurs {
        MaxOccurs::Unbounded => None,
        MaxOccurs::Bounded(x) => Some(*x),
    }
}

fn get_facet_number<T: std::str::FromStr>(facet_type: &FacetType, facet: &str) -> Result<T, XMLSamplerError> {
    facet_type.value.trim().parse().map_err(|_| {
        XMLSamplerError::DataTypesFormatError(format!(
            "Invalid value '{}' for facet {}",
            facet_type.value, facet
        ))
    })
}

fn add_facet(facets: &mut FacetSet, facet: &Facet) -> Result<(), XMLSamplerError> {
    match facet {
        Facet::MinExclusive(x) => facets.min_exclusive = Some(x.value.clone()),
        Facet::MinInclusive(x) => facets.min_inclusive = Some(x.value.clone()),
        Facet::MaxExclusive(x) => facets.max_exclusive = Some(x.value.clone()),
        Facet::MaxInclusive(x) => facets.max_inclusive = Some(x.value.clone()),
        Facet::TotalDigits(x) => facets.total_digits = Some(get_facet_number(x, "totalDigits")?),
        Facet::FractionDigits(x) => {
            facets.fraction_digits = Some(get_facet_number(x, "fractionDigits")?)
        }
        Facet::Length(x) => facets.length = Some(get_facet_number(x, "length")?),
        Facet::MinLength(x) => facets.min_length = Some(get_facet_number(x, "minLength")?),
        Facet::MaxLength(x) => facets.max_length = Some(get_facet_number(x, "maxLength")?),
        Facet::Enumeration(x) => facets.enumeration.push(x.value.clone()),
        Facet::Pattern(x) => facets.patterns.push(x.value.clone()),
        // no effect on generated values
        Facet::WhiteSpace(_) | Facet::ExplicitTimezone(_) => {}
        Facet::Assertion(_) => return Err(unsupported("assertion facet")),
    }

    Ok(())
}

/// Converts the parsed `xs` model into a [`SchemaModel`].
///
/// Named types are registered before any of them is built so that
/// declarations may appear in any order.
struct ModelBuilder<'s> {
    model: SchemaModel,
    named_types: HashMap<String, TypeId>,
    simple_types: Vec<(TypeId, &'s SimpleBaseType)>,
    complex_types: Vec<(TypeId, &'s ComplexBaseType)>,
    groups: HashMap<String, &'s GroupType>,
    top_level: Vec<(String, &'s ElementType)>,
    /// Types of top-level elements, shared by their declaration and every `ref`
    element_types: HashMap<String, TypeId>,
    /// Named groups being expanded
    group_stack: Vec<String>,
}

impl<'s> ModelBuilder<'s> {
    fn new() -> Self {
        ModelBuilder {
            model: SchemaModel::new(),
            named_types: HashMap::new(),
            simple_types: vec![],
            complex_types: vec![],
            groups: HashMap::new(),
            top_level: vec![],
            element_types: HashMap::new(),
            group_stack: vec![],
        }
    }

    fn placeholder(&mut self) -> TypeId {
        self.model.add_type(TypeDef::Builtin(BuiltinKind::AnyType))
    }

    fn register_type(&mut self, name: &Option<String>, kind: &str) -> Result<TypeId, XMLSamplerError> {
        let Some(name) = name else {
            return Err(XMLSamplerError::DataTypesFormatError(format!(
                "Top-level {} type does not have a name",
                kind
            )));
        };

        let id = self.placeholder();
        self.named_types.insert(name.clone(), id);

        Ok(id)
    }

    fn collect(&mut self, content: &'s SchemaContent) -> Result<(), XMLSamplerError> {
        match content {
            SchemaContent::Annotation(_) => {}
            SchemaContent::SimpleType(x) => {
                let simple: &'s SimpleBaseType = x;
                let id = self.register_type(&simple.name, "simple")?;
                self.simple_types.push((id, simple));
            }
            SchemaContent::ComplexType(x) => {
                let complex: &'s ComplexBaseType = x;
                let id = self.register_type(&complex.name, "complex")?;
                self.complex_types.push((id, complex));
            }
            SchemaContent::Group(x) => {
                let group: &'s GroupType = x;
                let Some(name) = &group.name else {
                    return Err(XMLSamplerError::DataTypesFormatError(
                        "Top-level group does not have a name".to_string(),
                    ));
                };
                self.groups.insert(name.clone(), group);
            }
            SchemaContent::Element(x) => {
                let element: &'s ElementType = x;
                let Some(name) = &element.name else {
                    return Err(XMLSamplerError::DataTypesFormatError(
                        "Element does not have a name or a reference".to_string(),
                    ));
                };
                self.top_level.push((name.clone(), element));
            }
            SchemaContent::Include(_) => return Err(unsupported("include")),
            SchemaContent::Import(_) => return Err(unsupported("import")),
            SchemaContent::Redefine(_) => return Err(unsupported("redefine")),
            SchemaContent::Override(_) => return Err(unsupported("override")),
            SchemaContent::DefaultOpenContent(_) => return Err(unsupported("defaultOpenContent")),
            SchemaContent::AttributeGroup(_) => return Err(unsupported("attributeGroup")),
            SchemaContent::Attribute(_) => return Err(unsupported("top-level attribute")),
            SchemaContent::Notation(_) => return Err(unsupported("notation")),
        }

        Ok(())
    }

    fn build(mut self) -> Result<SchemaModel, XMLSamplerError> {
        for (id, simple) in std::mem::take(&mut self.simple_types) {
            let definition = self.simple_type_def(simple)?;
            self.model.replace_type(id, definition);
        }

        for (id, complex) in std::mem::take(&mut self.complex_types) {
            let definition = self.complex_type_def(complex)?;
            self.model.replace_type(id, definition);
        }

        for (name, element) in self.top_level.clone() {
            check_element(element, &name)?;
            let type_id = self.top_level_type(&name, element)?;
            self.model.add_element(ElementNode {
                name,
                type_id,
                min_occurs: 1,
                max_occurs: Some(1),
            });
        }

        Ok(self.model)
    }

    fn resolve_type_name(&mut self, qname: &QName) -> Result<TypeId, XMLSamplerError> {
        let name = get_qname(qname)?;
        if let Some(id) = self.named_types.get(&name) {
            return Ok(*id);
        }

        self.model.builtin_type(&name).ok_or_else(|| {
            XMLSamplerError::DataTypeError(format!("Cannot find data type: {}", name))
        })
    }

    fn builtin(&mut self, name: &str) -> Result<TypeId, XMLSamplerError> {
        self.model.builtin_type(name).ok_or_else(|| {
            XMLSamplerError::DataTypeError(format!("Cannot find data type: {}", name))
        })
    }

    fn simple_type_def(&mut self, simple: &SimpleBaseType) -> Result<TypeDef, XMLSamplerError> {
        let mut definition = None;
        for content in &simple.content {
            match content {
                SimpleBaseTypeContent::Annotation(_) => {}
                SimpleBaseTypeContent::Restriction(x) => definition = Some(self.restriction_def(x)?),
                SimpleBaseTypeContent::List(_) => return Err(unsupported("list simple type")),
                SimpleBaseTypeContent::Union(_) => return Err(unsupported("union simple type")),
            }
        }

        match definition {
            Some(definition) => Ok(definition),
            None => Ok(TypeDef::Restriction {
                base: self.builtin("string")?,
                facets: FacetSet::new(),
            }),
        }
    }

    fn restriction_def(&mut self, restriction: &Restriction) -> Result<TypeDef, XMLSamplerError> {
        let mut base = match &restriction.base {
            Some(qname) => Some(self.resolve_type_name(qname)?),
            None => None,
        };

        let mut facets = FacetSet::new();
        for content in &restriction.content {
            match content {
                RestrictionContent::Annotation(_) => {}
                RestrictionContent::SimpleType(x) => {
                    let definition = self.simple_type_def(x)?;
                    base = Some(self.model.add_type(definition));
                }
                RestrictionContent::Facet(x) => add_facet(&mut facets, x)?,
            }
        }

        let base = base.ok_or_else(|| {
            XMLSamplerError::DataTypesFormatError("Restriction does not have a base type".to_string())
        })?;

        Ok(TypeDef::Restriction { base, facets })
    }

    fn complex_type_def(&mut self, complex: &ComplexBaseType) -> Result<TypeDef, XMLSamplerError> {
        let mut content = None;
        let mut attributes = vec![];

        for item in &complex.content {
            match item {
                ComplexBaseTypeContent::Annotation(_) | ComplexBaseTypeContent::AnyAttribute(_) => {}
                ComplexBaseTypeContent::Sequence(x) => {
                    content = Some(self.group_node(x, GroupModel::Sequence)?)
                }
                ComplexBaseTypeContent::Choice(x) => content = Some(self.group_node(x, GroupModel::Choice)?),
                ComplexBaseTypeContent::All(x) => content = Some(self.group_node(x, GroupModel::All)?),
                ComplexBaseTypeContent::Group(x) => content = Some(self.group_reference(x)?),
                ComplexBaseTypeContent::Attribute(x) => attributes.push(self.attribute_node(x)?),
                ComplexBaseTypeContent::SimpleContent(_) => return Err(unsupported("simpleContent")),
                ComplexBaseTypeContent::ComplexContent(_) => return Err(unsupported("complexContent")),
                ComplexBaseTypeContent::OpenContent(_) => return Err(unsupported("openContent")),
                ComplexBaseTypeContent::AttributeGroup(_) => return Err(unsupported("attributeGroup")),
                ComplexBaseTypeContent::Assert(_) => return Err(unsupported("assert")),
            }
        }

        Ok(TypeDef::Complex(ComplexType {
            content,
            attributes,
        }))
    }

    fn group_node(&mut self, group: &GroupType, model: GroupModel) -> Result<GroupNode, XMLSamplerError> {
        let mut children = vec![];
        for content in &group.content {
            let particle = match content {
                GroupTypeContent::Annotation(_) => continue,
                GroupTypeContent::Element(x) => Particle::Element(self.element_node(x)?),
                GroupTypeContent::Group(x) => Particle::Group(self.group_reference(x)?),
                GroupTypeContent::Sequence(x) => Particle::Group(self.group_node(x, GroupModel::Sequence)?),
                GroupTypeContent::Choice(x) => Particle::Group(self.group_node(x, GroupModel::Choice)?),
                GroupTypeContent::All(x) => Particle::Group(self.group_node(x, GroupModel::All)?),
                GroupTypeContent::Any(x) => Particle::Any(AnyNode {
                    min_occurs: x.min_occurs,
                    max_occurs: get_max_occurs(&x.max_occurs),
                }),
            };
            children.push(particle);
        }

        Ok(GroupNode {
            model,
            min_occurs: group.min_occurs,
            max_occurs: get_max_occurs(&group.max_occurs),
            children,
        })
    }

    /// Inline the named group referenced by `group`, keeping the occurrence
    /// bounds of the reference.
    fn group_reference(&mut self, group: &GroupType) -> Result<GroupNode, XMLSamplerError> {
        let Some(reference) = &group.ref_ else {
            return Err(XMLSamplerError::DataTypesFormatError(
                "Group does not have a reference".to_string(),
            ));
        };
        let name = get_qname(reference)?;

        if self.group_stack.contains(&name) {
            return Err(XMLSamplerError::DataTypesFormatError(format!(
                "Group '{}' references itself",
                name
            )));
        }
        let definition = self.groups.get(&name).copied().ok_or_else(|| {
            XMLSamplerError::DataTypeError(format!("Cannot find group: {}", name))
        })?;

        self.group_stack.push(name.clone());
        let inner = self.named_group_content(&name, definition);
        self.group_stack.pop();

        Ok(GroupNode {
            model: GroupModel::Sequence,
            min_occurs: group.min_occurs,
            max_occurs: get_max_occurs(&group.max_occurs),
            children: vec![Particle::Group(inner?)],
        })
    }

    fn named_group_content(&mut self, name: &str, definition: &GroupType) -> Result<GroupNode, XMLSamplerError> {
        for content in &definition.content {
            match content {
                GroupTypeContent::Annotation(_) => {}
                GroupTypeContent::Sequence(x) => return self.group_node(x, GroupModel::Sequence),
                GroupTypeContent::Choice(x) => return self.group_node(x, GroupModel::Choice),
                GroupTypeContent::All(x) => return self.group_node(x, GroupModel::All),
                _ => break,
            }
        }

        Err(XMLSamplerError::DataTypesFormatError(format!(
            "Group '{}' must contain a sequence, choice or all",
            name
        )))
    }

    fn element_node(&mut self, element: &ElementType) -> Result<ElementNode, XMLSamplerError> {
        let min_occurs = element.min_occurs;
        let max_occurs = get_max_occurs(&element.max_occurs);

        if let Some(reference) = &element.ref_ {
            let name = get_qname(reference)?;
            check_element(element, &name)?;
            let type_id = self.referenced_type(&name)?;
            self.model.add_reference(&name);

            return Ok(ElementNode {
                name,
                type_id,
                min_occurs,
                max_occurs,
            });
        }

        let Some(name) = &element.name else {
            return Err(XMLSamplerError::DataTypesFormatError(
                "Element does not have a name or a reference".to_string(),
            ));
        };
        check_element(element, name)?;

        Ok(ElementNode {
            name: name.clone(),
            type_id: self.element_type(name, element, None)?,
            min_occurs,
            max_occurs,
        })
    }

    fn referenced_type(&mut self, name: &str) -> Result<TypeId, XMLSamplerError> {
        let element = self
            .top_level
            .iter()
            .find(|(top_level_name, _)| top_level_name == name)
            .map(|(_, element)| *element)
            .ok_or_else(|| XMLSamplerError::DataTypeError(format!("Cannot find element: {}", name)))?;

        self.top_level_type(name, element)
    }

    /// Type of a top-level element, built once.
    ///
    /// An inline type gets its id before it is built, so references to the
    /// element from inside its own content resolve.
    fn top_level_type(&mut self, name: &str, element: &ElementType) -> Result<TypeId, XMLSamplerError> {
        if let Some(id) = self.element_types.get(name) {
            return Ok(*id);
        }

        let reserved = match &element.type_ {
            Some(_) => None,
            None => {
                let id = self.placeholder();
                self.element_types.insert(name.to_string(), id);
                Some(id)
            }
        };

        let id = self.element_type(name, element, reserved)?;
        self.element_types.insert(name.to_string(), id);

        Ok(id)
    }

    fn element_type(
        &mut self,
        name: &str,
        element: &ElementType,
        reserved: Option<TypeId>,
    ) -> Result<TypeId, XMLSamplerError> {
        let mut definition = None;
        for content in &element.content {
            match content {
                ElementTypeContent::Annotation(_)
                | ElementTypeContent::Unique(_)
                | ElementTypeContent::Key(_)
                | ElementTypeContent::Keyref(_) => {}
                ElementTypeContent::SimpleType(x) => definition = Some(self.simple_type_def(x)?),
                ElementTypeContent::ComplexType(x) => definition = Some(self.complex_type_def(x)?),
                ElementTypeContent::Alternative(_) => return Err(unsupported("type alternative")),
            }
        }

        match (definition, &element.type_) {
            (Some(_), Some(_)) => Err(XMLSamplerError::DataTypesFormatError(format!(
                "Element '{}' has a type and an inline type definition",
                name
            ))),
            (Some(definition), None) => match reserved {
                Some(id) => {
                    self.model.replace_type(id, definition);
                    Ok(id)
                }
                None => Ok(self.model.add_type(definition)),
            },
            (None, Some(qname)) => self.resolve_type_name(qname),
            // reserved ids already hold `anyType`
            (None, None) => match reserved {
                Some(id) => Ok(id),
                None => self.builtin("anyType"),
            },
        }
    }

    fn attribute_node(&mut self, attribute: &AttributeType) -> Result<AttributeNode, XMLSamplerError> {
        if attribute.ref_.is_some() {
            return Err(unsupported("attribute reference"));
        }

        let Some(name) = &attribute.name else {
            return Err(XMLSamplerError::DataTypesFormatError(
                "Attribute does not have a name".to_string(),
            ));
        };

        let type_id = if let Some(qname) = &attribute.type_ {
            self.resolve_type_name(qname)?
        } else if let Some(simple) = &attribute.simple_type {
            let definition = self.simple_type_def(simple)?;
            self.model.add_type(definition)
        } else {
            self.builtin("string")?
        };

        let use_ = match attribute.use_ {
            AttributeUseType::Prohibited => AttributeUse::Prohibited,
            AttributeUseType::Optional => AttributeUse::Optional,
            AttributeUseType::Required => AttributeUse::Required,
        };

        Ok(AttributeNode {
            name: name.clone(),
            type_id,
            use_,
        })
    }
}

fn check_element(element: &ElementType, name: &str) -> Result<(), XMLSamplerError> {
    if element.substitution_group.is_some() {
        return Err(unsupported(&format!("substitution group of element '{}'", name)));
    }

    if element.abstract_ {
        return Err(unsupported(&format!("abstract element '{}'", name)));
    }

    Ok(())
}

/// Build the content model of every schema in `schemas`.
pub(crate) fn fetch_types(schemas: &Schemas) -> Result<SchemaModel, XMLSamplerError> {
    let mut builder = ModelBuilder::new();
    for (_schema_id, schema) in schemas.schemas() {
        for content in &schema.schema.content {
            builder.collect(content)?;
        }
    }

    builder.build()
}
