use crate::config::GeneratorConfig;
use crate::element_generator::generate_element;
use crate::error::XMLSamplerError;
use crate::randomization::Randomizer;
use crate::schema::{ElementNode, SchemaModel, SimpleType, TypeId};
use crate::substitution::Substitutor;
use crate::tree::XmlNode;
use crate::value_generator::ValueGenerator;
use std::collections::HashMap;
use std::rc::Rc;

/// Generates XML documents from a content model.
///
/// Owns the random stream and the expression scopes, so one generator is
/// meant to be reused across every schema file of a run. Call
/// [`XmlGenerator::reset_context`] before each file.
#[derive(Debug)]
pub struct XmlGenerator {
    randomizer: Randomizer,
    substitutor: Substitutor,
}

impl XmlGenerator {
    /// New generator. Without a seed one is drawn from the OS.
    pub fn new(seed: Option<u64>) -> XmlGenerator {
        XmlGenerator {
            randomizer: Randomizer::new(seed),
            substitutor: Substitutor::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.randomizer.seed()
    }

    /// Start a new schema file.
    ///
    /// Clears the local expression scope, then records the file name, the
    /// root element and the resolved output file name.
    pub fn reset_context(
        &mut self,
        source_filename: &str,
        root_element: &str,
        config: &GeneratorConfig,
    ) -> Result<(), XMLSamplerError> {
        self.substitutor
            .reset_context(source_filename, root_element, config, &mut self.randomizer)?;

        Ok(())
    }

    pub fn output_filename(&self) -> Option<&str> {
        self.substitutor.output_filename()
    }

    /// Generate one document rooted at `root`.
    pub fn generate(
        &mut self,
        model: &SchemaModel,
        root: &ElementNode,
        config: &GeneratorConfig,
    ) -> Result<XmlNode, XMLSamplerError> {
        let mut context = GenerationContext::new(
            model,
            config,
            &mut self.randomizer,
            &mut self.substitutor,
        );

        generate_element(&mut context, root)
    }

    /// Value for a single node named `name`, `None` for complex types.
    pub fn generate_value(
        &mut self,
        name: &str,
        simple: Option<&SimpleType>,
        config: &GeneratorConfig,
    ) -> Result<Option<String>, XMLSamplerError> {
        ValueGenerator {
            randomizer: &mut self.randomizer,
            substitutor: &mut self.substitutor,
            config,
        }
        .generate(name, simple)
    }

    pub fn process_expression(&mut self, expression: &str) -> Result<String, XMLSamplerError> {
        let value = self
            .substitutor
            .process_expression(expression, &mut self.randomizer)?;

        Ok(value)
    }
}

/// State shared by one document generation.
pub(crate) struct GenerationContext<'a> {
    pub(crate) model: &'a SchemaModel,
    pub(crate) config: &'a GeneratorConfig,
    pub(crate) randomizer: &'a mut Randomizer,
    substitutor: &'a mut Substitutor,
    simple_types: HashMap<TypeId, Option<Rc<SimpleType>>>,
    pub(crate) depth: usize,
}

impl<'a> GenerationContext<'a> {
    pub(crate) fn new(
        model: &'a SchemaModel,
        config: &'a GeneratorConfig,
        randomizer: &'a mut Randomizer,
        substitutor: &'a mut Substitutor,
    ) -> GenerationContext<'a> {
        GenerationContext {
            model,
            config,
            randomizer,
            substitutor,
            simple_types: HashMap::new(),
            depth: 0,
        }
    }

    /// Flattened simple type of `id`, memoized for the document.
    ///
    /// `node` is the element or attribute being generated.
    pub(crate) fn resolve(
        &mut self,
        id: TypeId,
        node: &str,
    ) -> Result<Option<Rc<SimpleType>>, XMLSamplerError> {
        if let Some(resolved) = self.simple_types.get(&id) {
            return Ok(resolved.clone());
        }

        let resolved = self.model.resolve_simple(id, node)?.map(Rc::new);
        self.simple_types.insert(id, resolved.clone());

        Ok(resolved)
    }

    /// Number of repetitions for a particle.
    ///
    /// An unbounded maximum is replaced by the configured cap, or by
    /// `min_occurs` when that is larger.
    pub(crate) fn occurrences(&mut self, min_occurs: usize, max_occurs: Option<usize>) -> usize {
        let max_occurs = max_occurs
            .unwrap_or(self.config.randomization.max_occurs_cap)
            .max(min_occurs);
        if min_occurs == 1 && max_occurs == 1 {
            return 1;
        }

        self.randomizer.count(min_occurs, max_occurs)
    }

    pub(crate) fn value(
        &mut self,
        name: &str,
        simple: Option<&SimpleType>,
    ) -> Result<Option<String>, XMLSamplerError> {
        ValueGenerator {
            randomizer: &mut *self.randomizer,
            substitutor: &mut *self.substitutor,
            config: self.config,
        }
        .generate(name, simple)
    }
}
