use crate::error::XMLSamplerError;
use crate::fetch_types::fetch_types;
use crate::schema::SchemaModel;
use std::fs;
use std::path::Path;
use xsd_parser::pipeline::parser::resolver::FileResolver;
use xsd_parser::{Parser, Schemas};

fn parse_schemas(xsd: &str) -> Result<Schemas, XMLSamplerError> {
    let parser = Parser::new()
        .with_resolver(FileResolver::new())
        .with_default_namespaces()
        .add_schema_from_str(xsd)
        .map_err(|err| XMLSamplerError::XSDParserError(err.to_string()))?;

    Ok(parser.finish())
}

/// Parse XSD text into a content model.
pub fn generate_schema(xsd: &str) -> Result<SchemaModel, XMLSamplerError> {
    let schemas = parse_schemas(xsd)?;

    fetch_types(&schemas)
}

pub fn generate_schema_from_file<P: AsRef<Path>>(path: P) -> Result<SchemaModel, XMLSamplerError> {
    let path = path.as_ref();
    let xsd = fs::read_to_string(path).map_err(|err| {
        XMLSamplerError::XSDParserError(format!("Could not read file {}: {}", path.display(), err))
    })?;

    generate_schema(&xsd)
}
