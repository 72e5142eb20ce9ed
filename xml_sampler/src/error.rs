use crate::builtin::BuiltinKind;
use crate::config::ConfigError;
use crate::substitution::SubstitutionError;

/// XML sampler error
///
/// Enum which manages errors in the XMLSampler crate
#[derive(Debug, thiserror::Error)]
pub enum XMLSamplerError {
    ///  Error finding matching data type
    #[error("{0}")]
    DataTypeError(String),
    /// Error parsing the input XSD file contents
    #[error("{0}")]
    XSDParserError(String),
    /// Content model is in an invalid or unsupported format
    #[error("{0}")]
    DataTypesFormatError(String),
    /// No generation rule exists for a builtin type
    #[error("Unsupported type '{kind}' for '{name}'")]
    UnsupportedType { kind: BuiltinKind, name: String },
    /// Error parsing or evaluating a placeholder expression
    #[error(transparent)]
    SubstitutionError(#[from] SubstitutionError),
    /// Invalid generator configuration
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// Error generating the output XML structure
    #[error("{0}")]
    XMLBuilderError(String),
}
