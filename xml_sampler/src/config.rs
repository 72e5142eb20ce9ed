use regex::{Regex, RegexBuilder};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

pub const DEFAULT_INCLUSION_PROBABILITY: f64 = 0.5;
pub const DEFAULT_MAX_OCCURS_CAP: usize = 10;
pub const DEFAULT_SOURCE_FILENAME: &str = r"(?P<extracted>.*).(xsd|XSD)";
pub const DEFAULT_OUTPUT_FILENAME: &str = "{{ source_extracted }}_{{ uuid }}";

/// Error type for configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read configuration file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing YAML, including unknown properties
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A name or file pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A numeric setting is out of its valid range
    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Randomization settings as written in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomizationSpec {
    pub probability: Option<f64>,
    pub max_occurs: Option<usize>,
    pub min_inclusive: Option<i64>,
    pub max_inclusive: Option<i64>,
}

/// One configuration section, every property optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfigSpec {
    pub source_filename: Option<String>,
    pub output_filename: Option<String>,
    #[serde(default)]
    pub randomization: RandomizationSpec,
    #[serde(default, deserialize_with = "ordered_overrides")]
    pub value_override: Vec<(String, Option<String>)>,
}

/// Whole configuration file: a global section and file-specific sections
/// keyed by a pattern matched against the start of the schema file name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub global: GeneratorConfigSpec,
    #[serde(default, deserialize_with = "ordered_sections")]
    pub specific: Vec<(String, GeneratorConfigSpec)>,
}

/// Resolved randomization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizationConfig {
    /// Chance that an optional attribute is emitted
    pub inclusion_probability: f64,
    /// Occurrence ceiling used when `maxOccurs` is unbounded
    pub max_occurs_cap: usize,
    /// Operator bounds for numeric values; they only narrow schema ranges
    pub min_inclusive: Option<i64>,
    pub max_inclusive: Option<i64>,
}

impl Default for RandomizationConfig {
    fn default() -> Self {
        RandomizationConfig {
            inclusion_probability: DEFAULT_INCLUSION_PROBABILITY,
            max_occurs_cap: DEFAULT_MAX_OCCURS_CAP,
            min_inclusive: None,
            max_inclusive: None,
        }
    }
}

/// Override rule: nodes whose name matches `pattern` take their value from
/// `template`. A rule without template disables overriding for those names.
#[derive(Debug, Clone)]
pub struct ValueOverride {
    pub pattern: Regex,
    pub template: Option<String>,
}

impl PartialEq for ValueOverride {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.template == other.template
    }
}

/// Configuration in effect while generating documents for one schema file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub source_filename: String,
    pub output_filename: String,
    pub randomization: RandomizationConfig,
    pub value_override: Vec<ValueOverride>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            source_filename: DEFAULT_SOURCE_FILENAME.to_string(),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_string(),
            randomization: RandomizationConfig::default(),
            value_override: vec![],
        }
    }
}

impl GeneratorConfig {
    /// Append an override rule; rules are tried in insertion order.
    pub fn with_override(mut self, pattern: &str, template: Option<&str>) -> Result<Self, ConfigError> {
        self.value_override.push(ValueOverride {
            pattern: compile_case_insensitive(pattern)?,
            template: template.map(str::to_string),
        });
        Ok(self)
    }

    pub fn with_randomization(mut self, randomization: RandomizationConfig) -> Self {
        self.randomization = randomization;
        self
    }

    fn from_spec(spec: &GeneratorConfigSpec) -> Result<GeneratorConfig, ConfigError> {
        let defaults = RandomizationConfig::default();
        let randomization = RandomizationConfig {
            inclusion_probability: spec
                .randomization
                .probability
                .unwrap_or(defaults.inclusion_probability),
            max_occurs_cap: spec
                .randomization
                .max_occurs
                .unwrap_or(defaults.max_occurs_cap),
            min_inclusive: spec.randomization.min_inclusive,
            max_inclusive: spec.randomization.max_inclusive,
        };

        if !(0.0..=1.0).contains(&randomization.inclusion_probability) {
            return Err(ConfigError::InvalidValue {
                field: "randomization.probability",
                value: randomization.inclusion_probability.to_string(),
            });
        }

        let source_filename = spec
            .source_filename
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_FILENAME.to_string());
        compile(&source_filename)?;

        let mut config = GeneratorConfig {
            source_filename,
            output_filename: spec
                .output_filename
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILENAME.to_string()),
            randomization,
            value_override: vec![],
        };
        for (pattern, template) in &spec.value_override {
            config = config.with_override(pattern, template.as_deref())?;
        }

        Ok(config)
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Config, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_yaml_str(&content)
    }

    /// Resolve the configuration for the schema file `file_name`.
    ///
    /// The first specific section whose pattern matches the start of the name
    /// is layered over the global section; otherwise the global section is used
    /// alone.
    pub fn get_for_file(&self, file_name: &str) -> Result<GeneratorConfig, ConfigError> {
        for (pattern, specific) in &self.specific {
            let anchored = compile(&format!("^(?:{})", pattern))?;
            if anchored.is_match(file_name) {
                tracing::debug!("Using specific configuration '{}' for {}", pattern, file_name);
                return GeneratorConfig::from_spec(&self.global.merged_with(specific));
            }
        }

        GeneratorConfig::from_spec(&self.global)
    }
}

impl GeneratorConfigSpec {
    /// Layer `specific` over `self`.
    ///
    /// Specific override rules come first, followed by the global rules for
    /// patterns the specific section does not redefine.
    pub fn merged_with(&self, specific: &GeneratorConfigSpec) -> GeneratorConfigSpec {
        let mut value_override = specific.value_override.clone();
        for (pattern, template) in &self.value_override {
            if !specific.value_override.iter().any(|(other, _)| other == pattern) {
                value_override.push((pattern.clone(), template.clone()));
            }
        }

        GeneratorConfigSpec {
            source_filename: specific
                .source_filename
                .clone()
                .or_else(|| self.source_filename.clone()),
            output_filename: specific
                .output_filename
                .clone()
                .or_else(|| self.output_filename.clone()),
            randomization: RandomizationSpec {
                probability: specific.randomization.probability.or(self.randomization.probability),
                max_occurs: specific.randomization.max_occurs.or(self.randomization.max_occurs),
                min_inclusive: specific
                    .randomization
                    .min_inclusive
                    .or(self.randomization.min_inclusive),
                max_inclusive: specific
                    .randomization
                    .max_inclusive
                    .or(self.randomization.max_inclusive),
            },
            value_override,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_case_insensitive(pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn scalar_to_string<E: serde::de::Error>(value: serde_yaml::Value) -> Result<Option<String>, E> {
    match value {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(value) => Ok(Some(value)),
        serde_yaml::Value::Number(value) => Ok(Some(value.to_string())),
        serde_yaml::Value::Bool(value) => Ok(Some(value.to_string())),
        other => Err(E::custom(format!("expected a scalar value, found {:?}", other))),
    }
}

fn ordered_overrides<'de, D>(deserializer: D) -> Result<Vec<(String, Option<String>)>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(mapping) = Option::<serde_yaml::Mapping>::deserialize(deserializer)? else {
        return Ok(vec![]);
    };

    mapping
        .into_iter()
        .map(|(key, value)| -> Result<_, D::Error> {
            let key = scalar_to_string::<D::Error>(key)?
                .ok_or_else(|| D::Error::custom("override pattern must not be null"))?;
            Ok((key, scalar_to_string::<D::Error>(value)?))
        })
        .collect()
}

fn ordered_sections<'de, D>(deserializer: D) -> Result<Vec<(String, GeneratorConfigSpec)>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(mapping) = Option::<serde_yaml::Mapping>::deserialize(deserializer)? else {
        return Ok(vec![]);
    };

    mapping
        .into_iter()
        .map(|(key, value)| -> Result<_, D::Error> {
            let key = scalar_to_string::<D::Error>(key)?
                .ok_or_else(|| D::Error::custom("file pattern must not be null"))?;
            let section = if value.is_null() {
                GeneratorConfigSpec::default()
            } else {
                serde_yaml::from_value(value).map_err(D::Error::custom)?
            };
            Ok((key, section))
        })
        .collect()
}
