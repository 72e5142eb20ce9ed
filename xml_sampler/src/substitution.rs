use crate::config::{GeneratorConfig, ValueOverride};
use crate::expression::{ExpressionSyntaxError, Placeholder, Scope, parse_placeholders};
use crate::identifiers;
use crate::locale::{Locale, LocaleData, fake_data};
use crate::randomization::Randomizer;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::fs;

/// Error type for evaluating placeholder expressions.
#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    /// Malformed placeholder
    #[error(transparent)]
    Syntax(#[from] ExpressionSyntaxError),

    #[error("Unknown function {0}")]
    UnknownFunction(String),

    #[error("Invalid arguments for function '{function}': {arguments}")]
    InvalidArguments { function: String, arguments: String },

    #[error("Unsupported locale '{0}'")]
    UnsupportedLocale(String),

    #[error("Failed to read '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The source file name pattern has no `extracted` match for the file
    #[error("Source file name '{file_name}' does not match pattern '{pattern}'")]
    SourceFilenameMismatch { file_name: String, pattern: String },

    #[error("'{0}' is not available in the current context")]
    ContextUnavailable(&'static str),
}

/// Values describing the schema file currently being processed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileContext {
    pub source_filename: String,
    pub root_element: String,
    pub source_extracted: String,
    pub output_filename: Option<String>,
}

/// Evaluates placeholder expressions and memoizes scoped results.
///
/// Local values live until the next [`Substitutor::reset_context`], global
/// values for the lifetime of the substitutor.
#[derive(Debug, Default)]
pub struct Substitutor {
    local_cache: HashMap<String, String>,
    global_cache: HashMap<String, String>,
    context: Option<FileContext>,
}

impl Substitutor {
    pub fn new() -> Substitutor {
        Substitutor::default()
    }

    pub fn context(&self) -> Option<&FileContext> {
        self.context.as_ref()
    }

    pub fn output_filename(&self) -> Option<&str> {
        self.context.as_ref()?.output_filename.as_deref()
    }

    /// Start a new schema file: drop local values and rebuild the file context.
    pub fn reset_context(
        &mut self,
        source_filename: &str,
        root_element: &str,
        config: &GeneratorConfig,
        randomizer: &mut Randomizer,
    ) -> Result<(), SubstitutionError> {
        self.local_cache.clear();
        self.context = None;

        let pattern = &config.source_filename;
        let matcher = Regex::new(pattern).map_err(|source| SubstitutionError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        let source_extracted = matcher
            .captures(source_filename)
            .and_then(|captures| captures.name("extracted"))
            .map(|extracted| extracted.as_str().to_string())
            .ok_or_else(|| SubstitutionError::SourceFilenameMismatch {
                file_name: source_filename.to_string(),
                pattern: pattern.clone(),
            })?;

        self.context = Some(FileContext {
            source_filename: source_filename.to_string(),
            root_element: root_element.to_string(),
            source_extracted,
            output_filename: None,
        });

        let output_filename = self.process_expression(&config.output_filename, randomizer)?;
        if let Some(context) = self.context.as_mut() {
            context.output_filename = Some(output_filename);
            tracing::debug!(
                root_element = %context.root_element,
                source_filename = %context.source_filename,
                source_extracted = %context.source_extracted,
                output_filename = ?context.output_filename,
                "reset local context"
            );
        }

        Ok(())
    }

    /// Resolve the first override rule matching `name`.
    ///
    /// Returns `None` when no rule matches or the matching rule has no template.
    pub fn substitute_value(
        &mut self,
        name: &str,
        overrides: &[ValueOverride],
        randomizer: &mut Randomizer,
    ) -> Result<Option<String>, SubstitutionError> {
        let Some(rule) = overrides.iter().find(|rule| rule.pattern.is_match(name)) else {
            return Ok(None);
        };

        match rule.template.as_deref() {
            Some(template) if !template.is_empty() => {
                Ok(Some(self.process_expression(template, randomizer)?))
            }
            _ => Ok(None),
        }
    }

    /// Replace every placeholder of `expression` with its value.
    pub fn process_expression(
        &mut self,
        expression: &str,
        randomizer: &mut Randomizer,
    ) -> Result<String, SubstitutionError> {
        tracing::debug!("processing expression: {}", expression);
        let placeholders = parse_placeholders(expression)?;

        let mut resolved = Vec::with_capacity(placeholders.len());
        for placeholder in &placeholders {
            let value = self.resolve(placeholder, randomizer)?;
            resolved.push((placeholder.start, placeholder.end, value));
        }

        let mut result = expression.to_string();
        for (start, end, value) in resolved.into_iter().rev() {
            result.replace_range(start..end, &value);
        }

        tracing::debug!("expression resolved to value: {}", result);
        Ok(result)
    }

    fn resolve(
        &mut self,
        placeholder: &Placeholder,
        randomizer: &mut Randomizer,
    ) -> Result<String, SubstitutionError> {
        let function = placeholder.function.as_str();
        let argument = placeholder.argument.as_deref();

        let cached = match placeholder.modifier {
            None => None,
            Some(Scope::Local) => self.local_cache.get(function),
            Some(Scope::Global) => self.global_cache.get(function),
        };
        if let Some(value) = cached {
            return Ok(value.clone());
        }

        let value = self.call(function, argument, randomizer)?;
        match placeholder.modifier {
            None => {}
            Some(Scope::Local) => {
                self.local_cache.insert(function.to_string(), value.clone());
            }
            Some(Scope::Global) => {
                self.global_cache.insert(function.to_string(), value.clone());
            }
        }

        Ok(value)
    }

    fn call(
        &self,
        function: &str,
        argument: Option<&str>,
        randomizer: &mut Randomizer,
    ) -> Result<String, SubstitutionError> {
        if let Some(data) = LocaleData::from_function_name(function) {
            let locale = parse_locale(argument)?;
            return Ok(fake_data(randomizer, data, locale));
        }

        let value = match function {
            "root_element" => self.file_context("root_element")?.root_element.clone(),
            "source_filename" => self.file_context("source_filename")?.source_filename.clone(),
            "source_extracted" => self.file_context("source_extracted")?.source_extracted.clone(),
            "output_filename" => self
                .file_context("output_filename")?
                .output_filename
                .clone()
                .ok_or(SubstitutionError::ContextUnavailable("output_filename"))?,
            "any" => {
                let options = split_arguments(argument.unwrap_or_default());
                randomizer
                    .choose(&options)
                    .cloned()
                    .ok_or_else(|| invalid_arguments(function, argument))?
            }
            "any_from" => any_from(argument, randomizer)?,
            "regex" => {
                let pattern = unquote(argument.unwrap_or_default());
                randomizer
                    .regex(pattern)
                    .map_err(|_| invalid_arguments(function, argument))?
            }
            "uuid" => randomizer.uuid(),
            "number" => {
                let bounds = split_arguments(argument.unwrap_or_default());
                let [min, max] = bounds.as_slice() else {
                    return Err(invalid_arguments(function, argument));
                };
                let (Ok(min), Ok(max)) = (min.parse::<i64>(), max.parse::<i64>()) else {
                    return Err(invalid_arguments(function, argument));
                };
                randomizer.integer(min, max).to_string()
            }
            "date" => {
                let bounds = split_arguments(argument.unwrap_or_default());
                let [from, until] = bounds.as_slice() else {
                    return Err(invalid_arguments(function, argument));
                };
                let (Ok(from), Ok(until)) = (
                    NaiveDate::parse_from_str(from, "%Y-%m-%d"),
                    NaiveDate::parse_from_str(until, "%Y-%m-%d"),
                ) else {
                    return Err(invalid_arguments(function, argument));
                };
                randomizer.random_date(from, until).format("%Y%m%d").to_string()
            }
            "inn_fl" => identifiers::inn_fl(randomizer),
            "inn_ul" => identifiers::inn_ul(randomizer),
            "ogrn_ip" => identifiers::ogrn_ip(randomizer),
            "ogrn_fl" => identifiers::ogrn_fl(randomizer),
            "kpp" => identifiers::kpp(randomizer),
            "snils_formatted" => identifiers::snils_formatted(randomizer),
            _ => return Err(SubstitutionError::UnknownFunction(function.to_string())),
        };

        Ok(value)
    }

    fn file_context(&self, name: &'static str) -> Result<&FileContext, SubstitutionError> {
        self.context
            .as_ref()
            .ok_or(SubstitutionError::ContextUnavailable(name))
    }
}

fn invalid_arguments(function: &str, argument: Option<&str>) -> SubstitutionError {
    SubstitutionError::InvalidArguments {
        function: function.to_string(),
        arguments: argument.unwrap_or_default().to_string(),
    }
}

fn parse_locale(argument: Option<&str>) -> Result<Locale, SubstitutionError> {
    let tag = unquote(argument.unwrap_or_default());
    if tag.is_empty() {
        return Ok(Locale::default());
    }

    Locale::from_tag(tag).ok_or_else(|| SubstitutionError::UnsupportedLocale(tag.to_string()))
}

fn any_from(argument: Option<&str>, randomizer: &mut Randomizer) -> Result<String, SubstitutionError> {
    let path = unquote(argument.unwrap_or_default());
    let content = fs::read_to_string(path).map_err(|source| SubstitutionError::IoError {
        path: path.to_string(),
        source,
    })?;

    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    randomizer
        .choose(&lines)
        .map(|line| line.to_string())
        .ok_or_else(|| invalid_arguments("any_from", argument))
}

/// Strip surrounding whitespace and one pair of matching quotes.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|value| value.strip_suffix(quote))
        {
            return inner;
        }
    }

    value
}

/// Split a comma separated argument list, ignoring commas inside quotes.
fn split_arguments(arguments: &str) -> Vec<String> {
    if arguments.trim().is_empty() {
        return vec![];
    }

    let mut parts = vec![];
    let mut quote = None;
    let mut current = String::new();
    for ch in arguments.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (Some(open), _) if ch == open => {
                quote = None;
                current.push(ch);
            }
            (None, ',') => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    parts.push(current);

    parts
        .iter()
        .map(|part| unquote(part).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::SyntaxErrorKind;

    fn setup() -> (Substitutor, Randomizer) {
        (Substitutor::new(), Randomizer::new(Some(7)))
    }

    fn reset(substitutor: &mut Substitutor, randomizer: &mut Randomizer, file_name: &str) {
        substitutor
            .reset_context(file_name, "Root", &GeneratorConfig::default(), randomizer)
            .unwrap();
    }

    #[test]
    fn test_literal_passes_through() {
        let (mut substitutor, mut randomizer) = setup();
        let value = substitutor
            .process_expression("plain value", &mut randomizer)
            .unwrap();
        assert_eq!(value, "plain value");
    }

    #[test]
    fn test_text_around_placeholders_is_kept() {
        let (mut substitutor, mut randomizer) = setup();
        reset(&mut substitutor, &mut randomizer, "orders.xsd");

        let value = substitutor
            .process_expression("id-{{ root_element }}/{{ source_extracted }}.xml", &mut randomizer)
            .unwrap();
        assert_eq!(value, "id-Root/orders.xml");
    }

    #[test]
    fn test_reset_context_resolves_output_filename() {
        let (mut substitutor, mut randomizer) = setup();
        reset(&mut substitutor, &mut randomizer, "orders.xsd");

        let context = substitutor.context().unwrap();
        assert_eq!(context.source_filename, "orders.xsd");
        assert_eq!(context.source_extracted, "orders");

        let output = substitutor.output_filename().unwrap().to_string();
        let matcher =
            Regex::new("^orders_[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
                .unwrap();
        assert!(matcher.is_match(&output), "{}", output);

        let value = substitutor
            .process_expression("{{ output_filename }}.xml", &mut randomizer)
            .unwrap();
        assert_eq!(value, format!("{}.xml", output));
    }

    #[test]
    fn test_source_filename_mismatch() {
        let (mut substitutor, mut randomizer) = setup();
        let result =
            substitutor.reset_context("orders.xml", "Root", &GeneratorConfig::default(), &mut randomizer);
        assert!(matches!(
            result,
            Err(SubstitutionError::SourceFilenameMismatch { .. })
        ));
    }

    #[test]
    fn test_failed_reset_drops_previous_context() {
        let (mut substitutor, mut randomizer) = setup();
        reset(&mut substitutor, &mut randomizer, "first.xsd");

        let result =
            substitutor.reset_context("second.xml", "Other", &GeneratorConfig::default(), &mut randomizer);
        assert!(result.is_err());
        assert!(substitutor.context().is_none());

        let result = substitutor.process_expression("{{ source_filename }}", &mut randomizer);
        assert!(matches!(
            result,
            Err(SubstitutionError::ContextUnavailable("source_filename"))
        ));
    }

    #[test]
    fn test_context_unavailable_before_reset() {
        let (mut substitutor, mut randomizer) = setup();
        let result = substitutor.process_expression("{{ root_element }}", &mut randomizer);
        assert!(matches!(
            result,
            Err(SubstitutionError::ContextUnavailable("root_element"))
        ));
    }

    #[test]
    fn test_local_scope_is_cached_until_reset() {
        let (mut substitutor, mut randomizer) = setup();
        reset(&mut substitutor, &mut randomizer, "first.xsd");

        let expression = "{{ uuid | local }}";
        let first = substitutor.process_expression(expression, &mut randomizer).unwrap();
        let second = substitutor.process_expression(expression, &mut randomizer).unwrap();
        assert_eq!(first, second);

        reset(&mut substitutor, &mut randomizer, "second.xsd");
        let third = substitutor.process_expression(expression, &mut randomizer).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_global_scope_survives_reset() {
        let (mut substitutor, mut randomizer) = setup();
        reset(&mut substitutor, &mut randomizer, "first.xsd");

        let expression = "{{ uuid | global }}";
        let first = substitutor.process_expression(expression, &mut randomizer).unwrap();

        reset(&mut substitutor, &mut randomizer, "second.xsd");
        let second = substitutor.process_expression(expression, &mut randomizer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_is_keyed_by_function_name() {
        let (mut substitutor, mut randomizer) = setup();
        let first = substitutor
            .process_expression("{{ number(1, 1000000) | global }}", &mut randomizer)
            .unwrap();
        let second = substitutor
            .process_expression("{{ number(5, 6) | global }}", &mut randomizer)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unscoped_placeholders_are_fresh() {
        let (mut substitutor, mut randomizer) = setup();
        let value = substitutor
            .process_expression("{{ uuid }} {{ uuid }}", &mut randomizer)
            .unwrap();
        let (first, second) = value.split_once(' ').unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_any_and_number() {
        let (mut substitutor, mut randomizer) = setup();
        for _ in 0..50 {
            let value = substitutor
                .process_expression("{{ any('a,b', \"c\", d) }}", &mut randomizer)
                .unwrap();
            assert!(["a,b", "c", "d"].contains(&value.as_str()), "{}", value);

            let value = substitutor
                .process_expression("{{ number(10, 20) }}", &mut randomizer)
                .unwrap();
            let number: i64 = value.parse().unwrap();
            assert!((10..=20).contains(&number));
        }
    }

    #[test]
    fn test_date_format() {
        let (mut substitutor, mut randomizer) = setup();
        let value = substitutor
            .process_expression("{{ date('2020-02-01', '2020-02-29') }}", &mut randomizer)
            .unwrap();
        assert_eq!(value.len(), 8);
        assert!(value.starts_with("202002"));
    }

    #[test]
    fn test_regex_function() {
        let (mut substitutor, mut randomizer) = setup();
        let value = substitutor
            .process_expression(r#"{{ regex("([0-9]{7,10}|abc)") }}"#, &mut randomizer)
            .unwrap();
        let matcher = Regex::new("^([0-9]{7,10}|abc)$").unwrap();
        assert!(matcher.is_match(&value), "{}", value);
    }

    #[test]
    fn test_locale_functions() {
        let (mut substitutor, mut randomizer) = setup();
        let value = substitutor
            .process_expression("{{ last_name('fr_FR') }}", &mut randomizer)
            .unwrap();
        assert!(!value.is_empty());

        let result = substitutor.process_expression("{{ email('ru_RU') }}", &mut randomizer);
        assert!(matches!(
            result,
            Err(SubstitutionError::UnsupportedLocale(locale)) if locale == "ru_RU"
        ));
    }

    #[test]
    fn test_errors() {
        let (mut substitutor, mut randomizer) = setup();

        let result = substitutor.process_expression("{{ missing_function }}", &mut randomizer);
        assert!(matches!(result, Err(SubstitutionError::UnknownFunction(name)) if name == "missing_function"));

        let result = substitutor.process_expression("{{ number(a, 2) }}", &mut randomizer);
        assert!(matches!(result, Err(SubstitutionError::InvalidArguments { .. })));

        let result = substitutor.process_expression("{{ any_from('no/such/file.txt') }}", &mut randomizer);
        assert!(matches!(result, Err(SubstitutionError::IoError { .. })));

        let result = substitutor.process_expression("{{ }}", &mut randomizer);
        match result {
            Err(SubstitutionError::Syntax(error)) => {
                assert_eq!(error.kind, SyntaxErrorKind::EmptyPlaceholder)
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_substitute_value_first_match_wins() {
        let (mut substitutor, mut randomizer) = setup();
        let config = GeneratorConfig::default()
            .with_override("code", None)
            .unwrap()
            .with_override("^Name$", Some("fixed"))
            .unwrap()
            .with_override("name", Some("{{ number(1, 2) }}"))
            .unwrap();

        let value = substitutor
            .substitute_value("NAME", &config.value_override, &mut randomizer)
            .unwrap();
        assert_eq!(value.as_deref(), Some("fixed"));

        let value = substitutor
            .substitute_value("LastName", &config.value_override, &mut randomizer)
            .unwrap();
        assert!(matches!(value.as_deref(), Some("1") | Some("2")));

        let value = substitutor
            .substitute_value("CodeName", &config.value_override, &mut randomizer)
            .unwrap();
        assert_eq!(value, None);

        let value = substitutor
            .substitute_value("other", &config.value_override, &mut randomizer)
            .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(split_arguments(" 'a,b' , c ,\"d\" "), vec!["a,b", "c", "d"]);
        assert!(split_arguments("  ").is_empty());
        assert_eq!(unquote(" 'x' "), "x");
        assert_eq!(unquote("'x\""), "'x\"");
    }
}
