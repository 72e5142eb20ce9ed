use crate::builtin::BuiltinKind;
use crate::config::GeneratorConfig;
use crate::constraints::{digit_bounds, merge_constraints};
use crate::date_generator;
use crate::error::XMLSamplerError;
use crate::facets::FacetSet;
use crate::randomization::Randomizer;
use crate::schema::SimpleType;
use crate::substitution::Substitutor;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Range used for numbers when no facet or setting bounds them
const DEFAULT_NUMBER_RANGE: (i64, i64) = (0, 100_000);
const DEFAULT_DECIMAL_SCALE: u32 = 2;
const MAX_SCALE: u32 = 18;
const DEFAULT_BINARY_LENGTH: usize = 16;
const URI_TLDS: [&str; 5] = ["com", "org", "net", "io", "ru"];

/// Produces the text of one simple-typed element or attribute.
pub(crate) struct ValueGenerator<'a> {
    pub(crate) randomizer: &'a mut Randomizer,
    pub(crate) substitutor: &'a mut Substitutor,
    pub(crate) config: &'a GeneratorConfig,
}

impl ValueGenerator<'_> {
    /// Value for the node `name`; `None` for complex types.
    pub(crate) fn generate(
        &mut self,
        name: &str,
        simple: Option<&SimpleType>,
    ) -> Result<Option<String>, XMLSamplerError> {
        let Some(simple) = simple else {
            return Ok(None);
        };

        let overridden =
            self.substitutor
                .substitute_value(name, &self.config.value_override, self.randomizer)?;
        if overridden.is_some() {
            return Ok(overridden);
        }

        if let Some(value) = self.randomizer.choose(&simple.facets.enumeration) {
            return Ok(Some(value.clone()));
        }

        if !simple.facets.patterns.is_empty() {
            return self.generate_from_pattern(name, &simple.facets).map(Some);
        }

        self.generate_builtin(name, simple).map(Some)
    }

    fn generate_builtin(&mut self, name: &str, simple: &SimpleType) -> Result<String, XMLSamplerError> {
        let facets = &simple.facets;
        let value = match simple.kind {
            BuiltinKind::String => {
                let (min_length, max_length) = facets.length_range();
                self.randomizer.ascii_string(min_length, max_length)
            }
            BuiltinKind::Boolean => {
                let value = if self.randomizer.boolean() { "true" } else { "false" };
                value.to_string()
            }
            BuiltinKind::Integer => self.generate_number(facets, 0, true),
            BuiltinKind::Decimal => {
                let scale = facets.fraction_digits.unwrap_or(DEFAULT_DECIMAL_SCALE);
                let scale = facets.total_digits.map_or(scale, |total| scale.min(total));
                self.generate_number(facets, scale, true)
            }
            BuiltinKind::Float | BuiltinKind::Double => {
                self.generate_number(facets, DEFAULT_DECIMAL_SCALE, false)
            }
            BuiltinKind::Duration => self.generate_duration(),
            BuiltinKind::DateTime
            | BuiltinKind::Time
            | BuiltinKind::Date
            | BuiltinKind::GYearMonth
            | BuiltinKind::GYear
            | BuiltinKind::GMonthDay
            | BuiltinKind::GDay
            | BuiltinKind::GMonth => date_generator::generate(simple.kind, facets, self.randomizer)
                .ok_or_else(|| {
                    XMLSamplerError::DataTypesFormatError(format!(
                        "Cannot generate '{}' value for '{}'",
                        simple.kind, name
                    ))
                })?,
            BuiltinKind::HexBinary => {
                let bytes = self.random_bytes(facets);
                bytes.iter().map(|byte| format!("{:02X}", byte)).collect()
            }
            BuiltinKind::Base64Binary => STANDARD.encode(self.random_bytes(facets)),
            BuiltinKind::AnyUri => self.generate_uri(),
            BuiltinKind::QName | BuiltinKind::Notation => {
                let (min_length, max_length) = facets.length_range();
                self.randomizer.ascii_string(min_length, max_length)
            }
            BuiltinKind::AnyType
            | BuiltinKind::AnySimpleType
            | BuiltinKind::Entity
            | BuiltinKind::Entities
            | BuiltinKind::Idrefs
            | BuiltinKind::NmTokens => {
                return Err(XMLSamplerError::UnsupportedType {
                    kind: simple.kind,
                    name: name.to_string(),
                });
            }
        };

        Ok(value)
    }

    fn generate_from_pattern(&mut self, name: &str, facets: &FacetSet) -> Result<String, XMLSamplerError> {
        let pattern = self
            .randomizer
            .choose(&facets.patterns)
            .cloned()
            .unwrap_or_default();
        let value = self
            .randomizer
            .regex(&xsd_pattern_to_regex(&pattern))
            .map_err(|err| {
                XMLSamplerError::DataTypesFormatError(format!(
                    "Invalid pattern '{}' for '{}': {}",
                    pattern, name, err
                ))
            })?;
        let value = collapse_whitespace(&value);

        let length = value.chars().count();
        let (min_length, max_length) = facets.length_range();
        if let Some(max_length) = max_length.filter(|max| length > *max) {
            tracing::warn!(
                "Possible mistake in schema: {} generated value '{}' can't be longer than {}",
                name,
                value,
                max_length
            );
        }
        if let Some(min_length) = min_length.filter(|min| length < *min) {
            tracing::warn!(
                "Possible mistake in schema: {} generated value '{}' can't be shorter than {}",
                name,
                value,
                min_length
            );
        }

        Ok(value)
    }

    /// Draw a number as an integer scaled by `10^scale` and format it.
    ///
    /// `total_digits` only constrains the value when `use_digits` is set.
    fn generate_number(&mut self, facets: &FacetSet, scale: u32, use_digits: bool) -> String {
        let scale = scale.min(MAX_SCALE);
        let factor = 10_i64.pow(scale);

        let (digit_min, digit_max) = match facets.total_digits.filter(|_| use_digits) {
            Some(digits) => {
                let (min, max) = digit_bounds(digits);
                (Some(min), Some(max))
            }
            None => (None, None),
        };
        let schema_min = facets
            .lower_bound()
            .and_then(|(value, exclusive)| scaled_bound(value, scale, exclusive, true));
        let schema_max = facets
            .upper_bound()
            .and_then(|(value, exclusive)| scaled_bound(value, scale, exclusive, false));
        let randomization = &self.config.randomization;
        let config_min = randomization.min_inclusive.map(|value| value.saturating_mul(factor));
        let config_max = randomization.max_inclusive.map(|value| value.saturating_mul(factor));

        let (min, max) = merge_constraints(
            digit_min, digit_max, schema_min, schema_max, config_min, config_max,
        );

        let default_min = DEFAULT_NUMBER_RANGE.0.saturating_mul(factor);
        let default_max = DEFAULT_NUMBER_RANGE.1.saturating_mul(factor);
        let span = default_max.saturating_sub(default_min);
        let (min, max) = match (min, max) {
            (Some(min), Some(max)) => (min, max),
            (Some(min), None) => (min, min.saturating_add(span)),
            (None, Some(max)) => (max.saturating_sub(span), max),
            (None, None) => (default_min, default_max),
        };

        format_scaled(self.randomizer.integer(min, max), scale)
    }

    fn generate_duration(&mut self) -> String {
        let randomizer = &mut *self.randomizer;
        format!(
            "P{}Y{}M{}DT{}H{}M{}S",
            randomizer.integer(0, 10),
            randomizer.integer(0, 11),
            randomizer.integer(0, 30),
            randomizer.integer(0, 23),
            randomizer.integer(0, 59),
            randomizer.integer(0, 59)
        )
    }

    fn random_bytes(&mut self, facets: &FacetSet) -> Vec<u8> {
        let (min_length, max_length) = facets.length_range();
        let min_length = min_length.unwrap_or(1);
        let max_length = max_length
            .filter(|max| *max >= min_length)
            .unwrap_or(min_length.max(DEFAULT_BINARY_LENGTH));

        let length = self.randomizer.count(min_length, max_length);
        self.randomizer.bytes(length)
    }

    fn generate_uri(&mut self) -> String {
        let host = self.randomizer.ascii_string(Some(3), Some(12)).to_ascii_lowercase();
        let tld = self.randomizer.choose(&URI_TLDS).copied().unwrap_or("com");
        let path = self.randomizer.ascii_string(Some(1), Some(12)).to_ascii_lowercase();

        format!("https://{}.{}/{}", host, tld, path)
    }
}

/// Convert a lexical bound into the scaled integer domain.
///
/// Lower bounds round up and upper bounds round down; an exclusive bound
/// that is exactly representable moves one unit inwards.
pub(crate) fn scaled_bound(value: &str, scale: u32, exclusive: bool, lower: bool) -> Option<i64> {
    let (truncated, exact, negative) = parse_scaled(value.trim(), scale)?;

    let rounded = match (exact, lower, negative) {
        (true, _, _) => truncated,
        (false, true, false) => truncated.saturating_add(1),
        (false, true, true) => truncated,
        (false, false, false) => truncated,
        (false, false, true) => truncated.saturating_sub(1),
    };
    let bound = match (exact && exclusive, lower) {
        (true, true) => rounded.saturating_add(1),
        (true, false) => rounded.saturating_sub(1),
        (false, _) => rounded,
    };

    Some(bound.clamp(i64::MIN.into(), i64::MAX.into()) as i64)
}

/// Parse a decimal literal into `(value * 10^scale truncated, exact, negative)`.
fn parse_scaled(value: &str, scale: u32) -> Option<(i128, bool, bool)> {
    if value.contains(['e', 'E']) {
        let number: f64 = value.parse().ok()?;
        if !number.is_finite() {
            return None;
        }
        let scaled = number * 10_f64.powi(scale as i32);
        let truncated = scaled.trunc();
        return Some((truncated as i128, truncated == scaled, number < 0.0));
    }

    let (negative, digits) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if !integer.chars().chain(fraction.chars()).all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let kept = fraction.len().min(scale as usize);
    let exact = fraction[kept..].chars().all(|ch| ch == '0');

    let mut magnitude: i128 = 0;
    let significant = integer.chars().chain(fraction[..kept].chars());
    let padding = std::iter::repeat_n('0', scale as usize - kept);
    for ch in significant.chain(padding) {
        let digit = ch.to_digit(10)?;
        magnitude = magnitude.checked_mul(10)?.checked_add(digit.into())?;
    }

    let truncated = if negative { -magnitude } else { magnitude };
    Some((truncated, exact, negative && !(exact && magnitude == 0)))
}

/// Format a scaled integer with exactly `scale` fraction digits.
pub(crate) fn format_scaled(value: i64, scale: u32) -> String {
    if scale == 0 {
        return value.to_string();
    }

    let factor = 10_u128.pow(scale);
    let magnitude = i128::from(value).unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };

    format!(
        "{}{}.{:0width$}",
        sign,
        magnitude / factor,
        magnitude % factor,
        width = scale as usize
    )
}

/// Rewrite XSD-only escapes into their ASCII equivalents.
pub(crate) fn xsd_pattern_to_regex(pattern: &str) -> String {
    let mut output = String::with_capacity(pattern.len());
    let mut class_depth = 0usize;
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    output.push('\\');
                    break;
                };
                let ranges = match escaped {
                    'd' => Some("0-9"),
                    'w' => Some("A-Za-z0-9_"),
                    'i' => Some("_:A-Za-z"),
                    'c' => Some(r"\-._:A-Za-z0-9"),
                    _ => None,
                };
                match ranges {
                    Some(ranges) if class_depth > 0 => output.push_str(ranges),
                    Some(ranges) => {
                        output.push('[');
                        output.push_str(ranges);
                        output.push(']');
                    }
                    None => {
                        output.push('\\');
                        output.push(escaped);
                    }
                }
            }
            '[' => {
                class_depth += 1;
                output.push(ch);
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                output.push(ch);
            }
            _ => output.push(ch),
        }
    }

    output
}

fn collapse_whitespace(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut in_whitespace = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                output.push(' ');
            }
            in_whitespace = true;
        } else {
            output.push(ch);
            in_whitespace = false;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RandomizationConfig;
    use regex::Regex;

    fn simple(kind: BuiltinKind, facets: FacetSet) -> SimpleType {
        SimpleType { kind, facets }
    }

    fn generate_many(
        config: &GeneratorConfig,
        simple_type: &SimpleType,
        count: usize,
    ) -> Vec<String> {
        let mut randomizer = Randomizer::new(Some(21));
        let mut substitutor = Substitutor::new();
        let mut generator = ValueGenerator {
            randomizer: &mut randomizer,
            substitutor: &mut substitutor,
            config,
        };

        (0..count)
            .map(|_| generator.generate("Value", Some(simple_type)).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_complex_type_has_no_value() {
        let config = GeneratorConfig::default();
        let mut randomizer = Randomizer::new(Some(1));
        let mut substitutor = Substitutor::new();
        let mut generator = ValueGenerator {
            randomizer: &mut randomizer,
            substitutor: &mut substitutor,
            config: &config,
        };
        assert_eq!(generator.generate("Value", None).unwrap(), None);
    }

    #[test]
    fn test_override_takes_precedence() {
        let config = GeneratorConfig::default()
            .with_override("value", Some("fixed-{{ number(1, 1) }}"))
            .unwrap();
        let facets = FacetSet {
            enumeration: vec!["a".to_string()],
            ..FacetSet::new()
        };
        let values = generate_many(&config, &simple(BuiltinKind::String, facets), 5);
        assert!(values.iter().all(|value| value == "fixed-1"));
    }

    #[test]
    fn test_enumeration() {
        let facets = FacetSet {
            enumeration: vec!["red".to_string(), "green".to_string()],
            ..FacetSet::new()
        };
        let values = generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::Integer, facets),
            50,
        );
        assert!(values.iter().all(|value| value == "red" || value == "green"));
        assert!(values.iter().any(|value| value == "red"));
        assert!(values.iter().any(|value| value == "green"));
    }

    #[test]
    fn test_pattern_sampling() {
        let facets = FacetSet {
            patterns: vec![r"[A-Z]{2}\d{3}".to_string()],
            ..FacetSet::new()
        };
        let matcher = Regex::new(r"^[A-Z]{2}\d{3}$").unwrap();
        for value in generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::String, facets),
            100,
        ) {
            assert!(matcher.is_match(&value), "{}", value);
        }
    }

    #[test]
    fn test_string_length_facets() {
        let facets = FacetSet {
            min_length: Some(3),
            max_length: Some(5),
            ..FacetSet::new()
        };
        for value in generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::String, facets),
            100,
        ) {
            assert!((3..=5).contains(&value.len()), "{}", value);
        }
    }

    #[test]
    fn test_integer_total_digits() {
        let facets = FacetSet {
            total_digits: Some(3),
            ..FacetSet::new()
        };
        for value in generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::Integer, facets),
            200,
        ) {
            let number: i64 = value.parse().unwrap();
            assert!((-999..=999).contains(&number), "{}", value);
        }
    }

    #[test]
    fn test_integer_exclusive_bounds() {
        let facets = FacetSet {
            min_exclusive: Some("0".to_string()),
            max_exclusive: Some("4".to_string()),
            ..FacetSet::new()
        };
        let values = generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::Integer, facets),
            100,
        );
        for value in &values {
            let number: i64 = value.parse().unwrap();
            assert!((1..=3).contains(&number), "{}", value);
        }
        for expected in ["1", "2", "3"] {
            assert!(values.iter().any(|value| value == expected));
        }
    }

    #[test]
    fn test_config_bounds_only_tighten() {
        let facets = FacetSet {
            min_inclusive: Some("10".to_string()),
            max_inclusive: Some("50".to_string()),
            ..FacetSet::new()
        };
        let config = GeneratorConfig::default().with_randomization(RandomizationConfig {
            min_inclusive: Some(20),
            max_inclusive: Some(40),
            ..RandomizationConfig::default()
        });
        for value in generate_many(&config, &simple(BuiltinKind::Integer, facets.clone()), 100) {
            let number: i64 = value.parse().unwrap();
            assert!((20..=40).contains(&number), "{}", value);
        }

        let config = GeneratorConfig::default().with_randomization(RandomizationConfig {
            min_inclusive: Some(60),
            ..RandomizationConfig::default()
        });
        for value in generate_many(&config, &simple(BuiltinKind::Integer, facets), 100) {
            let number: i64 = value.parse().unwrap();
            assert!((10..=50).contains(&number), "{}", value);
        }
    }

    #[test]
    fn test_decimal_digits() {
        let facets = FacetSet {
            total_digits: Some(5),
            fraction_digits: Some(2),
            ..FacetSet::new()
        };
        let matcher = Regex::new(r"^-?\d{1,3}\.\d{2}$").unwrap();
        for value in generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::Decimal, facets),
            200,
        ) {
            assert!(matcher.is_match(&value), "{}", value);
        }
    }

    #[test]
    fn test_decimal_bounds() {
        let facets = FacetSet {
            min_inclusive: Some("0.5".to_string()),
            max_inclusive: Some("1.25".to_string()),
            ..FacetSet::new()
        };
        for value in generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::Decimal, facets),
            100,
        ) {
            let number: f64 = value.parse().unwrap();
            assert!((0.5..=1.25).contains(&number), "{}", value);
        }
    }

    #[test]
    fn test_float_default_range() {
        let matcher = Regex::new(r"^\d+\.\d{2}$").unwrap();
        for value in generate_many(
            &GeneratorConfig::default(),
            &simple(BuiltinKind::Double, FacetSet::new()),
            100,
        ) {
            assert!(matcher.is_match(&value), "{}", value);
            let number: f64 = value.parse().unwrap();
            assert!((0.0..=100_000.0).contains(&number));
        }
    }

    #[test]
    fn test_binary_lengths() {
        let facets = FacetSet {
            length: Some(4),
            ..FacetSet::new()
        };
        let config = GeneratorConfig::default();
        for value in generate_many(&config, &simple(BuiltinKind::HexBinary, facets.clone()), 20) {
            assert_eq!(value.len(), 8);
            assert!(value.chars().all(|ch| ch.is_ascii_hexdigit()));
        }
        for value in generate_many(&config, &simple(BuiltinKind::Base64Binary, facets), 20) {
            assert_eq!(STANDARD.decode(value).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_other_rules() {
        let config = GeneratorConfig::default();
        let value = &generate_many(&config, &simple(BuiltinKind::Duration, FacetSet::new()), 1)[0];
        assert!(Regex::new(r"^P\d+Y\d+M\d+DT\d+H\d+M\d+S$").unwrap().is_match(value));

        let value = &generate_many(&config, &simple(BuiltinKind::AnyUri, FacetSet::new()), 1)[0];
        assert!(Regex::new(r"^https://[a-z]+\.[a-z]+/[a-z]+$").unwrap().is_match(value));

        let value = &generate_many(&config, &simple(BuiltinKind::Boolean, FacetSet::new()), 1)[0];
        assert!(value == "true" || value == "false");
    }

    #[test]
    fn test_unsupported_kind() {
        let config = GeneratorConfig::default();
        let mut randomizer = Randomizer::new(Some(1));
        let mut substitutor = Substitutor::new();
        let mut generator = ValueGenerator {
            randomizer: &mut randomizer,
            substitutor: &mut substitutor,
            config: &config,
        };
        let result = generator.generate("Refs", Some(&simple(BuiltinKind::Idrefs, FacetSet::new())));
        match result {
            Err(XMLSamplerError::UnsupportedType { kind, name }) => {
                assert_eq!(kind, BuiltinKind::Idrefs);
                assert_eq!(name, "Refs");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_scaled_bound() {
        assert_eq!(scaled_bound("10", 0, false, true), Some(10));
        assert_eq!(scaled_bound("10", 0, true, true), Some(11));
        assert_eq!(scaled_bound("10", 0, true, false), Some(9));
        assert_eq!(scaled_bound("1.5", 0, false, true), Some(2));
        assert_eq!(scaled_bound("1.5", 0, true, false), Some(1));
        assert_eq!(scaled_bound("-1.5", 0, false, true), Some(-1));
        assert_eq!(scaled_bound("-1.5", 0, false, false), Some(-2));
        assert_eq!(scaled_bound("1.25", 2, false, true), Some(125));
        assert_eq!(scaled_bound("-0.5", 1, true, true), Some(-4));
        assert_eq!(scaled_bound("-0.5", 0, false, true), Some(0));
        assert_eq!(scaled_bound("-0.5", 0, false, false), Some(-1));
        assert_eq!(scaled_bound("1e2", 0, false, false), Some(100));
        assert_eq!(scaled_bound("abc", 0, false, false), None);
        assert_eq!(scaled_bound("INF", 2, false, false), None);
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled(12345, 2), "123.45");
        assert_eq!(format_scaled(-5, 2), "-0.05");
        assert_eq!(format_scaled(7, 0), "7");
        assert_eq!(format_scaled(i64::MIN, 2), "-92233720368547758.08");
    }

    #[test]
    fn test_xsd_pattern_to_regex() {
        assert_eq!(xsd_pattern_to_regex(r"\d{3}"), "[0-9]{3}");
        assert_eq!(xsd_pattern_to_regex(r"[\d-]+"), "[0-9-]+");
        assert_eq!(xsd_pattern_to_regex(r"\i\c*"), r"[_:A-Za-z][\-._:A-Za-z0-9]*");
        assert_eq!(xsd_pattern_to_regex(r"\.\s"), r"\.\s");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \t\n b"), "a b");
        assert_eq!(collapse_whitespace("ab"), "ab");
    }
}
