use crate::facets::FacetSet;
use std::fmt;

/// Primitive XSD type a simple type ultimately restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    String,
    Boolean,
    Decimal,
    Integer,
    Float,
    Double,
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
    AnyUri,
    QName,
    Notation,
    /// `xs:anyType`, the universal wildcard type
    AnyType,
    AnySimpleType,
    Entity,
    Entities,
    Idrefs,
    NmTokens,
}

impl BuiltinKind {
    /// Look up a builtin type by its local name.
    ///
    /// Derived builtins such as `positiveInteger` resolve to their primitive kind
    /// together with the facets the derivation implies.
    pub fn from_local_name(name: &str) -> Option<(BuiltinKind, FacetSet)> {
        let kind = match name {
            "string" => BuiltinKind::String,
            "boolean" => BuiltinKind::Boolean,
            "decimal" => BuiltinKind::Decimal,
            "integer" => BuiltinKind::Integer,
            "float" => BuiltinKind::Float,
            "double" => BuiltinKind::Double,
            "duration" => BuiltinKind::Duration,
            "dateTime" => BuiltinKind::DateTime,
            "time" => BuiltinKind::Time,
            "date" => BuiltinKind::Date,
            "gYearMonth" => BuiltinKind::GYearMonth,
            "gYear" => BuiltinKind::GYear,
            "gMonthDay" => BuiltinKind::GMonthDay,
            "gDay" => BuiltinKind::GDay,
            "gMonth" => BuiltinKind::GMonth,
            "hexBinary" => BuiltinKind::HexBinary,
            "base64Binary" => BuiltinKind::Base64Binary,
            "anyURI" => BuiltinKind::AnyUri,
            "QName" => BuiltinKind::QName,
            "NOTATION" => BuiltinKind::Notation,
            "anyType" => BuiltinKind::AnyType,
            "anySimpleType" | "anyAtomicType" => BuiltinKind::AnySimpleType,
            "ENTITY" => BuiltinKind::Entity,
            "ENTITIES" => BuiltinKind::Entities,
            "IDREFS" => BuiltinKind::Idrefs,
            "NMTOKENS" => BuiltinKind::NmTokens,
            _ => return derived_builtin(name),
        };

        Some((kind, FacetSet::new()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinKind::String => "string",
            BuiltinKind::Boolean => "boolean",
            BuiltinKind::Decimal => "decimal",
            BuiltinKind::Integer => "integer",
            BuiltinKind::Float => "float",
            BuiltinKind::Double => "double",
            BuiltinKind::Duration => "duration",
            BuiltinKind::DateTime => "dateTime",
            BuiltinKind::Time => "time",
            BuiltinKind::Date => "date",
            BuiltinKind::GYearMonth => "gYearMonth",
            BuiltinKind::GYear => "gYear",
            BuiltinKind::GMonthDay => "gMonthDay",
            BuiltinKind::GDay => "gDay",
            BuiltinKind::GMonth => "gMonth",
            BuiltinKind::HexBinary => "hexBinary",
            BuiltinKind::Base64Binary => "base64Binary",
            BuiltinKind::AnyUri => "anyURI",
            BuiltinKind::QName => "QName",
            BuiltinKind::Notation => "NOTATION",
            BuiltinKind::AnyType => "anyType",
            BuiltinKind::AnySimpleType => "anySimpleType",
            BuiltinKind::Entity => "ENTITY",
            BuiltinKind::Entities => "ENTITIES",
            BuiltinKind::Idrefs => "IDREFS",
            BuiltinKind::NmTokens => "NMTOKENS",
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn integer_range(min: Option<i64>, max: Option<i64>) -> FacetSet {
    FacetSet {
        min_inclusive: min.map(|value| value.to_string()),
        max_inclusive: max.map(|value| value.to_string()),
        fraction_digits: Some(0),
        ..FacetSet::new()
    }
}

fn string_pattern(pattern: &str) -> FacetSet {
    FacetSet {
        patterns: vec![pattern.to_string()],
        ..FacetSet::new()
    }
}

fn derived_builtin(name: &str) -> Option<(BuiltinKind, FacetSet)> {
    let derived = match name {
        "long" => (BuiltinKind::Integer, integer_range(Some(i64::MIN), Some(i64::MAX))),
        "int" => (
            BuiltinKind::Integer,
            integer_range(Some(i32::MIN.into()), Some(i32::MAX.into())),
        ),
        "short" => (
            BuiltinKind::Integer,
            integer_range(Some(i16::MIN.into()), Some(i16::MAX.into())),
        ),
        "byte" => (
            BuiltinKind::Integer,
            integer_range(Some(i8::MIN.into()), Some(i8::MAX.into())),
        ),
        "unsignedLong" => (BuiltinKind::Integer, integer_range(Some(0), Some(i64::MAX))),
        "unsignedInt" => (BuiltinKind::Integer, integer_range(Some(0), Some(u32::MAX.into()))),
        "unsignedShort" => (BuiltinKind::Integer, integer_range(Some(0), Some(u16::MAX.into()))),
        "unsignedByte" => (BuiltinKind::Integer, integer_range(Some(0), Some(u8::MAX.into()))),
        "nonNegativeInteger" => (BuiltinKind::Integer, integer_range(Some(0), None)),
        "positiveInteger" => (BuiltinKind::Integer, integer_range(Some(1), None)),
        "nonPositiveInteger" => (BuiltinKind::Integer, integer_range(None, Some(0))),
        "negativeInteger" => (BuiltinKind::Integer, integer_range(None, Some(-1))),
        "normalizedString" | "token" | "Name" | "NCName" | "ID" | "IDREF" | "NMTOKEN" => {
            (BuiltinKind::String, FacetSet::new())
        }
        "language" => (
            BuiltinKind::String,
            string_pattern("[a-z]{2}(-[A-Z]{2})?"),
        ),
        _ => return None,
    };

    Some(derived)
}
