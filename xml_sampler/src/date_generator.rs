//! Date and time values.
//!
//! Every temporal kind is mapped onto a contiguous integer domain (days,
//! seconds, months, ...) so that bound facets can be resolved and drawn the
//! same way as numbers.

use crate::builtin::BuiltinKind;
use crate::constraints::merge_constraints;
use crate::facets::FacetSet;
use crate::randomization::Randomizer;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const FIRST_YEAR: i32 = 2000;
const LAST_YEAR: i32 = 2050;

/// Leap year used to place `--MM-DD` values on a calendar
const MONTH_DAY_YEAR: i32 = 2000;

struct TemporalRule {
    parse: fn(&str) -> Option<i64>,
    format: fn(i64) -> Option<String>,
    default_range: fn() -> Option<(i64, i64)>,
}

fn rule(kind: BuiltinKind) -> Option<TemporalRule> {
    let rule = match kind {
        BuiltinKind::Date => TemporalRule {
            parse: parse_date,
            format: format_date,
            default_range: || {
                let first = NaiveDate::from_ymd_opt(FIRST_YEAR, 1, 1)?;
                let last = NaiveDate::from_ymd_opt(LAST_YEAR, 12, 31)?;
                Some((date_ordinal(first), date_ordinal(last)))
            },
        },
        BuiltinKind::DateTime => TemporalRule {
            parse: parse_date_time,
            format: format_date_time,
            default_range: || {
                let first = NaiveDate::from_ymd_opt(FIRST_YEAR, 1, 1)?.and_hms_opt(0, 0, 0)?;
                let last = NaiveDate::from_ymd_opt(LAST_YEAR, 12, 31)?.and_hms_opt(23, 59, 59)?;
                Some((first.and_utc().timestamp(), last.and_utc().timestamp()))
            },
        },
        BuiltinKind::Time => TemporalRule {
            parse: parse_time,
            format: format_time,
            default_range: || Some((0, 86_399)),
        },
        BuiltinKind::GYearMonth => TemporalRule {
            parse: parse_year_month,
            format: format_year_month,
            default_range: || {
                Some((
                    i64::from(FIRST_YEAR) * 12,
                    i64::from(LAST_YEAR) * 12 + 11,
                ))
            },
        },
        BuiltinKind::GYear => TemporalRule {
            parse: |value| value.parse().ok(),
            format: |year| Some(format!("{:04}", year)),
            default_range: || Some((FIRST_YEAR.into(), LAST_YEAR.into())),
        },
        BuiltinKind::GMonthDay => TemporalRule {
            parse: parse_month_day,
            format: format_month_day,
            default_range: || Some((1, 366)),
        },
        BuiltinKind::GDay => TemporalRule {
            parse: |value| value.strip_prefix("---")?.parse().ok(),
            format: |day| Some(format!("---{:02}", day)),
            default_range: || Some((1, 31)),
        },
        BuiltinKind::GMonth => TemporalRule {
            parse: |value| value.strip_prefix("--")?.parse().ok(),
            format: |month| Some(format!("--{:02}", month)),
            default_range: || Some((1, 12)),
        },
        _ => return None,
    };

    Some(rule)
}

/// Generate a value of the temporal `kind` within the bound facets.
///
/// Bounds that cannot be read as the kind's lexical form are ignored.
/// Returns `None` for kinds that are not temporal.
pub(crate) fn generate(kind: BuiltinKind, facets: &FacetSet, randomizer: &mut Randomizer) -> Option<String> {
    let rule = rule(kind)?;
    let (default_min, default_max) = (rule.default_range)()?;

    let schema_min = facets.lower_bound().and_then(|(value, exclusive)| {
        let value = (rule.parse)(strip_timezone(value))?;
        if exclusive { value.checked_add(1) } else { Some(value) }
    });
    let schema_max = facets.upper_bound().and_then(|(value, exclusive)| {
        let value = (rule.parse)(strip_timezone(value))?;
        if exclusive { value.checked_sub(1) } else { Some(value) }
    });

    let (min, max) = match merge_constraints(None, None, schema_min, schema_max, None, None) {
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) => (min, default_max.max(min)),
        (None, Some(max)) => (default_min.min(max), max),
        (None, None) => (default_min, default_max),
    };

    (rule.format)(randomizer.integer(min, max))
}

fn strip_timezone(value: &str) -> &str {
    let value = value.trim();
    if let Some(stripped) = value.strip_suffix('Z') {
        return stripped;
    }

    // `+HH:MM` / `-HH:MM` suffix; a leading `-` of `--MM` forms is kept
    let bytes = value.as_bytes();
    if bytes.len() > 6 && matches!(bytes[bytes.len() - 6], b'+' | b'-') && bytes[bytes.len() - 3] == b':' {
        return &value[..value.len() - 6];
    }

    value
}

fn date_ordinal(date: NaiveDate) -> i64 {
    date.num_days_from_ce().into()
}

fn parse_date(value: &str) -> Option<i64> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(date_ordinal)
}

fn format_date(days: i64) -> Option<String> {
    let date = NaiveDate::from_num_days_from_ce_opt(days.try_into().ok()?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn parse_date_time(value: &str) -> Option<i64> {
    let value = value.split('.').next()?;
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|date_time| date_time.and_utc().timestamp())
}

fn format_date_time(seconds: i64) -> Option<String> {
    let date_time = DateTime::from_timestamp(seconds, 0)?.naive_utc();
    Some(date_time.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn parse_time(value: &str) -> Option<i64> {
    let value = value.split('.').next()?;
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .ok()
        .map(|time| time.num_seconds_from_midnight().into())
}

fn format_time(seconds: i64) -> Option<String> {
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds.try_into().ok()?, 0)?;
    Some(time.format("%H:%M:%S").to_string())
}

fn parse_year_month(value: &str) -> Option<i64> {
    let (year, month) = value.rsplit_once('-')?;
    let year: i64 = year.parse().ok()?;
    let month: i64 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }

    Some(year * 12 + month - 1)
}

fn format_year_month(months: i64) -> Option<String> {
    Some(format!(
        "{:04}-{:02}",
        months.div_euclid(12),
        months.rem_euclid(12) + 1
    ))
}

fn parse_month_day(value: &str) -> Option<i64> {
    let value = value.strip_prefix("--")?;
    let date = NaiveDate::parse_from_str(&format!("{}-{}", MONTH_DAY_YEAR, value), "%Y-%m-%d").ok()?;
    Some(date.ordinal().into())
}

fn format_month_day(ordinal: i64) -> Option<String> {
    let date = NaiveDate::from_yo_opt(MONTH_DAY_YEAR, ordinal.try_into().ok()?)?;
    Some(date.format("--%m-%d").to_string())
}
