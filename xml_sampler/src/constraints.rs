/// Reconcile the three independent sources of numeric bounds into one range.
///
/// * `digit_*` - bounds implied by a `totalDigits` facet
/// * `schema_*` - bounds taken from the inclusive/exclusive facets
/// * `config_*` - bounds requested in the generator configuration
///
/// Schema bounds take precedence over digit bounds, and a reversed schema range
/// is normalised rather than rejected. The result is then clamped to the digit
/// bounds. Configuration bounds can only tighten the range: a minimum above the
/// current maximum (or a maximum below the current minimum) is ignored.
///
/// Either side of the result is `None` when nothing constrains it.
pub fn merge_constraints(
    digit_min: Option<i64>,
    digit_max: Option<i64>,
    schema_min: Option<i64>,
    schema_max: Option<i64>,
    config_min: Option<i64>,
    config_max: Option<i64>,
) -> (Option<i64>, Option<i64>) {
    let mut effective_min = schema_min.or(digit_min);
    let mut effective_max = schema_max.or(digit_max);

    if let (Some(min), Some(max)) = (effective_min, effective_max) {
        if min > max {
            effective_min = Some(max);
            effective_max = Some(min);
        }
    }

    if let Some(digit_min) = digit_min {
        effective_min = Some(effective_min.map_or(digit_min, |min| min.max(digit_min)));
    }
    if let Some(digit_max) = digit_max {
        effective_max = Some(effective_max.map_or(digit_max, |max| max.min(digit_max)));
    }

    if let Some(config_min) = config_min {
        if effective_max.is_none_or(|max| config_min <= max) {
            effective_min = Some(effective_min.map_or(config_min, |min| min.max(config_min)));
        }
    }

    if let Some(config_max) = config_max {
        if effective_min.is_none_or(|min| config_max >= min) {
            effective_max = Some(effective_max.map_or(config_max, |max| max.min(config_max)));
        }
    }

    (effective_min, effective_max)
}

/// Symmetric bounds for an integer with at most `digits` digits.
///
/// Digit counts beyond what an `i64` can hold saturate.
pub(crate) fn digit_bounds(digits: u32) -> (i64, i64) {
    let limit = 10_i64
        .checked_pow(digits.min(18))
        .map_or(i64::MAX, |power| power - 1);

    (-limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_bounds_clamped_to_digits() {
        let result = merge_constraints(Some(-99), Some(99), Some(-100), Some(-90), None, None);
        assert_eq!(result, (Some(-99), Some(-90)));
    }

    #[test]
    fn test_config_min_above_range_is_ignored() {
        let result = merge_constraints(None, None, Some(10), Some(50), Some(60), None);
        assert_eq!(result, (Some(10), Some(50)));
    }

    #[test]
    fn test_config_bounds_tighten() {
        let result = merge_constraints(None, None, Some(10), Some(50), Some(20), Some(40));
        assert_eq!(result, (Some(20), Some(40)));
    }

    #[test]
    fn test_reversed_schema_bounds() {
        let result = merge_constraints(None, None, Some(50), Some(10), None, None);
        assert_eq!(result, (Some(10), Some(50)));
    }

    #[test]
    fn test_config_cannot_widen() {
        let result = merge_constraints(None, None, Some(10), Some(50), Some(0), Some(100));
        assert_eq!(result, (Some(10), Some(50)));
    }

    #[test]
    fn test_config_max_below_range_is_ignored() {
        let result = merge_constraints(None, None, Some(10), Some(50), None, Some(5));
        assert_eq!(result, (Some(10), Some(50)));
    }

    #[test]
    fn test_digit_bounds_only() {
        let (min, max) = digit_bounds(3);
        let result = merge_constraints(Some(min), Some(max), None, None, None, None);
        assert_eq!(result, (Some(-999), Some(999)));
    }

    #[test]
    fn test_unconstrained_sides() {
        assert_eq!(
            merge_constraints(None, None, Some(5), None, None, None),
            (Some(5), None)
        );
        assert_eq!(
            merge_constraints(None, None, None, None, None, Some(7)),
            (None, Some(7))
        );
        assert_eq!(
            merge_constraints(None, None, None, None, None, None),
            (None, None)
        );
    }

    #[test]
    fn test_digit_bounds_saturate() {
        let (min, max) = digit_bounds(40);
        assert_eq!(max, 999_999_999_999_999_999);
        assert_eq!(min, -max);
    }
}
