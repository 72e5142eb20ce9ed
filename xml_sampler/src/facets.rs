/// Constraining facets of a simple type restriction.
///
/// Bound facets are kept in their lexical form because their meaning depends on
/// the primitive type they restrict (numbers, dates, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSet {
    pub enumeration: Vec<String>,
    pub patterns: Vec<String>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub max_exclusive: Option<String>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

impl FacetSet {
    pub fn new() -> FacetSet {
        FacetSet::default()
    }

    /// Fill every facet this restriction leaves unset from its base type.
    ///
    /// Enumerations and patterns are taken as a whole from the most derived
    /// restriction that declares any.
    pub fn inherit(&mut self, base: &FacetSet) {
        if self.enumeration.is_empty() {
            self.enumeration = base.enumeration.clone();
        }
        if self.patterns.is_empty() {
            self.patterns = base.patterns.clone();
        }

        inherit_value(&mut self.length, &base.length);
        inherit_value(&mut self.min_length, &base.min_length);
        inherit_value(&mut self.max_length, &base.max_length);
        inherit_value(&mut self.total_digits, &base.total_digits);
        inherit_value(&mut self.fraction_digits, &base.fraction_digits);

        // An inclusive and an exclusive bound on the same side are exclusive of
        // one another, so only inherit a side the restriction left open.
        if self.min_inclusive.is_none() && self.min_exclusive.is_none() {
            self.min_inclusive = base.min_inclusive.clone();
            self.min_exclusive = base.min_exclusive.clone();
        }
        if self.max_inclusive.is_none() && self.max_exclusive.is_none() {
            self.max_inclusive = base.max_inclusive.clone();
            self.max_exclusive = base.max_exclusive.clone();
        }
    }

    /// Effective `(min, max)` length; an exact `length` facet fixes both.
    pub fn length_range(&self) -> (Option<usize>, Option<usize>) {
        match self.length {
            Some(length) => (Some(length), Some(length)),
            None => (self.min_length, self.max_length),
        }
    }

    /// Lower bound as `(value, exclusive)`.
    pub(crate) fn lower_bound(&self) -> Option<(&str, bool)> {
        if let Some(value) = &self.min_inclusive {
            return Some((value.as_str(), false));
        }

        self.min_exclusive.as_deref().map(|value| (value, true))
    }

    /// Upper bound as `(value, exclusive)`.
    pub(crate) fn upper_bound(&self) -> Option<(&str, bool)> {
        if let Some(value) = &self.max_inclusive {
            return Some((value.as_str(), false));
        }

        self.max_exclusive.as_deref().map(|value| (value, true))
    }
}

fn inherit_value<T: Clone>(value: &mut Option<T>, base: &Option<T>) {
    if value.is_none() {
        value.clone_from(base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_keeps_derived_values() {
        let mut derived = FacetSet {
            max_length: Some(5),
            patterns: vec!["[a-z]+".to_string()],
            ..FacetSet::new()
        };
        let base = FacetSet {
            min_length: Some(2),
            max_length: Some(10),
            patterns: vec!["[A-Z]+".to_string()],
            enumeration: vec!["a".to_string()],
            ..FacetSet::new()
        };

        derived.inherit(&base);

        assert_eq!(derived.min_length, Some(2));
        assert_eq!(derived.max_length, Some(5));
        assert_eq!(derived.patterns, vec!["[a-z]+".to_string()]);
        assert_eq!(derived.enumeration, vec!["a".to_string()]);
    }

    #[test]
    fn test_inherit_bound_sides() {
        let mut derived = FacetSet {
            min_exclusive: Some("0".to_string()),
            ..FacetSet::new()
        };
        let base = FacetSet {
            min_inclusive: Some("-10".to_string()),
            max_inclusive: Some("10".to_string()),
            ..FacetSet::new()
        };

        derived.inherit(&base);

        assert_eq!(derived.lower_bound(), Some(("0", true)));
        assert_eq!(derived.upper_bound(), Some(("10", false)));
    }

    #[test]
    fn test_exact_length() {
        let facets = FacetSet {
            length: Some(10),
            min_length: Some(1),
            ..FacetSet::new()
        };

        assert_eq!(facets.length_range(), (Some(10), Some(10)));
    }
}
