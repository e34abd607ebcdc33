use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

/// Compares two strings ordinally, ignoring case.
///
/// Case folding is per-character simple lowercasing, so the comparison has
/// no locale dependence and never allocates.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    let mut a = a.chars().flat_map(char::to_lowercase);
    let mut b = b.chars().flat_map(char::to_lowercase);
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

/// A single route value, extracted from a request path or supplied as a
/// default.
///
/// Equality implements the coercion table used everywhere route values are
/// compared (required-value checks, ambient value comparisons in
/// constraints):
///
/// - `Null` equals `Null` and the empty string, nothing else.
/// - Two strings compare ordinally, ignoring case: `"foo" == "FOO"`.
/// - Two numbers compare numerically; `-0.0 == 0.0`, and `NaN` equals
///   `NaN` so that equality stays reflexive.
/// - Two booleans compare by identity.
/// - Every other cross-variant pair renders both sides to their canonical
///   text and compares that, ignoring case: `Number(7.0)` equals `"7"`,
///   `Bool(true)` equals `"True"`. A number never equals a boolean because
///   boolean canonical text is never numeric.
///
/// The table is total and symmetric, and [`Hash`] is consistent with it:
/// equal values hash identically.
///
/// Absence from a [`RouteValueMap`](crate::RouteValueMap) is a distinct
/// state from `Null`; use [`values_equal`] when either side may be missing.
#[derive(Debug, Clone)]
pub enum RouteValue {
    /// A text value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Bool(bool),
    /// An explicit null, produced for an empty catch-all with no default.
    Null,
}

impl RouteValue {
    /// The canonical textual form of this value.
    ///
    /// Numbers with an integral value render without a fractional part
    /// (`7`, not `7.0`), booleans render as `true`/`false`, and `Null`
    /// renders as the empty string.
    pub fn canonical_text(&self) -> Cow<'_, str> {
        match self {
            RouteValue::String(s) => Cow::Borrowed(s.as_str()),
            RouteValue::Number(n) => {
                // normalizes -0.0 so text and hash agree with equality
                let n = if *n == 0.0 { 0.0 } else { *n };
                Cow::Owned(n.to_string())
            }
            RouteValue::Bool(true) => Cow::Borrowed("true"),
            RouteValue::Bool(false) => Cow::Borrowed("false"),
            RouteValue::Null => Cow::Borrowed(""),
        }
    }

    /// Parses a template literal into a value.
    ///
    /// `true`/`false` (any case) become booleans, finite numeric text
    /// becomes a number, anything else stays a string.
    pub fn from_literal(text: &str) -> RouteValue {
        if text.eq_ignore_ascii_case("true") {
            RouteValue::Bool(true)
        } else if text.eq_ignore_ascii_case("false") {
            RouteValue::Bool(false)
        } else if let Ok(n) = text.parse::<f64>() {
            if n.is_finite() {
                RouteValue::Number(n)
            } else {
                RouteValue::String(text.to_string())
            }
        } else {
            RouteValue::String(text.to_string())
        }
    }

    /// Returns `true` for `Null` and for the empty string.
    pub fn is_empty_like(&self) -> bool {
        match self {
            RouteValue::Null => true,
            RouteValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Compares two possibly-missing route values.
///
/// A missing value equals only another missing value; in particular
/// `Some(Null)` does not equal `None`.
pub fn values_equal(a: Option<&RouteValue>, b: Option<&RouteValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl PartialEq for RouteValue {
    fn eq(&self, other: &Self) -> bool {
        use RouteValue::*;

        match (self, other) {
            (Null, Null) => true,
            (Null, String(s)) | (String(s), Null) => s.is_empty(),
            (Null, _) | (_, Null) => false,
            (String(a), String(b)) => eq_ignore_case(a, b),
            (Number(a), Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Bool(a), Bool(b)) => a == b,
            (a, b) => eq_ignore_case(&a.canonical_text(), &b.canonical_text()),
        }
    }
}

impl Eq for RouteValue {}

impl Hash for RouteValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.canonical_text().chars().flat_map(char::to_lowercase) {
            state.write_u32(c as u32);
        }
    }
}

impl Display for RouteValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text())
    }
}

impl From<&str> for RouteValue {
    fn from(value: &str) -> Self {
        RouteValue::String(value.to_string())
    }
}

impl From<String> for RouteValue {
    fn from(value: String) -> Self {
        RouteValue::String(value)
    }
}

impl From<f64> for RouteValue {
    fn from(value: f64) -> Self {
        RouteValue::Number(value)
    }
}

impl From<i64> for RouteValue {
    fn from(value: i64) -> Self {
        RouteValue::Number(value as f64)
    }
}

impl From<i32> for RouteValue {
    fn from(value: i32) -> Self {
        RouteValue::Number(value as f64)
    }
}

impl From<bool> for RouteValue {
    fn from(value: bool) -> Self {
        RouteValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::hash_map::DefaultHasher,
        hash::{Hash, Hasher},
    };

    use super::*;

    fn hash_of(value: &RouteValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_null_and_empty_string() {
        assert_eq!(RouteValue::Null, RouteValue::from(""));
        assert_eq!(RouteValue::from(""), RouteValue::Null);
        assert_ne!(RouteValue::Null, RouteValue::from("foo"));
        assert_ne!(RouteValue::from("foo"), RouteValue::Null);
        assert_ne!(RouteValue::Null, RouteValue::from(0));
        assert_ne!(RouteValue::Null, RouteValue::from(false));
    }

    #[test]
    fn test_string_comparison_is_case_insensitive() {
        assert_eq!(RouteValue::from("foo"), RouteValue::from("FOO"));
        assert_ne!(RouteValue::from("foo"), RouteValue::from("boo"));
    }

    #[test]
    fn test_cross_type_coercion() {
        assert_eq!(RouteValue::from(7), RouteValue::from("7"));
        assert_eq!(RouteValue::from("7"), RouteValue::from(7));
        assert_eq!(RouteValue::from(5.7), RouteValue::from(5.7));
        assert_eq!(RouteValue::from(5.7), RouteValue::from("5.7"));
        assert_eq!(RouteValue::from(true), RouteValue::from("True"));
        assert_eq!(RouteValue::from(false), RouteValue::from("FALSE"));
        assert_ne!(RouteValue::from(1), RouteValue::from(true));
        assert_ne!(RouteValue::from(0), RouteValue::from(false));
    }

    #[test]
    fn test_symmetry_over_all_variant_pairs() {
        let values = [
            RouteValue::from("7"),
            RouteValue::from("true"),
            RouteValue::from(""),
            RouteValue::from(7),
            RouteValue::from(0),
            RouteValue::from(true),
            RouteValue::from(false),
            RouteValue::Null,
        ];

        for a in &values {
            for b in &values {
                assert_eq!(a == b, b == a, "asymmetric for {a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_numeric_edge_cases() {
        assert_eq!(RouteValue::Number(0.0), RouteValue::Number(-0.0));
        assert_eq!(RouteValue::Number(f64::NAN), RouteValue::Number(f64::NAN));
        assert_eq!(RouteValue::Number(7.0).canonical_text(), "7");
        assert_eq!(RouteValue::Number(5.7).canonical_text(), "5.7");
        assert_eq!(RouteValue::Number(-0.0).canonical_text(), "0");
    }

    #[test]
    fn test_hash_consistent_with_equality() {
        let pairs = [
            (RouteValue::Null, RouteValue::from("")),
            (RouteValue::from("foo"), RouteValue::from("FOO")),
            (RouteValue::from(7), RouteValue::from("7")),
            (RouteValue::from(true), RouteValue::from("True")),
            (RouteValue::Number(0.0), RouteValue::Number(-0.0)),
        ];

        for (a, b) in &pairs {
            assert_eq!(a, b);
            assert_eq!(hash_of(a), hash_of(b), "hash mismatch for {a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_missing_is_distinct_from_null() {
        let null = RouteValue::Null;
        assert!(values_equal(None, None));
        assert!(values_equal(Some(&null), Some(&null)));
        assert!(!values_equal(Some(&null), None));
        assert!(!values_equal(None, Some(&null)));
    }

    #[test]
    fn test_from_literal() {
        assert_eq!(RouteValue::from_literal("true"), RouteValue::Bool(true));
        assert_eq!(RouteValue::from_literal("False"), RouteValue::Bool(false));
        assert_eq!(RouteValue::from_literal("42"), RouteValue::Number(42.0));
        assert_eq!(RouteValue::from_literal("5.7"), RouteValue::Number(5.7));
        assert!(matches!(
            RouteValue::from_literal("home"),
            RouteValue::String(_)
        ));
        assert!(matches!(
            RouteValue::from_literal("inf"),
            RouteValue::String(_)
        ));
    }
}
