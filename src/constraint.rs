//! Route parameter constraints.
//!
//! A constraint is a capability attached to a pattern parameter; during
//! matching each constraint is asked to accept or reject the candidate
//! value, in the order the template declares them. Rejection means the
//! pattern does not match the path, it is never an error.
//!
//! The builtin set covers the usual inline names (`int`, `bool`, `alpha`,
//! `length`, `minlength`, `maxlength`, `min`, `max`, `range`, `regex`);
//! custom constraints register on a [`ConstraintResolver`] and become
//! available to every template parsed with it.

use std::{
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use regex::Regex;

use crate::{error::PatternError, value::RouteValue, value_map::RouteValueMap};

/// A single route constraint.
///
/// `accepts` receives the candidate value for the constrained parameter and
/// read access to the values matched so far.
pub trait Constraint: Send + Sync + 'static {
    /// Whether `value` satisfies this constraint.
    fn accepts(&self, value: &RouteValue, values: &RouteValueMap) -> bool;
}

impl Debug for dyn Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Constraint")
    }
}

/// A resolved constraint paired with its source text, kept for
/// template re-serialization and diagnostics.
#[derive(Clone)]
pub struct ConstraintRef {
    text: String,
    constraint: Arc<dyn Constraint>,
}

impl ConstraintRef {
    pub(crate) fn new(text: impl Into<String>, constraint: Arc<dyn Constraint>) -> Self {
        Self {
            text: text.into(),
            constraint,
        }
    }

    /// The constraint expression as written in the template, e.g. `min(1)`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `value` satisfies this constraint.
    pub fn accepts(&self, value: &RouteValue, values: &RouteValueMap) -> bool {
        self.constraint.accepts(value, values)
    }
}

impl Debug for ConstraintRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstraintRef").field(&self.text).finish()
    }
}

type ConstraintFactory =
    Arc<dyn Fn(Option<&str>) -> Result<Arc<dyn Constraint>, PatternError> + Send + Sync>;

/// Resolves constraint names found in route templates to [`Constraint`]
/// instances.
///
/// `ConstraintResolver::new` seeds the builtin set; [`register`] adds or
/// replaces a name. Each factory receives the raw argument text between the
/// parentheses, or `None` when the constraint was written without them.
///
/// [`register`]: ConstraintResolver::register
#[derive(Clone)]
pub struct ConstraintResolver {
    factories: HashMap<String, ConstraintFactory>,
}

impl Default for ConstraintResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintResolver {
    /// Creates a resolver with the builtin constraints registered.
    pub fn new() -> Self {
        let mut resolver = Self {
            factories: HashMap::new(),
        };

        resolver.register("int", |args| {
            no_args("int", args)?;
            Ok(Arc::new(IntConstraint))
        });
        resolver.register("bool", |args| {
            no_args("bool", args)?;
            Ok(Arc::new(BoolConstraint))
        });
        resolver.register("alpha", |args| {
            no_args("alpha", args)?;
            Ok(Arc::new(AlphaConstraint))
        });
        resolver.register("length", |args| {
            let bounds = int_args("length", args)?;
            match bounds.as_slice() {
                [exact] => Ok(Arc::new(LengthConstraint {
                    min: *exact,
                    max: *exact,
                })),
                [min, max] => Ok(Arc::new(LengthConstraint {
                    min: *min,
                    max: *max,
                })),
                _ => Err(bad_argument("length", args)),
            }
        });
        resolver.register("minlength", |args| {
            match int_args("minlength", args)?.as_slice() {
                [min] => Ok(Arc::new(LengthConstraint {
                    min: *min,
                    max: usize::MAX,
                })),
                _ => Err(bad_argument("minlength", args)),
            }
        });
        resolver.register("maxlength", |args| {
            match int_args("maxlength", args)?.as_slice() {
                [max] => Ok(Arc::new(LengthConstraint { min: 0, max: *max })),
                _ => Err(bad_argument("maxlength", args)),
            }
        });
        resolver.register("min", |args| match float_args("min", args)?.as_slice() {
            [min] => Ok(Arc::new(RangeConstraint {
                min: *min,
                max: f64::INFINITY,
            })),
            _ => Err(bad_argument("min", args)),
        });
        resolver.register("max", |args| match float_args("max", args)?.as_slice() {
            [max] => Ok(Arc::new(RangeConstraint {
                min: f64::NEG_INFINITY,
                max: *max,
            })),
            _ => Err(bad_argument("max", args)),
        });
        resolver.register("range", |args| {
            match float_args("range", args)?.as_slice() {
                [min, max] => Ok(Arc::new(RangeConstraint {
                    min: *min,
                    max: *max,
                })),
                _ => Err(bad_argument("range", args)),
            }
        });
        resolver.register("regex", |args| {
            let pattern = args.ok_or_else(|| bad_argument("regex", args))?;
            let re = Regex::new(pattern).map_err(|_| bad_argument("regex", args))?;
            Ok(Arc::new(RegexConstraint { re }))
        });

        resolver
    }

    /// Registers a constraint factory under `name`, replacing any previous
    /// registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(Option<&str>) -> Result<Arc<dyn Constraint>, PatternError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Resolves `name` with the raw argument text, if any.
    pub fn resolve(
        &self,
        name: &str,
        args: Option<&str>,
    ) -> Result<Arc<dyn Constraint>, PatternError> {
        match self.factories.get(name) {
            Some(factory) => factory(args),
            None => Err(PatternError::UnknownConstraint {
                name: name.to_string(),
            }),
        }
    }
}

impl Debug for ConstraintResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_tuple("ConstraintResolver").field(&names).finish()
    }
}

fn no_args(name: &str, args: Option<&str>) -> Result<(), PatternError> {
    match args {
        None => Ok(()),
        Some(_) => Err(bad_argument(name, args)),
    }
}

fn bad_argument(name: &str, args: Option<&str>) -> PatternError {
    PatternError::BadConstraintArgument {
        name: name.to_string(),
        argument: args.unwrap_or_default().to_string(),
    }
}

fn int_args(name: &str, args: Option<&str>) -> Result<Vec<usize>, PatternError> {
    let args = args.ok_or_else(|| bad_argument(name, args))?;
    args.split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad_argument(name, Some(args)))
}

fn float_args(name: &str, args: Option<&str>) -> Result<Vec<f64>, PatternError> {
    let args = args.ok_or_else(|| bad_argument(name, args))?;
    args.split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad_argument(name, Some(args)))
}

fn as_number(value: &RouteValue) -> Option<f64> {
    match value {
        RouteValue::Number(n) => Some(*n),
        RouteValue::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

struct IntConstraint;

impl Constraint for IntConstraint {
    fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
        match value {
            RouteValue::Number(n) => n.is_finite() && n.fract() == 0.0,
            RouteValue::String(s) => s.parse::<i64>().is_ok(),
            _ => false,
        }
    }
}

struct BoolConstraint;

impl Constraint for BoolConstraint {
    fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
        match value {
            RouteValue::Bool(_) => true,
            RouteValue::String(s) => {
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
            }
            _ => false,
        }
    }
}

struct AlphaConstraint;

impl Constraint for AlphaConstraint {
    fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
        match value {
            RouteValue::String(s) => s.chars().all(|c| c.is_ascii_alphabetic()),
            _ => false,
        }
    }
}

struct LengthConstraint {
    min: usize,
    max: usize,
}

impl Constraint for LengthConstraint {
    fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
        let len = value.canonical_text().chars().count();
        len >= self.min && len <= self.max
    }
}

struct RangeConstraint {
    min: f64,
    max: f64,
}

impl Constraint for RangeConstraint {
    fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
        match as_number(value) {
            Some(n) => n >= self.min && n <= self.max,
            None => false,
        }
    }
}

struct RegexConstraint {
    re: Regex,
}

impl Constraint for RegexConstraint {
    fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
        self.re.is_match(&value.canonical_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(expr_name: &str, args: Option<&str>, value: impl Into<RouteValue>) -> bool {
        let resolver = ConstraintResolver::new();
        let constraint = resolver.resolve(expr_name, args).unwrap();
        constraint.accepts(&value.into(), &RouteValueMap::new())
    }

    #[test]
    fn test_int() {
        assert!(accepts("int", None, "42"));
        assert!(accepts("int", None, "-7"));
        assert!(accepts("int", None, 42));
        assert!(!accepts("int", None, "4.2"));
        assert!(!accepts("int", None, "abc"));
        assert!(!accepts("int", None, true));
    }

    #[test]
    fn test_bool() {
        assert!(accepts("bool", None, "true"));
        assert!(accepts("bool", None, "FALSE"));
        assert!(accepts("bool", None, false));
        assert!(!accepts("bool", None, "yes"));
        assert!(!accepts("bool", None, 1));
    }

    #[test]
    fn test_alpha() {
        assert!(accepts("alpha", None, "Index"));
        assert!(!accepts("alpha", None, "index7"));
        assert!(!accepts("alpha", None, 7));
    }

    #[test]
    fn test_length() {
        assert!(accepts("length", Some("4"), "home"));
        assert!(!accepts("length", Some("4"), "homes"));
        assert!(accepts("length", Some("2,4"), "abc"));
        assert!(!accepts("length", Some("2,4"), "a"));
        assert!(accepts("minlength", Some("3"), "abc"));
        assert!(!accepts("minlength", Some("3"), "ab"));
        assert!(accepts("maxlength", Some("3"), "ab"));
        assert!(!accepts("maxlength", Some("3"), "abcd"));
    }

    #[test]
    fn test_numeric_bounds() {
        assert!(accepts("min", Some("18"), "18"));
        assert!(!accepts("min", Some("18"), "17"));
        assert!(accepts("max", Some("10"), 10));
        assert!(!accepts("max", Some("10"), 11));
        assert!(accepts("range", Some("1,100"), "50"));
        assert!(!accepts("range", Some("1,100"), "0"));
        assert!(!accepts("range", Some("1,100"), "abc"));
    }

    #[test]
    fn test_regex() {
        assert!(accepts("regex", Some(r"^\d{4}$"), "2024"));
        assert!(!accepts("regex", Some(r"^\d{4}$"), "20245"));
        assert!(!accepts("regex", Some(r"^\d{4}$"), "abcd"));
    }

    #[test]
    fn test_unknown_and_bad_arguments() {
        let resolver = ConstraintResolver::new();

        assert_eq!(
            resolver.resolve("guid", None).unwrap_err(),
            PatternError::UnknownConstraint {
                name: "guid".to_string()
            }
        );
        assert!(matches!(
            resolver.resolve("min", Some("abc")).unwrap_err(),
            PatternError::BadConstraintArgument { .. }
        ));
        assert!(matches!(
            resolver.resolve("int", Some("3")).unwrap_err(),
            PatternError::BadConstraintArgument { .. }
        ));
        assert!(matches!(
            resolver.resolve("regex", Some("(unclosed")).unwrap_err(),
            PatternError::BadConstraintArgument { .. }
        ));
    }

    #[test]
    fn test_custom_registration() {
        let mut resolver = ConstraintResolver::new();

        struct EvenConstraint;

        impl Constraint for EvenConstraint {
            fn accepts(&self, value: &RouteValue, _values: &RouteValueMap) -> bool {
                matches!(value, RouteValue::String(s) if s.parse::<i64>().map_or(false, |n| n % 2 == 0))
            }
        }

        resolver.register("even", |_| Ok(Arc::new(EvenConstraint)));

        let constraint = resolver.resolve("even", None).unwrap();
        assert!(constraint.accepts(&RouteValue::from("4"), &RouteValueMap::new()));
        assert!(!constraint.accepts(&RouteValue::from("5"), &RouteValueMap::new()));
    }
}
