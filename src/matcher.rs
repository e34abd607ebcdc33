//! Pattern matching against request paths.
//!
//! Matching is pure computation over immutable pattern data: split the
//! path, walk pattern and path segments in lockstep, and produce a fresh
//! [`RouteValueMap`] on success. A miss returns `None`, never an error.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::{
    pattern::{RoutePattern, Segment, SlashMode},
    value::{eq_ignore_case, RouteValue},
    value_map::RouteValueMap,
};

impl RoutePattern {
    /// Matches this pattern against a request path.
    ///
    /// On success the returned map merges matched values, defaults and
    /// externally required values. Repeated calls with the same path yield
    /// identical maps.
    ///
    /// # Example
    ///
    /// ```
    /// use waymark::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("/{controller}/{action}/{id?}").unwrap();
    /// let values = pattern.matches("/home/index/5").unwrap();
    ///
    /// assert_eq!(values.get_str("controller"), Some("home"));
    /// assert_eq!(values.get_str("action"), Some("index"));
    /// assert_eq!(values.get_str("id"), Some("5"));
    /// ```
    pub fn matches(&self, path: &str) -> Option<RouteValueMap> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);

        let mut path_segments: SmallVec<[Cow<'_, str>; 8]> = SmallVec::new();
        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                match percent_encoding::percent_decode(raw.as_bytes()).decode_utf8() {
                    Ok(decoded) => path_segments.push(decoded),
                    Err(_) => return None,
                }
            }
        }

        let mut values = RouteValueMap::new();
        let mut used_catch_all = false;

        for (i, segment) in self.segments().iter().enumerate() {
            // an empty path segment (doubled or trailing slash) counts as
            // absent, satisfiable only by a default or optionality
            let path_segment = path_segments
                .get(i)
                .map(|s| s.as_ref())
                .filter(|s| !s.is_empty());

            match segment {
                Segment::Literal(text) => {
                    let s = path_segment?;
                    if !eq_ignore_case(text, s) {
                        return None;
                    }
                }
                Segment::Param(p) => match path_segment {
                    Some(s) => {
                        let value = RouteValue::String(s.to_string());
                        for constraint in &p.constraints {
                            if !constraint.accepts(&value, &values) {
                                return None;
                            }
                        }
                        values.insert(p.name.clone(), value);
                    }
                    None => {
                        if let Some(default) = &p.default {
                            values.insert(p.name.clone(), default.clone());
                        } else if !p.optional {
                            return None;
                        }
                    }
                },
                Segment::CatchAll(c) => {
                    used_catch_all = true;

                    let mut remainder = String::new();
                    if i < path_segments.len() {
                        for (n, s) in path_segments[i..].iter().enumerate() {
                            if n > 0 {
                                remainder.push('/');
                            }
                            remainder.push_str(s);
                        }
                    }
                    if matches!(c.slash, SlashMode::Trim) && remainder.ends_with('/') {
                        remainder.pop();
                    }

                    if remainder.is_empty() {
                        match &c.default {
                            Some(default) => values.insert(c.name.clone(), default.clone()),
                            None => values.insert(c.name.clone(), RouteValue::Null),
                        }
                    } else {
                        values.insert(c.name.clone(), RouteValue::String(remainder));
                    }
                }
            }
        }

        if !used_catch_all && path_segments.len() > self.segments().len() {
            // extra content is tolerated only if it is all separators
            if path_segments[self.segments().len()..]
                .iter()
                .any(|s| !s.is_empty())
            {
                return None;
            }
        }

        for (name, value) in self.defaults().iter() {
            if !values.contains_key(name) {
                values.insert(name.to_string(), value.clone());
            }
        }

        for (name, value) in self.required().iter() {
            match values.get(name) {
                Some(actual) => {
                    if actual != value {
                        return None;
                    }
                }
                None => values.insert(name.to_string(), value.clone()),
            }
        }

        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        constraint::ConstraintResolver,
        pattern::{ParseOptions, RoutePattern},
        value::RouteValue,
        value_map::RouteValueMap,
    };

    fn values<I, K, V>(entries: I) -> RouteValueMap
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RouteValue>,
    {
        entries.into_iter().collect()
    }

    #[test]
    fn test_controller_action_id() {
        let pattern = RoutePattern::parse("/{controller}/{action}/{id?}").unwrap();

        assert_eq!(
            pattern.matches("/home/index/5"),
            Some(values([("controller", "home"), ("action", "index"), ("id", "5")]))
        );
        assert_eq!(
            pattern.matches("/home/index"),
            Some(values([("controller", "home"), ("action", "index")]))
        );
        assert_eq!(pattern.matches("/home"), None);
    }

    #[test]
    fn test_literal_is_case_insensitive() {
        let pattern = RoutePattern::parse("/Home/Index").unwrap();

        assert!(pattern.matches("/home/index").is_some());
        assert!(pattern.matches("/HOME/INDEX").is_some());
        assert!(pattern.matches("/home/about").is_none());
    }

    #[test]
    fn test_default_fills_absent_segment() {
        let pattern = RoutePattern::parse("/{controller}/{action=Index}").unwrap();

        assert_eq!(
            pattern.matches("/home"),
            Some(values([("controller", "home"), ("action", "Index")]))
        );
        assert_eq!(
            pattern.matches("/home/about"),
            Some(values([("controller", "home"), ("action", "about")]))
        );
    }

    #[test]
    fn test_optional_without_default_is_absent() {
        let pattern = RoutePattern::parse("/{controller}/{id?}").unwrap();
        let matched = pattern.matches("/home").unwrap();

        assert_eq!(matched.get("id"), None);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_extra_segments_without_catch_all() {
        let pattern = RoutePattern::parse("/a/{b}").unwrap();

        assert!(pattern.matches("/a/x").is_some());
        // trailing separators are tolerated
        assert!(pattern.matches("/a/x/").is_some());
        assert!(pattern.matches("/a/x/y").is_none());
    }

    #[test]
    fn test_catch_all_captures_remainder() {
        let pattern = RoutePattern::parse("/files/{*path}").unwrap();

        assert_eq!(
            pattern.matches("/files/docs/report.txt"),
            Some(values([("path", "docs/report.txt")]))
        );
        assert_eq!(pattern.matches("/files/a"), Some(values([("path", "a")])));
    }

    #[test]
    fn test_empty_catch_all() {
        let pattern = RoutePattern::parse("/files/{*path}").unwrap();
        let matched = pattern.matches("/files").unwrap();
        assert_eq!(matched.get("path"), Some(&RouteValue::Null));

        let pattern = RoutePattern::parse("/files/{*path=index.html}").unwrap();
        let matched = pattern.matches("/files").unwrap();
        assert_eq!(matched.get("path"), Some(&RouteValue::from("index.html")));
    }

    #[test]
    fn test_catch_all_slash_modes() {
        let trim = RoutePattern::parse("/files/{*path}").unwrap();
        let keep = RoutePattern::parse("/files/{**path}").unwrap();

        assert_eq!(
            trim.matches("/files/a/b/"),
            Some(values([("path", "a/b")]))
        );
        assert_eq!(
            keep.matches("/files/a/b/"),
            Some(values([("path", "a/b/")]))
        );
        assert_eq!(keep.matches("/files/a/b"), Some(values([("path", "a/b")])));
    }

    #[test]
    fn test_constraint_rejection_is_no_match() {
        let pattern = RoutePattern::parse("/users/{id:int}").unwrap();

        assert!(pattern.matches("/users/42").is_some());
        assert!(pattern.matches("/users/abc").is_none());
    }

    #[test]
    fn test_constraint_order_applies() {
        let pattern = RoutePattern::parse("/items/{id:int:range(1,9)}").unwrap();

        assert!(pattern.matches("/items/5").is_some());
        assert!(pattern.matches("/items/12").is_none());
        assert!(pattern.matches("/items/x").is_none());
    }

    #[test]
    fn test_percent_decoding() {
        let pattern = RoutePattern::parse("/greet/{name}").unwrap();
        let matched = pattern.matches("/greet/%E4%BD%A0%E5%A5%BD").unwrap();

        assert_eq!(matched.get_str("name"), Some("你好"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = RoutePattern::parse("/").unwrap();

        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("").is_some());
        assert!(pattern.matches("/home").is_none());
    }

    #[test]
    fn test_non_parameter_defaults_are_copied() {
        let options = ParseOptions {
            defaults: values([("area", "admin")]),
            ..ParseOptions::default()
        };
        let pattern =
            RoutePattern::parse_with("/{controller}", &options, &ConstraintResolver::new())
                .unwrap();
        let matched = pattern.matches("/home").unwrap();

        assert_eq!(matched.get_str("area"), Some("admin"));
    }

    #[test]
    fn test_required_values() {
        let options = ParseOptions {
            required_values: values([("controller", "Home")]),
            ..ParseOptions::default()
        };
        let pattern =
            RoutePattern::parse_with("/{controller}/{action}", &options, &ConstraintResolver::new())
                .unwrap();

        // matches case-insensitively against the required value
        assert!(pattern.matches("/home/index").is_some());
        // a mismatched required value is a miss, not an error
        assert!(pattern.matches("/store/index").is_none());
    }

    #[test]
    fn test_required_value_without_parameter_is_copied() {
        let options = ParseOptions {
            required_values: values([("handler", "pages")]),
            ..ParseOptions::default()
        };
        let pattern =
            RoutePattern::parse_with("/about", &options, &ConstraintResolver::new()).unwrap();
        let matched = pattern.matches("/about").unwrap();

        assert_eq!(matched.get_str("handler"), Some("pages"));
    }

    #[test]
    fn test_matching_is_idempotent() {
        let options = ParseOptions {
            defaults: values([("format", "html")]),
            constraints: HashMap::from([("id".to_string(), "int".to_string())]),
            ..ParseOptions::default()
        };
        let pattern = RoutePattern::parse_with(
            "/{controller}/{action=Index}/{id?}",
            &options,
            &ConstraintResolver::new(),
        )
        .unwrap();

        let first = pattern.matches("/home/list/3").unwrap();
        for _ in 0..10 {
            assert_eq!(pattern.matches("/home/list/3").unwrap(), first);
        }
    }
}
