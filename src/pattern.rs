//! Route pattern parsing.
//!
//! A route template like `/blog/{year:int}/{slug=index?}/{*rest}` compiles
//! into an ordered sequence of segments, each a literal, a parameter, or a
//! catch-all. Parsing happens once at registration time; the resulting
//! [`RoutePattern`] is immutable and shared across requests.

use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use crate::{
    constraint::{ConstraintRef, ConstraintResolver},
    error::PatternError,
    value::{eq_ignore_case, RouteValue},
    value_map::RouteValueMap,
};

/// How a catch-all treats a trailing slash in the captured remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashMode {
    /// `{*name}`: one trailing slash is trimmed from the capture.
    Trim,
    /// `{**name}`: the remainder is captured verbatim.
    Keep,
}

/// A named parameter segment.
#[derive(Debug, Clone)]
pub struct ParamSegment {
    pub(crate) name: String,
    pub(crate) default: Option<RouteValue>,
    pub(crate) constraints: Vec<ConstraintRef>,
    pub(crate) optional: bool,
}

impl ParamSegment {
    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default value, inline or externally supplied.
    pub fn default(&self) -> Option<&RouteValue> {
        self.default.as_ref()
    }

    /// The constraints, in declaration order.
    pub fn constraints(&self) -> &[ConstraintRef] {
        &self.constraints
    }

    /// Whether the parameter may be absent from the path.
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// A catch-all segment consuming the remainder of the path.
#[derive(Debug, Clone)]
pub struct CatchAllSegment {
    pub(crate) name: String,
    pub(crate) default: Option<RouteValue>,
    pub(crate) slash: SlashMode,
}

impl CatchAllSegment {
    /// The parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The default value used when the remainder is empty.
    pub fn default(&self) -> Option<&RouteValue> {
        self.default.as_ref()
    }

    /// The trailing-slash handling mode.
    pub fn slash_mode(&self) -> SlashMode {
        self.slash
    }
}

/// One segment of a parsed route pattern.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Exact text, matched ignoring case.
    Literal(String),
    /// A named parameter consuming one path segment.
    Param(ParamSegment),
    /// A catch-all consuming every remaining path segment.
    CatchAll(CatchAllSegment),
}

impl Segment {
    pub(crate) fn parameter_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(p) => Some(&p.name),
            Segment::CatchAll(c) => Some(&c.name),
        }
    }
}

/// External maps supplied alongside a template at parse time.
#[derive(Debug, Default, Clone)]
pub struct ParseOptions {
    /// Default values merged with inline defaults. An entry for a parameter
    /// that already has an inline default is a
    /// [`PatternError::ConflictingDefault`]. Entries naming no parameter are
    /// copied into every successful match.
    pub defaults: RouteValueMap,
    /// Constraint expressions (e.g. `int:min(1)`) attached to parameters by
    /// name, applied after any inline constraints.
    pub constraints: HashMap<String, String>,
    /// Values every successful match must carry: a produced value that
    /// differs from its required value makes the pattern not match.
    pub required_values: RouteValueMap,
}

/// A parsed, immutable route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    pub(crate) template: String,
    pub(crate) segments: Vec<Segment>,
    pub(crate) ranks: Vec<u8>,
    pub(crate) defaults: RouteValueMap,
    pub(crate) required: RouteValueMap,
}

impl RoutePattern {
    /// Parses a route template with no external maps and the builtin
    /// constraints.
    ///
    /// # Example
    ///
    /// ```
    /// use waymark::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("/{controller}/{action}/{id?}").unwrap();
    /// assert_eq!(pattern.segments().len(), 3);
    /// ```
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        Self::parse_with(template, &ParseOptions::default(), &ConstraintResolver::new())
    }

    /// Parses a route template with external defaults, constraint hints and
    /// required values, resolving constraint names through `resolver`.
    pub fn parse_with(
        template: &str,
        options: &ParseOptions,
        resolver: &ConstraintResolver,
    ) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();

        let trimmed = template.strip_prefix('/').unwrap_or(template);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                if raw.is_empty() {
                    return Err(syntax(template, "empty path segment"));
                }
                if matches!(segments.last(), Some(Segment::CatchAll(_))) {
                    if raw.starts_with("{*") {
                        return Err(PatternError::MultipleCatchAll {
                            template: template.to_string(),
                        });
                    }
                    return Err(PatternError::CatchAllPosition {
                        template: template.to_string(),
                    });
                }

                let segment = parse_segment(template, raw, resolver)?;
                if let Some(name) = segment.parameter_name() {
                    if names.iter().any(|n| eq_ignore_case(n, name)) {
                        return Err(PatternError::DuplicateParameter {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    names.push(name.to_string());
                }
                segments.push(segment);
            }
        }

        let mut defaults = options.defaults.clone();
        for segment in &mut segments {
            let (name, default) = match segment {
                Segment::Param(p) => (&p.name, &mut p.default),
                Segment::CatchAll(c) => (&c.name, &mut c.default),
                Segment::Literal(_) => continue,
            };
            if let Some(external) = options.defaults.get(name) {
                if default.is_some() {
                    return Err(PatternError::ConflictingDefault { name: name.clone() });
                }
                *default = Some(external.clone());
            } else if let Some(inline) = default {
                defaults.insert(name.clone(), inline.clone());
            }
        }

        for (target, expr) in &options.constraints {
            let param = segments.iter_mut().find_map(|segment| match segment {
                Segment::Param(p) if eq_ignore_case(&p.name, target) => Some(p),
                _ => None,
            });
            let param = param.ok_or_else(|| {
                syntax(
                    template,
                    &format!("constraint hint references unknown parameter `{target}`"),
                )
            })?;
            for token in split_constraint_chain(template, expr)? {
                let (name, args) = split_constraint(template, token)?;
                let constraint = resolver.resolve(name, args)?;
                param.constraints.push(ConstraintRef::new(token, constraint));
            }
        }

        let ranks = segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(_) => 0,
                Segment::Param(p) if !p.constraints.is_empty() => 1,
                Segment::Param(_) => 2,
                Segment::CatchAll(_) => 3,
            })
            .collect();

        Ok(RoutePattern {
            template: template.to_string(),
            segments,
            ranks,
            defaults,
            required: options.required_values.clone(),
        })
    }

    /// The template text this pattern was parsed from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The parsed segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The specificity rank of each segment, used by candidate selection:
    /// literals rank above constrained parameters, which rank above
    /// unconstrained parameters, which rank above catch-alls.
    pub fn ranks(&self) -> &[u8] {
        &self.ranks
    }

    pub(crate) fn defaults(&self) -> &RouteValueMap {
        &self.defaults
    }

    pub(crate) fn required(&self) -> &RouteValueMap {
        &self.required
    }
}

impl Display for RoutePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Param(p) => {
                write!(f, "{{{}", p.name)?;
                for constraint in &p.constraints {
                    write!(f, ":{}", constraint.text())?;
                }
                if let Some(default) = &p.default {
                    write!(f, "={default}")?;
                }
                if p.optional {
                    f.write_str("?")?;
                }
                f.write_str("}")
            }
            Segment::CatchAll(c) => {
                match c.slash {
                    SlashMode::Trim => write!(f, "{{*{}", c.name)?,
                    SlashMode::Keep => write!(f, "{{**{}", c.name)?,
                }
                if let Some(default) = &c.default {
                    write!(f, "={default}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn syntax(template: &str, message: &str) -> PatternError {
    PatternError::Syntax {
        template: template.to_string(),
        message: message.to_string(),
    }
}

/// Extracts the contents of a `{...}` group that spans the whole segment.
fn braced_group(raw: &str) -> Option<&str> {
    if !raw.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return if i == raw.len() - 1 {
                        Some(&raw[1..i])
                    } else {
                        None
                    };
                }
            }
            _ => {}
        }
    }
    None
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse_segment(
    template: &str,
    raw: &str,
    resolver: &ConstraintResolver,
) -> Result<Segment, PatternError> {
    match braced_group(raw) {
        Some(inner) => parse_parameter(template, inner, resolver),
        None if raw.contains('{') || raw.contains('}') => Err(syntax(
            template,
            "a parameter group must span the entire segment",
        )),
        None => Ok(Segment::Literal(raw.to_string())),
    }
}

fn parse_parameter(
    template: &str,
    inner: &str,
    resolver: &ConstraintResolver,
) -> Result<Segment, PatternError> {
    let (slash, rest) = if let Some(rest) = inner.strip_prefix("**") {
        (Some(SlashMode::Keep), rest)
    } else if let Some(rest) = inner.strip_prefix('*') {
        (Some(SlashMode::Trim), rest)
    } else {
        (None, inner)
    };

    let name_end = rest.find([':', '=', '?']).unwrap_or(rest.len());
    let name = &rest[..name_end];
    if !is_valid_name(name) {
        return Err(PatternError::InvalidParameterName {
            template: template.to_string(),
            name: name.to_string(),
        });
    }
    let mut rest = &rest[name_end..];

    let mut constraints = Vec::new();
    while let Some(r) = rest.strip_prefix(':') {
        let (token, remaining) = take_constraint_token(template, r)?;
        rest = remaining;
        let (cname, cargs) = split_constraint(template, token)?;
        let constraint = resolver.resolve(cname, cargs)?;
        constraints.push(ConstraintRef::new(token, constraint));
    }

    let mut default = None;
    let mut optional = false;
    match rest {
        "" => {}
        "?" => optional = true,
        _ if rest.starts_with('=') => {
            let text = &rest[1..];
            if text.ends_with('?') {
                return Err(PatternError::DefaultOnOptional {
                    name: name.to_string(),
                });
            }
            default = Some(RouteValue::from_literal(text));
        }
        _ => return Err(syntax(template, "unexpected text in parameter group")),
    }

    match slash {
        Some(slash) => {
            if optional {
                return Err(PatternError::OptionalCatchAll {
                    name: name.to_string(),
                });
            }
            if !constraints.is_empty() {
                return Err(syntax(template, "catch-all parameters do not take constraints"));
            }
            Ok(Segment::CatchAll(CatchAllSegment {
                name: name.to_string(),
                default,
                slash,
            }))
        }
        None => Ok(Segment::Param(ParamSegment {
            name: name.to_string(),
            default,
            constraints,
            optional,
        })),
    }
}

/// Takes one constraint token off `rest`, stopping at a `:`/`=`/`?` that is
/// not nested inside parentheses (so `regex(^(a|b)?$)` stays whole).
fn take_constraint_token<'a>(
    template: &str,
    rest: &'a str,
) -> Result<(&'a str, &'a str), PatternError> {
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(syntax(template, "unbalanced parentheses in constraint"));
                }
                depth -= 1;
            }
            ':' | '=' | '?' if depth == 0 => return Ok((&rest[..i], &rest[i..])),
            _ => {}
        }
    }
    if depth != 0 {
        return Err(syntax(template, "unbalanced parentheses in constraint"));
    }
    Ok((rest, ""))
}

fn split_constraint<'a>(
    template: &str,
    token: &'a str,
) -> Result<(&'a str, Option<&'a str>), PatternError> {
    let (name, args) = match token.find('(') {
        Some(pos) => {
            if !token.ends_with(')') {
                return Err(syntax(template, "malformed constraint arguments"));
            }
            (&token[..pos], Some(&token[pos + 1..token.len() - 1]))
        }
        None => (token, None),
    };
    if name.is_empty() {
        return Err(syntax(template, "empty constraint name"));
    }
    Ok((name, args))
}

fn split_constraint_chain<'a>(
    template: &str,
    mut expr: &'a str,
) -> Result<Vec<&'a str>, PatternError> {
    let mut tokens = Vec::new();
    loop {
        let (token, rest) = take_constraint_token(template, expr)?;
        tokens.push(token);
        match rest.strip_prefix(':') {
            Some(r) => expr = r,
            None if rest.is_empty() => break,
            None => return Err(syntax(template, "malformed constraint expression")),
        }
    }
    Ok(tokens)
}
