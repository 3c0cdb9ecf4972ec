use regex::Regex;
use serde::Serialize;

/// Query parameter placeholder.
///
/// # Examples
/// ```text
/// ?          // Anonymous
/// ?limit     // Named("limit")
/// ?2         // Positional(2)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Anonymous,
    Named(String),
    Positional(u32),
}

/// One dot-separated part of a [`QualifiedName`].
///
/// Double parameters (`??`, `??name`) stand for identifiers and are only
/// accepted where an identifier is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Identifier(String),
    Param(Parameter),
    DoubleParam(Parameter),
}

/// Experimental `[qualifier].[name]` prefix. The qualifier inside the
/// brackets may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Qualifier {
    pub name: Option<String>,
}

/// Dotted reference to a column.
///
/// # Examples
/// ```text
/// emp_no
/// address.city
/// `first-name`.raw
/// [employees].[emp_no]      // experimental
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifiedName {
    pub qualifier: Option<Qualifier>,
    pub segments: Vec<Segment>,
}

impl QualifiedName {
    /// Name made of plain identifiers split on nothing: `simple("a.b")` is a
    /// single segment called `a.b`.
    pub fn simple(name: &str) -> Self {
        QualifiedName {
            qualifier: None,
            segments: vec![Segment::Identifier(name.to_string())],
        }
    }

    /// Name made of several identifier segments.
    pub fn dotted(parts: &[&str]) -> Self {
        QualifiedName {
            qualifier: None,
            segments: parts
                .iter()
                .map(|p| Segment::Identifier(p.to_string()))
                .collect(),
        }
    }

    /// The dotted text when every segment is an identifier.
    pub fn as_dotted(&self) -> Option<String> {
        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Identifier(name) => parts.push(name.as_str()),
                _ => return None,
            }
        }
        Some(parts.join("."))
    }
}

/// Piece of a pattern segment: literal text or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPart {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSegment {
    Pattern(Vec<PatternPart>),
    Param(Parameter),
    DoubleParam(Parameter),
}

/// Column selector used by KEEP, DROP, RENAME, ENRICH, INSIST and LOOKUP.
///
/// `*` inside an unquoted segment is a wildcard; a `*` written inside
/// back-ticks is literal.
///
/// # Examples
/// ```text
/// *
/// first_*
/// `a-b`.*_count
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamePattern {
    pub qualifier: Option<Qualifier>,
    pub segments: Vec<PatternSegment>,
}

impl NamePattern {
    /// Pattern matching exactly one segment of literal text.
    pub fn literal(name: &str) -> Self {
        NamePattern {
            qualifier: None,
            segments: vec![PatternSegment::Pattern(vec![PatternPart::Literal(
                name.to_string(),
            )])],
        }
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|segment| match segment {
            PatternSegment::Pattern(parts) => parts.contains(&PatternPart::Wildcard),
            _ => false,
        })
    }

    /// Anchored regex equivalent, or `None` when the pattern contains
    /// parameters (their value is only known after binding).
    pub fn to_regex(&self) -> Option<Regex> {
        let mut source = String::from("^");
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                source.push_str(r"\.");
            }
            let PatternSegment::Pattern(parts) = segment else {
                return None;
            };
            for part in parts {
                match part {
                    PatternPart::Literal(text) => source.push_str(&regex::escape(text)),
                    PatternPart::Wildcard => source.push_str(".*"),
                }
            }
        }
        source.push('$');
        Regex::new(&source).ok()
    }

    /// Whether a dotted field name is selected by this pattern.
    pub fn matches(&self, field: &str) -> bool {
        self.to_regex().is_some_and(|re| re.is_match(field))
    }
}
