//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request method (ASCII case-insensitive)
//! - Match the request path against a compiled pattern
//! - Capture named `{segment}` values for the data plane
//!
//! # Design Decisions
//! - A placeholder always spans one whole, non-empty path segment
//! - Literal segments are compared exactly (case-sensitive, no slash folding)
//! - The path is split on `/` first and each segment percent-decoded after,
//!   so an encoded `%2F` stays inside its segment
//! - No regex, matching is a single pass over the segments

use std::borrow::Cow;
use std::collections::HashMap;

use axum::http::Method;
use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Values bound to the named segments of a matched pattern.
pub type Matches = HashMap<String, String>;

/// Errors raised while compiling a pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern {0:?} must start with '/'")]
    MissingLeadingSlash(String),

    #[error("malformed segment {0:?}, placeholders must look like {{name}}")]
    MalformedSegment(String),

    #[error("placeholder {0:?} appears more than once")]
    DuplicateName(String),
}

/// Percent-decode one path segment (or a whole path). Invalid UTF-8 is
/// replaced rather than rejected.
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: String,
}

impl MethodMatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
        }
    }

    pub fn matches(&self, method: &Method) -> bool {
        self.method.eq_ignore_ascii_case(method.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Named(String),
}

/// A compiled URL template such as `/users/{id}/posts`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern, rejecting anything the matcher cannot honour.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
        };

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            if !raw.contains(['{', '}']) {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            }

            let name = raw
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
                .ok_or_else(|| PatternError::MalformedSegment(raw.to_string()))?;

            let duplicate = segments
                .iter()
                .any(|s| matches!(s, Segment::Named(existing) if existing == name));
            if duplicate {
                return Err(PatternError::DuplicateName(name.to_string()));
            }
            segments.push(Segment::Named(name.to_string()));
        }

        Ok(Self { segments })
    }

    /// Names of the placeholders, in pattern order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Named(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match `path` (without query string) and return the captured values.
    pub fn captures(&self, path: &str) -> Option<Matches> {
        let rest = path.strip_prefix('/')?;
        let mut parts = rest.split('/');
        let mut matches = Matches::new();

        for segment in &self.segments {
            let part = decode_path(parts.next()?);
            match segment {
                Segment::Literal(literal) => {
                    if *literal != part {
                        return None;
                    }
                }
                Segment::Named(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    matches.insert(name.clone(), part.into_owned());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::new("get");
        assert!(matcher.matches(&Method::GET));
        assert!(!matcher.matches(&Method::POST));

        let custom = MethodMatcher::new("FOO");
        assert!(custom.matches(&Method::from_bytes(b"FOO").unwrap()));
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = PathPattern::parse("/foo/bar").unwrap();
        assert_eq!(pattern.captures("/foo/bar"), Some(Matches::new()));
        assert!(pattern.captures("/foo/bar/").is_none());
        assert!(pattern.captures("/foo").is_none());
        assert!(pattern.captures("/FOO/bar").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.captures("/").is_some());
        assert!(pattern.captures("/foo").is_none());
    }

    #[test]
    fn test_named_segments() {
        let pattern = PathPattern::parse("/foo/{bar}/baz/{qux}").unwrap();
        let matches = pattern.captures("/foo/BAR/baz/QUX").unwrap();
        assert_eq!(matches.get("bar").map(String::as_str), Some("BAR"));
        assert_eq!(matches.get("qux").map(String::as_str), Some("QUX"));
        assert_eq!(pattern.names().collect::<Vec<_>>(), vec!["bar", "qux"]);

        // Placeholders never match an empty segment.
        assert!(pattern.captures("/foo//baz/QUX").is_none());
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let pattern = PathPattern::parse("/foo/{bar}").unwrap();
        let matches = pattern.captures("/foo/a%20b").unwrap();
        assert_eq!(matches.get("bar").map(String::as_str), Some("a b"));

        // An encoded slash is data, not a separator.
        let matches = pattern.captures("/foo/a%2Fb").unwrap();
        assert_eq!(matches.get("bar").map(String::as_str), Some("a/b"));

        let literal = PathPattern::parse("/hello world").unwrap();
        assert!(literal.captures("/hello%20world").is_some());
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            PathPattern::parse("foo").unwrap_err(),
            PatternError::MissingLeadingSlash("foo".into())
        );
        assert!(matches!(
            PathPattern::parse("/foo/{bar").unwrap_err(),
            PatternError::MalformedSegment(_)
        ));
        assert!(matches!(
            PathPattern::parse("/foo/{}").unwrap_err(),
            PatternError::MalformedSegment(_)
        ));
        assert!(matches!(
            PathPattern::parse("/x{bar}").unwrap_err(),
            PatternError::MalformedSegment(_)
        ));
        assert_eq!(
            PathPattern::parse("/{a}/{a}").unwrap_err(),
            PatternError::DuplicateName("a".into())
        );
    }
}
