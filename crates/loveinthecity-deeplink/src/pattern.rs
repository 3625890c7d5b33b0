//! Route patterns: literal segments and `:name` parameter segments.
//!
//! A pattern matches a path only when the segment counts are equal and
//! every literal segment matches exactly; `:name` segments bind
//! positionally regardless of content. Patterns are compiled once at
//! registration and walked in registration order by the router, so
//! first-match-wins is deterministic.

use std::collections::HashMap;

/// Positional parameters bound by a pattern match.
pub type RouteParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile `pattern` into its segment list.
    pub fn compile(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(part.to_string()),
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// The literal pattern string this was compiled from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Match `path` against this pattern, binding `:name` segments.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exactly() {
        let pattern = RoutePattern::compile("/vip");
        assert!(pattern.matches("/vip").unwrap().is_empty());
        assert!(pattern.matches("/vip/extra").is_none());
        assert!(pattern.matches("/other").is_none());
    }

    #[test]
    fn param_segments_bind_positionally() {
        let pattern = RoutePattern::compile("/user/:id");
        let params = pattern.matches("/user/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        // Any content binds, including something that looks like a keyword.
        let params = pattern.matches("/user/login").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("login"));
    }

    #[test]
    fn segment_count_must_match_exactly() {
        let pattern = RoutePattern::compile("/support/:issueType/:source");
        assert!(pattern.matches("/support/vip").is_none());
        assert!(pattern.matches("/support/vip/home/extra").is_none());

        let params = pattern.matches("/support/vip/home").unwrap();
        assert_eq!(params.get("issueType").map(String::as_str), Some("vip"));
        assert_eq!(params.get("source").map(String::as_str), Some("home"));
    }

    #[test]
    fn root_pattern_matches_root_only() {
        let pattern = RoutePattern::compile("/");
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/home").is_none());
    }

    #[test]
    fn mixed_literals_and_params() {
        let pattern = RoutePattern::compile("/support/qr/:issueType");
        let params = pattern.matches("/support/qr/billing").unwrap();
        assert_eq!(params.get("issueType").map(String::as_str), Some("billing"));
        assert!(pattern.matches("/support/other/billing").is_none());
    }
}
