//! Route pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns into exact or wildcard forms
//! - Match normalized paths against a pattern
//! - Expose wildcard specificity for precedence decisions
//!
//! # Design Decisions
//! - Patterns are exact literals or a single trailing `*` wildcard
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches the path exactly.
    Exact(String),
    /// Matches any path starting with the prefix (`/foo/*` → prefix `/foo/`).
    Wildcard(String),
}

impl RoutePattern {
    /// Parse a pattern string.
    ///
    /// A trailing `*` marks a wildcard; everything before it is the prefix.
    /// `*` alone matches every path.
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix('*') {
            Some(prefix) => Self::Wildcard(prefix.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    /// Returns true if the path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(literal) => path == literal,
            Self::Wildcard(prefix) => path.starts_with(prefix.as_str()),
        }
    }

    /// Specificity for wildcard tie-breaking: longer prefixes win.
    ///
    /// Exact patterns always outrank wildcards; this value only orders
    /// wildcards among themselves.
    pub fn specificity(&self) -> usize {
        match self {
            Self::Exact(literal) => literal.len(),
            Self::Wildcard(prefix) => prefix.len(),
        }
    }

    /// Whether this pattern is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let pattern = RoutePattern::parse("/news");
        assert!(pattern.matches("/news"));
        assert!(!pattern.matches("/news/"));
        assert!(!pattern.matches("/newsroom"));
    }

    #[test]
    fn test_wildcard_match() {
        let pattern = RoutePattern::parse("/news/*");
        assert!(pattern.matches("/news/"));
        assert!(pattern.matches("/news/2024/review"));
        assert!(!pattern.matches("/news"));
    }

    #[test]
    fn test_catch_all() {
        let pattern = RoutePattern::parse("*");
        assert!(pattern.is_wildcard());
        assert!(pattern.matches("/"));
        assert!(pattern.matches("/anything/at/all"));
    }

    #[test]
    fn test_specificity_orders_wildcards() {
        let broad = RoutePattern::parse("/news/*");
        let narrow = RoutePattern::parse("/news/archive/*");
        assert!(narrow.specificity() > broad.specificity());
    }
}
