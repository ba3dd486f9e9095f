//! Trusted-origin policy for local overrides.
//!
//! # Responsibilities
//! - Deserialize the registry's trust setting (string or list of strings)
//! - Decide whether a request origin may carry an override cookie
//!
//! # Design Decisions
//! - Origins compare as exact strings; the literal "all" trusts any origin
//! - No pattern matching: trust is explicit or absent

use serde::{Deserialize, Serialize};

/// Wildcard value trusting every origin.
const TRUST_ALL: &str = "all";

/// Origins trusted to carry a local override cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TrustedOrigins {
    /// A single exact origin, or the literal "all".
    One(String),
    /// A list of exact origins; may contain the literal "all".
    Many(Vec<String>),
}

impl TrustedOrigins {
    /// Returns true if the origin is trusted under this policy.
    pub fn is_trusted(&self, origin: &str) -> bool {
        match self {
            Self::One(entry) => entry == TRUST_ALL || entry == origin,
            Self::Many(entries) => entries
                .iter()
                .any(|entry| entry == TRUST_ALL || entry == origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let policy = TrustedOrigins::One("https://dev.example.com".to_string());
        assert!(policy.is_trusted("https://dev.example.com"));
        assert!(!policy.is_trusted("https://dev.example.com.evil.com"));
        assert!(!policy.is_trusted("dev.example.com"));
    }

    #[test]
    fn test_wildcard_trusts_everything() {
        let policy = TrustedOrigins::One(TRUST_ALL.to_string());
        assert!(policy.is_trusted("https://anywhere.example"));
    }

    #[test]
    fn test_list_membership() {
        let policy = TrustedOrigins::Many(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ]);
        assert!(policy.is_trusted("https://b.example"));
        assert!(!policy.is_trusted("https://c.example"));
    }

    #[test]
    fn test_deserializes_both_shapes() {
        let one: TrustedOrigins = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(one, TrustedOrigins::One("all".to_string()));

        let many: TrustedOrigins = serde_json::from_str(r#"["https://a.example"]"#).unwrap();
        assert!(many.is_trusted("https://a.example"));
    }
}
