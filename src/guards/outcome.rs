//! Guard hook outcomes.

use serde::{Deserialize, Serialize};

/// What a guard hook decided about the current navigation.
///
/// A closed set, matched exhaustively; hooks cannot invent new outcome
/// kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GuardOutcome {
    /// Let the navigation proceed to the next hook.
    Continue,

    /// Stop client-side navigation; server-side this advances the chain
    /// like `Continue`.
    StopNavigation,

    /// Redirect the request.
    #[serde(rename_all = "camelCase")]
    Redirect {
        /// Target location.
        new_location: String,
        /// Redirect status; defaults to 302 when omitted.
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let outcome: GuardOutcome = serde_json::from_str(r#"{"type":"continue"}"#).unwrap();
        assert_eq!(outcome, GuardOutcome::Continue);

        let outcome: GuardOutcome =
            serde_json::from_str(r#"{"type":"redirect","newLocation":"/login"}"#).unwrap();
        assert_eq!(
            outcome,
            GuardOutcome::Redirect {
                new_location: "/login".to_string(),
                code: None
            }
        );
    }
}
