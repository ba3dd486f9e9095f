//! Template validation and slot rewriting.
//!
//! # Responsibilities
//! - Validate template names against a strict identifier pattern
//! - Verify the rendered document carries a complete html/head/body shell
//! - Rewrite slot placeholders into container markup plus bootstrap markers
//!
//! # Design Decisions
//! - Placeholders use the comment form `<!-- slot: name -->` so templates
//!   stay valid HTML before rewriting
//! - The last placeholder also pushes the end-of-queue marker consumed by
//!   the client bootstrap sequence
//! - No regex: plain substring scans keep rewriting O(n)

use crate::registry::client::FetchError;

const SLOT_OPEN: &str = "<!-- slot:";
const SLOT_CLOSE: &str = "-->";
const MAX_NAME_LEN: usize = 50;

/// Errors from template resolution.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The requested name is not a valid template identifier.
    #[error("invalid template name '{0}'")]
    InvalidName(String),

    /// The rendered content is not a complete HTML document.
    #[error("template '{0}' is not a well-formed html document")]
    MalformedDocument(String),

    /// The registry fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Validate a template name: ASCII alphanumerics, `-` and `_` only.
pub fn validate_name(name: &str) -> Result<(), TemplateError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(TemplateError::InvalidName(name.to_string()))
    }
}

/// Verify the document contains `<html>…<head>…</head>…<body>…</body>…</html>`
/// in order.
pub fn ensure_document_structure(name: &str, content: &str) -> Result<(), TemplateError> {
    let lowered = content.to_lowercase();
    let mut cursor = 0usize;
    for marker in ["<html", "<head", "</head>", "<body", "</body>", "</html>"] {
        match lowered[cursor..].find(marker) {
            Some(offset) => cursor += offset + marker.len(),
            None => return Err(TemplateError::MalformedDocument(name.to_string())),
        }
    }
    Ok(())
}

/// Rewrite `<!-- slot: name -->` placeholders into slot containers and
/// bootstrap markers. The last placeholder additionally emits the
/// end-of-queue marker.
pub fn rewrite_slots(content: &str) -> String {
    let slot_count = occurrences(content);
    if slot_count == 0 {
        return content.to_string();
    }

    let mut output = String::with_capacity(content.len() + slot_count * 128);
    let mut rest = content;
    let mut emitted = 0usize;

    while let Some(start) = rest.find(SLOT_OPEN) {
        let after_open = &rest[start + SLOT_OPEN.len()..];
        let Some(end) = after_open.find(SLOT_CLOSE) else {
            break;
        };
        let name = after_open[..end].trim();

        output.push_str(&rest[..start]);
        output.push_str(&slot_container(name));
        emitted += 1;
        if emitted == slot_count {
            output.push_str(END_OF_QUEUE_MARKER);
        }

        rest = &after_open[end + SLOT_CLOSE.len()..];
    }
    output.push_str(rest);
    output
}

/// Marker appended after the final slot, telling the client bootstrap that
/// the slot queue is complete.
pub const END_OF_QUEUE_MARKER: &str =
    r#"<script>window.gatewayBootstrap.slots.push(Infinity);</script>"#;

fn slot_container(name: &str) -> String {
    format!(
        r#"<div id="gw-slot-{name}" class="gw-slot"></div><script>window.gatewayBootstrap.slots.push("{name}");</script>"#
    )
}

fn occurrences(content: &str) -> usize {
    let mut count = 0usize;
    let mut rest = content;
    while let Some(start) = rest.find(SLOT_OPEN) {
        let after_open = &rest[start + SLOT_OPEN.len()..];
        match after_open.find(SLOT_CLOSE) {
            Some(end) => {
                count += 1;
                rest = &after_open[end + SLOT_CLOSE.len()..];
            }
            None => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_validation() {
        assert!(validate_name("master").is_ok());
        assert!(validate_name("error-500_v2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("name with spaces").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_structure_check() {
        let good = "<!doctype html><html><head></head><body><main></main></body></html>";
        assert!(ensure_document_structure("master", good).is_ok());

        let missing_head = "<html><body></body></html>";
        assert!(ensure_document_structure("master", missing_head).is_err());

        let out_of_order = "<html><body></body><head></head></html>";
        assert!(ensure_document_structure("master", out_of_order).is_err());
    }

    #[test]
    fn test_slot_rewrite() {
        let content = "<body><!-- slot: navbar --><main><!-- slot: body --></main></body>";
        let rewritten = rewrite_slots(content);

        assert!(rewritten.contains(r#"<div id="gw-slot-navbar""#));
        assert!(rewritten.contains(r#"<div id="gw-slot-body""#));
        assert!(rewritten.contains(r#"slots.push("navbar")"#));
        assert!(!rewritten.contains(SLOT_OPEN));
    }

    #[test]
    fn test_only_last_slot_emits_end_marker() {
        let content = "<!-- slot: a --><!-- slot: b -->";
        let rewritten = rewrite_slots(content);

        assert_eq!(rewritten.matches("Infinity").count(), 1);
        let a = rewritten.find(r#"push("a")"#).unwrap();
        let end = rewritten.find("Infinity").unwrap();
        let b = rewritten.find(r#"push("b")"#).unwrap();
        assert!(a < b && b < end);
    }

    #[test]
    fn test_no_slots_passthrough() {
        let content = "<html><head></head><body>static</body></html>";
        assert_eq!(rewrite_slots(content), content);
    }
}
