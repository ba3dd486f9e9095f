//! Content digests over canonical JSON.
//!
//! # Design Decisions
//! - The version id is a pure function of persisted content, computed at
//!   read time; it is never stored, so stored and computed versions
//!   cannot drift
//! - Canonicalization re-sorts every object level by key before hashing

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex SHA-256 over the stably key-ordered serialization of `payload`.
pub fn content_digest(payload: &Value) -> String {
    let canonical = canonicalize(payload);
    let serialized =
        serde_json::to_vec(&canonical).unwrap_or_else(|_| canonical.to_string().into_bytes());
    hex::encode(Sha256::digest(&serialized))
}

/// Version id exposed to API clients: surrogate id plus content digest.
///
/// Changes if and only if the persisted content changes.
pub fn version_id(surrogate_id: i64, payload: &Value) -> String {
    format!("{surrogate_id}.{}", content_digest(payload))
}

/// Rebuild a value with every object's keys in sorted order.
///
/// Explicit so the digest never depends on the serializer's map ordering;
/// two payloads differing only in key order must hash identically.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_ignores_key_order() {
        let a = json!({"name": "news", "spaBundle": "a.js", "props": {"x": 1, "y": 2}});
        let b = json!({"props": {"y": 2, "x": 1}, "spaBundle": "a.js", "name": "news"});
        assert_eq!(content_digest(&a), content_digest(&b));
    }

    #[test]
    fn test_digest_changes_with_content() {
        let a = json!({"name": "news"});
        let b = json!({"name": "news", "kind": "primary"});
        assert_ne!(content_digest(&a), content_digest(&b));
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = json!({"deps": ["react", "vue"]});
        let b = json!({"deps": ["vue", "react"]});
        assert_ne!(content_digest(&a), content_digest(&b));
    }

    #[test]
    fn test_version_id_prefixes_surrogate() {
        let payload = json!({"name": "news"});
        let id = version_id(42, &payload);
        let (surrogate, digest) = id.split_once('.').unwrap();
        assert_eq!(surrogate, "42");
        assert_eq!(digest, content_digest(&payload));
    }
}
