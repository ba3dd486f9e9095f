//! Deep merge of an override fragment onto a resolved config.
//!
//! # Responsibilities
//! - Merge partial app configs onto existing apps by name
//! - Merge partial routes onto existing routes by id, append new ones
//! - Replace shared-library entries by name
//!
//! # Design Decisions
//! - Merging goes through JSON values so partial fragments patch
//!   field-by-field without a bespoke merge per struct
//! - An entry that fails to deserialize after merging is dropped with a
//!   warning; the rest of the fragment still applies

use serde_json::Value;

use crate::overrides::cookie::OverrideFragment;
use crate::registry::schema::{AppConfig, ResolvedConfig, Route};

/// Apply a trusted override fragment to the resolved config.
pub fn apply(mut config: ResolvedConfig, fragment: OverrideFragment) -> ResolvedConfig {
    for (name, patch) in fragment.apps {
        let merged = match config.apps.get(&name) {
            Some(existing) => merge_into(existing, &patch),
            None => serde_json::from_value::<AppConfig>(patch.clone()).ok(),
        };
        match merged {
            Some(app) => {
                config.apps.insert(name, app);
            }
            None => tracing::warn!(app = %name, "override app entry malformed, skipping"),
        }
    }

    for patch in fragment.routes {
        let id = patch.get("id").and_then(Value::as_i64);
        let existing = id.and_then(|id| config.routes.iter_mut().find(|r| r.id == id));
        match existing {
            Some(route) => {
                if let Some(merged) = merge_into(route, &patch) {
                    *route = merged;
                } else {
                    tracing::warn!(route_id = ?id, "override route entry malformed, skipping");
                }
            }
            None => match serde_json::from_value::<Route>(patch) {
                Ok(route) => config.routes.push(route),
                Err(error) => {
                    tracing::warn!(error = %error, "override route entry malformed, skipping");
                }
            },
        }
    }
    config.routes.sort_by_key(|r| r.order_pos);

    config.shared_libs.extend(fragment.shared_libs);

    config
}

/// Deep-merge a JSON patch onto a serializable value and read it back.
fn merge_into<T>(existing: &T, patch: &Value) -> Option<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let mut base = serde_json::to_value(existing).ok()?;
    deep_merge(&mut base, patch);
    serde_json::from_value(base).ok()
}

/// Recursively merge `patch` onto `base`: objects merge per key,
/// everything else replaces.
fn deep_merge(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, patch_value),
                    None => {
                        base_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}
