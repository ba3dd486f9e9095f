//! Override cookie parsing.
//!
//! # Responsibilities
//! - Locate the override cookie in the Cookie header
//! - Decode base64(JSON) into a partial configuration fragment
//! - Treat any malformed input as "no override" (logged, never fatal)

use std::collections::HashMap;

use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

/// Cookie carrying the local override fragment.
pub const OVERRIDE_COOKIE: &str = "gateway-override";

/// Cookie carrying the locale pre-resolved by the i18n layer.
pub const LOCALE_COOKIE: &str = "lang";

/// A partial, `ResolvedConfig`-shaped fragment.
///
/// Apps and routes are kept as raw JSON so partial objects deep-merge
/// field-by-field onto the resolved entries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverrideFragment {
    /// Partial app configs keyed by app name.
    pub apps: HashMap<String, Value>,

    /// Partial routes; matched onto existing routes by `id`.
    pub routes: Vec<Value>,

    /// Shared-library replacements keyed by name.
    pub shared_libs: HashMap<String, String>,
}

impl OverrideFragment {
    /// Whether the fragment changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.routes.is_empty() && self.shared_libs.is_empty()
    }
}

/// Extract and decode the override fragment from a Cookie header value.
///
/// Returns `None` for a missing cookie, bad base64, or malformed JSON.
pub fn parse_fragment(cookie_header: &str) -> Option<OverrideFragment> {
    let raw = cookie_value(cookie_header, OVERRIDE_COOKIE)?;

    let decoded = match base64::engine::general_purpose::STANDARD.decode(raw) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(error = %error, "override cookie is not valid base64, ignoring");
            return None;
        }
    };

    match serde_json::from_slice::<OverrideFragment>(&decoded) {
        Ok(fragment) => Some(fragment),
        Err(error) => {
            tracing::warn!(error = %error, "override cookie is not valid JSON, ignoring");
            None
        }
    }
}

/// Find a cookie value in a Cookie header.
pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}
