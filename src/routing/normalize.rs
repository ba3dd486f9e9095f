//! Trailing-slash normalization.
//!
//! # Responsibilities
//! - Apply the configured trailing-slash policy to a request path
//! - Decide the redirect status when the path changed
//!
//! # Design Decisions
//! - Adding a slash redirects permanently (301), removing one redirects
//!   temporarily (302). The asymmetry is intentional and load-bearing for
//!   SEO; do not unify the codes.
//! - Paths whose final segment contains a dot are treated as static assets
//!   and never gain a trailing slash

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// What to do with trailing slashes on navigable paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrailingSlashPolicy {
    /// Leave paths untouched.
    #[default]
    DoNothing,
    /// Append a trailing slash to navigable paths.
    AddTrailingSlash,
    /// Strip the trailing slash from all paths except the root.
    RemoveTrailingSlash,
}

/// Apply the policy to a path, returning the normalized path.
///
/// The caller compares the result to the original path: a difference means
/// the request must be redirected (see [`redirect_code`]).
pub fn process(path: &str, policy: TrailingSlashPolicy) -> String {
    match policy {
        TrailingSlashPolicy::DoNothing => path.to_string(),
        TrailingSlashPolicy::AddTrailingSlash => {
            if path.ends_with('/') || is_static_asset(path) {
                path.to_string()
            } else {
                format!("{path}/")
            }
        }
        TrailingSlashPolicy::RemoveTrailingSlash => {
            if path == "/" || !path.ends_with('/') {
                path.to_string()
            } else {
                path.trim_end_matches('/').to_string()
            }
        }
    }
}

/// Redirect status for a normalization change, if the path changed at all.
pub fn redirect_code(original: &str, normalized: &str) -> Option<StatusCode> {
    if original == normalized {
        None
    } else if normalized.len() > original.len() {
        Some(StatusCode::MOVED_PERMANENTLY)
    } else {
        Some(StatusCode::FOUND)
    }
}

/// Whether the final path segment looks like a static asset.
fn is_static_asset(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}
