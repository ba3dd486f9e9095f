//! Local configuration overrides.
//!
//! A developer can carry a partial configuration fragment in a request
//! cookie to preview unpublished app/route changes against production-like
//! traffic without touching the shared registry.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → cookie.rs (find cookie, base64 + JSON decode; malformed = absent)
//!     → trust.rs (request origin vs configured allow-list)
//!     → merge.rs (deep-merge fragment onto the resolved config)
//!     → Return: (config, override_active flag)
//! ```
//!
//! # Design Decisions
//! - An untrusted origin discards the fragment entirely; the request
//!   proceeds on the unmodified config
//! - The override-active flag only signals telemetry exclusion; it never
//!   changes pipeline behavior beyond the merged config

pub mod cookie;
pub mod merge;
pub mod trust;

pub use cookie::{cookie_value, parse_fragment, OverrideFragment, LOCALE_COOKIE, OVERRIDE_COOKIE};
pub use trust::TrustedOrigins;

use crate::registry::schema::ResolvedConfig;

/// Resolve an override fragment against the trust policy and merge it.
///
/// Returns the (possibly merged) config and whether an override is active.
pub fn resolve(
    config: ResolvedConfig,
    cookie_header: Option<&str>,
    request_origin: &str,
    trusted: Option<&TrustedOrigins>,
) -> (ResolvedConfig, bool) {
    let Some(fragment) = cookie_header.and_then(parse_fragment) else {
        return (config, false);
    };

    let trusted_origin = trusted
        .map(|t| t.is_trusted(request_origin))
        .unwrap_or(false);
    if !trusted_origin {
        tracing::warn!(
            origin = %request_origin,
            "override cookie from untrusted origin discarded"
        );
        return (config, false);
    }

    (merge::apply(config, fragment), true)
}
