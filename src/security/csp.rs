//! Content-Security-Policy assembly.
//!
//! # Responsibilities
//! - Serialize resolved CSP settings into a header name/value pair
//! - Append trusted local hosts to source directives while an override
//!   is active, so local preview bundles are not blocked
//! - Never fail the request: a build failure is reported through the
//!   notifier and the header is omitted
//!
//! # Design Decisions
//! - `strict_mode` selects the enforcing header; otherwise the policy
//!   ships as Report-Only
//! - Directives are emitted in sorted order so the header is stable
//!   across builds of the same settings

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Directives that gain trusted local hosts while an override is active.
const SOURCE_DIRECTIVES: &[&str] = &[
    "default-src",
    "script-src",
    "style-src",
    "connect-src",
    "frame-src",
    "img-src",
    "font-src",
];

/// CSP settings as delivered inside the registry configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CspSettings {
    /// Directive name to source list.
    pub directives: HashMap<String, Vec<String>>,

    /// Enforce the policy; `false` ships it as Report-Only.
    pub strict_mode: bool,

    /// Violation report endpoint, emitted as a `report-uri` directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_uri: Option<String>,
}

/// Receives CSP build failures instead of the request path.
pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Default notifier: a structured error log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ErrorNotifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::error!(target: "composition_gateway::security", message, "csp build failed");
    }
}

/// Assembles the CSP header for a request.
#[derive(Clone)]
pub struct CspBuilder {
    trusted_local_hosts: Vec<String>,
    notifier: Arc<dyn ErrorNotifier>,
}

impl Default for CspBuilder {
    fn default() -> Self {
        Self::new(Vec::new(), Arc::new(LogNotifier))
    }
}

impl CspBuilder {
    pub fn new(trusted_local_hosts: Vec<String>, notifier: Arc<dyn ErrorNotifier>) -> Self {
        Self {
            trusted_local_hosts,
            notifier,
        }
    }

    /// Build the header pair for the given settings.
    ///
    /// Returns `None` when no settings are configured, the policy is empty,
    /// or assembly fails. Failures are reported through the notifier; the
    /// caller always proceeds.
    pub fn build(
        &self,
        settings: Option<&CspSettings>,
        override_active: bool,
    ) -> Option<(HeaderName, HeaderValue)> {
        let settings = settings?;

        let policy = self.render_policy(settings, override_active);
        if policy.is_empty() {
            return None;
        }

        let name = if settings.strict_mode {
            HeaderName::from_static("content-security-policy")
        } else {
            HeaderName::from_static("content-security-policy-report-only")
        };

        match HeaderValue::from_str(&policy) {
            Ok(value) => Some((name, value)),
            Err(_) => {
                self.notifier.notify(&format!(
                    "policy contains characters invalid in a header value: {policy:?}"
                ));
                None
            }
        }
    }

    fn render_policy(&self, settings: &CspSettings, override_active: bool) -> String {
        let mut names: Vec<&String> = settings.directives.keys().collect();
        names.sort();

        let mut parts = Vec::with_capacity(names.len() + 1);
        for name in names {
            let sources = &settings.directives[name];
            let mut rendered = sources.clone();
            if override_active && SOURCE_DIRECTIVES.contains(&name.as_str()) {
                for host in &self.trusted_local_hosts {
                    if !rendered.contains(host) {
                        rendered.push(host.clone());
                    }
                }
            }
            if rendered.is_empty() {
                parts.push(name.clone());
            } else {
                parts.push(format!("{name} {}", rendered.join(" ")));
            }
        }

        if let Some(uri) = &settings.report_uri {
            parts.push(format!("report-uri {uri}"));
        }

        parts.join("; ")
    }
}
