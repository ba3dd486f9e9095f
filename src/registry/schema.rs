//! Registry configuration schema.
//!
//! This module defines the wire shape of the remote registry's responses
//! and the domain-scoped `ResolvedConfig` handed to the request pipeline.
//! All types derive Serde traits; the registry speaks camelCase JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::overrides::trust::TrustedOrigins;
use crate::routing::normalize::TrailingSlashPolicy;
use crate::security::csp::CspSettings;

/// Raw registry configuration, unfiltered (all domains).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    /// Micro-applications keyed by name.
    pub apps: HashMap<String, AppConfig>,

    /// Navigable routes, all domains mixed.
    pub routes: Vec<Route>,

    /// Role-keyed fallback routes (e.g. "404"), all domains mixed.
    pub special_routes: Vec<SpecialRoute>,

    /// Shared libraries keyed by name.
    pub shared_libs: HashMap<String, String>,

    /// Dynamically loaded libraries keyed by name.
    pub dynamic_libs: HashMap<String, Value>,

    /// Global settings (trailing slash, CSP, override trust).
    pub settings: Settings,
}

/// A micro-application registered in the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Client bundle URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spa_bundle: Option<String>,

    /// CSS bundle URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_bundle: Option<String>,

    /// Application kind (primary, essential, regular).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Server-side rendering endpoint settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssr: Option<Value>,

    /// Shared-library dependencies keyed by name.
    pub dependencies: HashMap<String, String>,

    /// Default props merged into every slot using this app.
    pub props: Value,

    /// Restricts the app to one domain; stripped from resolved output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforce_domain: Option<String>,

    /// Name of the wrapper application, when the app is wrapped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped_with: Option<String>,
}

/// A navigable route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Route {
    /// Registry surrogate id.
    pub id: i64,

    /// URL pattern: exact literal or a trailing-`*` wildcard.
    pub pattern: String,

    /// Whether matching may continue past this route (reserved).
    pub next: bool,

    /// Template rendered for this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Slot bindings keyed by slot name.
    pub slots: HashMap<String, SlotConfig>,

    /// Free-form metadata passed to guard hooks.
    pub meta: Map<String, Value>,

    /// Position used for ordering and tie-breaking.
    pub order_pos: i64,

    /// Domain this route is scoped to; `None` marks a default route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A role-keyed fallback route as stored in the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialRoute {
    /// Registry surrogate id.
    pub id: i64,

    /// Symbolic role, e.g. "404".
    pub special_role: String,

    /// Template rendered for this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Slot bindings keyed by slot name.
    pub slots: HashMap<String, SlotConfig>,

    /// Free-form metadata.
    pub meta: Map<String, Value>,

    /// Domain this route is scoped to; `None` marks a default route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// One application bound into a named template slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlotConfig {
    /// Name of the application rendered into the slot.
    pub app_name: String,

    /// Props passed to the application for this slot.
    pub props: Value,

    /// Slot-level kind override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Registry-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Trailing-slash policy applied before route matching.
    pub trailing_slash: TrailingSlashPolicy,

    /// Content-Security-Policy settings, when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csp: Option<CspSettings>,

    /// Origins trusted to carry a local override cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_trusted_origins: Option<TrustedOrigins>,
}

/// Configuration resolved for one domain: exactly one scoping policy
/// applied, either the domain-specific sets or the domain-agnostic
/// defaults, never a mix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedConfig {
    /// Applications relevant to this domain.
    pub apps: HashMap<String, AppConfig>,

    /// Navigable routes, ordered by position.
    pub routes: Vec<Route>,

    /// Fallback routes keyed by role, domain/role fields stripped.
    pub special_routes: HashMap<String, Route>,

    /// Shared libraries keyed by name.
    pub shared_libs: HashMap<String, String>,

    /// Dynamically loaded libraries keyed by name.
    pub dynamic_libs: HashMap<String, Value>,

    /// Global settings.
    pub settings: Settings,
}

/// A domain served by the gateway, as listed by the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterDomain {
    /// Domain name, e.g. "example.com".
    pub domain_name: String,

    /// Per-domain template replacing the shared "500" error template.
    #[serde(rename = "template500", skip_serializing_if = "Option::is_none")]
    pub template_500: Option<String>,

    /// Canonical domain, when this one is an alias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_domain: Option<String>,
}

/// A template after validation and slot rewriting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderedTemplate {
    /// Full HTML document with slot placeholders rewritten.
    pub content: String,

    /// Stylesheet URLs referenced by the template.
    pub style_refs: Vec<String>,
}
