//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from
//! config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the composition gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Remote registry the gateway pulls configuration and templates from.
    pub registry: RegistrySection,

    /// Composition engine upstream.
    pub engine: EngineConfig,

    /// Security settings local to the gateway.
    pub security: SecuritySection,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Remote registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Base URL of the registry API.
    pub url: String,

    /// Registry HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Config cache time-to-live in seconds.
    pub config_ttl_secs: u64,

    /// Template cache time-to-live in seconds.
    pub template_ttl_secs: u64,

    /// Router-domains cache time-to-live in seconds.
    pub router_domains_ttl_secs: u64,

    /// Warm all caches at startup.
    pub preheat: bool,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            url: "http://localhost:4001".to_string(),
            request_timeout_secs: 10,
            config_ttl_secs: 5,
            template_ttl_secs: 30,
            router_domains_ttl_secs: 30,
            preheat: true,
        }
    }
}

impl RegistrySection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Composition engine upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL the gateway forwards composition requests to.
    pub url: String,

    /// Engine HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4002".to_string(),
            request_timeout_secs: 25,
        }
    }
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Gateway-local security settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecuritySection {
    /// Hosts appended to CSP source directives while an override is
    /// active (local development previews).
    pub trusted_local_hosts: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
