//! Per-request decision pipeline.
//!
//! # Responsibilities
//! - Resolve the domain-filtered config for the request's host
//! - Apply trusted local overrides and the trailing-slash policy
//! - Match the route, run the guard chain, assemble the CSP header
//!
//! # Data Flow
//! ```text
//! RequestFacts
//!     → RegistryStore::get_config(domain)
//!     → overrides::resolve (trust policy from resolved settings)
//!     → trailing-slash normalization (redirect and stop on change)
//!     → resolve_route → GuardExecutor::run
//!     → CspBuilder::build
//!     → Decision::{Redirect, Compose}
//! ```

use std::sync::Arc;

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};

use crate::guards::{GuardContext, GuardExecutor};
use crate::http::error::PipelineError;
use crate::overrides;
use crate::registry::schema::ResolvedConfig;
use crate::registry::store::RegistryStore;
use crate::routing::{normalize, resolve_route, MatchedRoute};
use crate::security::CspBuilder;

/// What the server extracted from the inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestFacts {
    /// Host header value, as received.
    pub host: String,
    /// Request path, percent-decoded upstream of the pipeline.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Origin the override trust check runs against.
    pub origin: String,
    /// Raw Cookie header value.
    pub cookie_header: Option<String>,
    /// Locale pre-resolved into the locale cookie by the i18n layer.
    pub locale: Option<String>,
    /// All inbound headers, handed to guard hooks.
    pub headers: HeaderMap,
}

impl RequestFacts {
    /// Domain key: host with any port stripped, lowercased.
    pub fn domain(&self) -> String {
        let host = self.host.rsplit_once(':').map_or(
            self.host.as_str(),
            |(name, port)| {
                if port.chars().all(|c| c.is_ascii_digit()) {
                    name
                } else {
                    self.host.as_str()
                }
            },
        );
        host.to_ascii_lowercase()
    }

    /// Path plus query, as forwarded to the engine and guard hooks.
    pub fn uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }
}

/// Everything the composition step needs.
pub struct ComposePlan {
    pub route: MatchedRoute,
    pub config: ResolvedConfig,
    pub csp_header: Option<(HeaderName, HeaderValue)>,
    pub override_active: bool,
}

/// Outcome of the decision pipeline.
pub enum Decision {
    /// Respond immediately with a redirect.
    Redirect {
        location: String,
        code: StatusCode,
        override_active: bool,
    },
    /// Forward to the composition engine.
    Compose(Box<ComposePlan>),
}

/// A pipeline failure, tagged with whether an override was active so the
/// telemetry exclusion also holds on the error path.
#[derive(Debug)]
pub struct PipelineFailure {
    pub error: PipelineError,
    pub override_active: bool,
}

/// The request decision pipeline, shared across all requests.
pub struct Pipeline {
    store: Arc<RegistryStore>,
    guards: GuardExecutor,
    csp: CspBuilder,
}

impl Pipeline {
    pub fn new(store: Arc<RegistryStore>, guards: GuardExecutor, csp: CspBuilder) -> Self {
        Self { store, guards, csp }
    }

    /// The store backing this pipeline.
    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Decide how to serve one request.
    pub async fn prepare(&self, facts: &RequestFacts) -> Result<Decision, PipelineFailure> {
        let domain = facts.domain();
        let config = self
            .store
            .get_config(Some(&domain))
            .await
            .map_err(|error| PipelineFailure {
                error: error.into(),
                override_active: false,
            })?;

        let trusted = config.settings.override_trusted_origins.clone();
        let (config, override_active) = overrides::resolve(
            config,
            facts.cookie_header.as_deref(),
            &facts.origin,
            trusted.as_ref(),
        );

        self.decide(facts, domain, config, override_active)
            .await
            .map_err(|error| PipelineFailure {
                error,
                override_active,
            })
    }

    /// The post-override half of the pipeline.
    async fn decide(
        &self,
        facts: &RequestFacts,
        domain: String,
        config: ResolvedConfig,
        override_active: bool,
    ) -> Result<Decision, PipelineError> {
        let policy = config.settings.trailing_slash;
        let normalized = normalize::process(&facts.path, policy);
        if normalized != facts.path {
            let code = normalize::redirect_code(&facts.path, &normalized)
                .unwrap_or(StatusCode::FOUND);
            let location = match &facts.query {
                Some(query) => format!("{normalized}?{query}"),
                None => normalized,
            };
            return Ok(Decision::Redirect {
                location,
                code,
                override_active,
            });
        }

        let route = resolve_route(&config, &facts.path).ok_or_else(|| {
            PipelineError::RouteNotFound {
                path: facts.path.clone(),
            }
        })?;

        let ctx = GuardContext {
            url: facts.uri(),
            hostname: domain,
            pattern: route.pattern.clone(),
            meta: route.meta.clone(),
            headers: facts.headers.clone(),
        };
        if let Some(decision) = self.guards.run(&route, &ctx).await? {
            return Ok(Decision::Redirect {
                location: decision.location,
                code: decision.code,
                override_active,
            });
        }

        let csp_header = self
            .csp
            .build(config.settings.csp.as_ref(), override_active);

        Ok(Decision::Compose(Box::new(ComposePlan {
            route,
            config,
            csp_header,
            override_active,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_key_strips_port_and_lowercases() {
        let facts = RequestFacts {
            host: "News.Example.COM:8080".to_string(),
            ..RequestFacts::default()
        };
        assert_eq!(facts.domain(), "news.example.com");

        let facts = RequestFacts {
            host: "example.com".to_string(),
            ..RequestFacts::default()
        };
        assert_eq!(facts.domain(), "example.com");
    }

    #[test]
    fn test_uri_preserves_query() {
        let facts = RequestFacts {
            path: "/news".to_string(),
            query: Some("page=2".to_string()),
            ..RequestFacts::default()
        };
        assert_eq!(facts.uri(), "/news?page=2");
    }
}
