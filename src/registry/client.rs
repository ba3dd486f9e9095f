//! HTTP client for the remote registry service.
//!
//! # Responsibilities
//! - Fetch raw configuration, rendered templates and router domains
//! - Enforce a request timeout on every call
//! - Map transport and decoding failures to one error type
//!
//! # Design Decisions
//! - No retry layer here: the stale-while-revalidate cache absorbs
//!   transient registry outages for everyone but the cold-fetch caller

use std::time::Duration;

use serde::Deserialize;

use crate::registry::schema::{RegistryConfig, RouterDomain};

/// Error type for registry fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("registry returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("registry resource not found: {url}")]
    NotFound { url: String },

    #[error("registry unreachable: {0}")]
    Connection(String),

    #[error("registry response malformed: {0}")]
    Deserialization(String),

    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),
}

/// A template as returned by the registry, before validation and rewrite.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTemplate {
    /// Rendered HTML document with slot placeholders.
    pub content: String,

    /// Stylesheet URLs referenced by the template.
    #[serde(default)]
    pub style_refs: Vec<String>,
}

/// Registry HTTP client.
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl RegistryClient {
    /// Create a client for the given registry base URL.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, FetchError> {
        let base_url = url::Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// Fetch the raw, unfiltered configuration.
    pub async fn get_config(&self) -> Result<RegistryConfig, FetchError> {
        self.get_json("api/v1/config", &[]).await
    }

    /// Fetch a rendered template for a locale and domain.
    pub async fn get_rendered_template(
        &self,
        name: &str,
        locale: &str,
        domain: &str,
    ) -> Result<RawTemplate, FetchError> {
        self.get_json(
            &format!("api/v1/template/{name}/rendered"),
            &[("locale", locale), ("domain", domain)],
        )
        .await
    }

    /// Fetch the list of domains served by the gateway.
    pub async fn get_router_domains(&self) -> Result<Vec<RouterDomain>, FetchError> {
        self.get_json("api/v1/router_domains", &[]).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let url_str = url.to_string();

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url: url_str });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url_str,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}
