//! Composition engine upstream.
//!
//! # Responsibilities
//! - Forward prepared requests to the external composition engine
//! - Attach the `x-request-host` / `x-request-uri` forwarding headers
//!
//! # Design Decisions
//! - The engine is behind a trait so the pipeline can be exercised
//!   against an in-process fake

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;

use crate::http::pipeline::RequestFacts;

/// Forwarding headers consumed by the engine.
pub const HEADER_REQUEST_HOST: &str = "x-request-host";
pub const HEADER_REQUEST_URI: &str = "x-request-uri";

/// The engine's response, as relayed to the client.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// The external composition engine the gateway forwards to.
#[async_trait]
pub trait CompositionEngine: Send + Sync {
    /// Compose the page for a prepared request.
    async fn compose(&self, facts: &RequestFacts) -> Result<EngineResponse, reqwest::Error>;
}

/// HTTP upstream implementation.
pub struct UpstreamEngine {
    http: reqwest::Client,
    base_url: url::Url,
}

impl UpstreamEngine {
    pub fn new(base_url: url::Url, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl CompositionEngine for UpstreamEngine {
    async fn compose(&self, facts: &RequestFacts) -> Result<EngineResponse, reqwest::Error> {
        let mut url = self.base_url.clone();
        url.set_path(&facts.path);
        url.set_query(facts.query.as_deref());

        let response = self
            .http
            .get(url)
            .header(HEADER_REQUEST_HOST, &facts.host)
            .header(HEADER_REQUEST_URI, facts.uri())
            .send()
            .await?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.bytes().await?;

        Ok(EngineResponse {
            status,
            content_type,
            body,
        })
    }
}
