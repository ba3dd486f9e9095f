//! Pipeline error taxonomy and response mapping.
//!
//! # Responsibilities
//! - Classify pipeline failures into response status classes
//! - Carry the embedded fallback page served when even the registry is
//!   unreachable
//!
//! # Design Decisions
//! - Fetch failures are fatal for the triggering request only; the stale
//!   cache shields every other request
//! - Every fatal error funnels into one fallback rendering path

use axum::http::StatusCode;

use crate::guards::GuardError;
use crate::registry::client::FetchError;
use crate::registry::template::TemplateError;

/// Served when the per-domain error template cannot be produced.
pub const FALLBACK_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Service unavailable</title></head>\n<body><h1>Something went wrong</h1><p>Please try again in a moment.</p></body>\n</html>\n";

/// A failure while preparing or serving one request.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("registry fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("no route matched {path:?} and no 404 route is configured")]
    RouteNotFound { path: String },

    #[error("guard chain failed: {0}")]
    Guard(#[from] GuardError),

    #[error("composition engine request failed: {0}")]
    Engine(#[from] reqwest::Error),
}

impl PipelineError {
    /// Response status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Fetch(FetchError::NotFound { .. }) => StatusCode::NOT_FOUND,
            PipelineError::Fetch(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Template(TemplateError::Fetch(FetchError::NotFound { .. })) => {
                StatusCode::NOT_FOUND
            }
            PipelineError::Template(TemplateError::InvalidName(_)) => StatusCode::NOT_FOUND,
            PipelineError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::Guard(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Engine(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for request metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch_error",
            PipelineError::Template(_) => "template_error",
            PipelineError::RouteNotFound { .. } => "route_not_found",
            PipelineError::Guard(_) => "guard_error",
            PipelineError::Engine(_) => "engine_error",
        }
    }
}
