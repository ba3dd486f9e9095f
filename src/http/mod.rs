//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → server.rs (Axum setup, request-id + timeout + trace layers)
//!     → pipeline.rs (domain config → overrides → normalize → route → guards → CSP)
//!     → engine.rs (forward to the composition engine upstream)
//!     → error.rs (status mapping, per-domain 500 template, embedded fallback)
//!     → Send to client
//! ```

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod server;

pub use engine::{CompositionEngine, EngineResponse, UpstreamEngine};
pub use error::PipelineError;
pub use pipeline::{ComposePlan, Decision, Pipeline, PipelineFailure, RequestFacts};
pub use server::GatewayServer;
