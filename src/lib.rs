//! Multi-tenant page composition gateway.
//!
//! Sits in front of an external composition engine and decides, per
//! request, which route and configuration the engine should render: it
//! caches the remote registry with stale-while-revalidate semantics,
//! filters the configuration for the request's domain, merges trusted
//! local developer overrides, normalizes trailing slashes, matches the
//! route, runs consumer-supplied guard hooks, and assembles the
//! Content-Security-Policy header.
//!
//! # Data Flow
//! ```text
//! Request
//!     → http::server (facts extraction, middleware)
//!     → registry (SWR-cached remote config, domain filtering, templates)
//!     → overrides (cookie fragment, trusted origins, deep merge)
//!     → routing (trailing-slash policy, route precedence)
//!     → guards (sequential hook chain, fail fast)
//!     → security (CSP assembly)
//!     → http::engine (forward to the composition engine)
//! ```
//!
//! The `versioning` module is the storage contract consumed by the
//! administrative API that produces the registry content.

// Core subsystems
pub mod cache;
pub mod http;
pub mod registry;
pub mod routing;

// Request decoration
pub mod guards;
pub mod overrides;
pub mod security;

// Registry authoring contract
pub mod versioning;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
