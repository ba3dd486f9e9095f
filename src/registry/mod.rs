//! Registry subsystem: the remote page-composition configuration source.
//!
//! # Data Flow
//! ```text
//! Incoming request (domain key)
//!     → store.rs (cached accessors, preheat latches)
//!     → cache::SwrCache (freshness decision)
//!     → client.rs (HTTP fetch from the registry service)
//!     → filter.rs (per-domain scoping of routes/apps)
//!     → template.rs (name validation, structure check, slot rewrite)
//!     → Return: ResolvedConfig / RenderedTemplate / router domains
//! ```
//!
//! # Design Decisions
//! - The raw config is cached once, unfiltered; domain scoping runs per
//!   request on the cached value (cheap, pure)
//! - Fetch failures are fatal only for the request that triggered a cold
//!   fetch; everyone else is shielded by the stale-while-revalidate cache

pub mod client;
pub mod filter;
pub mod schema;
pub mod store;
pub mod template;

pub use client::{FetchError, RegistryClient};
pub use schema::{AppConfig, RegistryConfig, RenderedTemplate, ResolvedConfig, Route, RouterDomain};
pub use store::RegistryStore;
pub use template::TemplateError;
