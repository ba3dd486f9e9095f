//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Caller asks for key
//!     → swr.rs (envelope lookup, freshness decision)
//!     → store.rs (atomic get/set of envelopes)
//!     → fresh: return data, no I/O
//!     → stale: return data, spawn one background refresh
//!     → cold:  run producer inline, store, return
//! ```
//!
//! # Design Decisions
//! - Store is an injected trait object, never a process-wide singleton,
//!   so tests run against isolated stores
//! - Envelopes are replaced whole; readers never observe a torn write
//! - A failed background refresh keeps the stale envelope forever

pub mod store;
pub mod swr;

pub use store::{CacheEnvelope, CacheStore, InMemoryCacheStore};
pub use swr::{SwrCache, SwrOptions};
