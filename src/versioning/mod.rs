//! Registry entity versioning.
//!
//! # Responsibilities
//! - Content-digest version ids over canonicalized entity payloads
//! - The `VersionedStore` mutation contract: every entity write pairs
//!   with exactly one audit append, committed together
//!
//! # Data Flow
//! ```text
//! Admin mutation
//!     → store.rs (transactional entity write + audit append)
//!     → digest.rs (version id = surrogate id + content digest, at read time)
//! ```

pub mod digest;
pub mod store;

pub use digest::{content_digest, version_id};
pub use store::{
    AuditEntry, EntityType, InMemoryVersionedStore, StoreError, VersionedEntity, VersionedStore,
};
