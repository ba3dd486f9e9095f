//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Normalized request path
//!     → normalize.rs (trailing-slash policy, redirect-or-continue)
//!     → matcher.rs (pattern match: exact literal or prefix wildcard)
//!     → router.rs (precedence, tie-break, 404 special-role fallback)
//!     → Return: one MatchedRoute or explicit no-match
//! ```
//!
//! # Design Decisions
//! - No regex in the hot path (exact strings and prefix scans only)
//! - Deterministic: same config and path always match the same route
//! - Ties within a precedence tier break by ascending order position

pub mod matcher;
pub mod normalize;
pub mod router;

pub use matcher::RoutePattern;
pub use normalize::TrailingSlashPolicy;
pub use router::{resolve_route, MatchedRoute};
