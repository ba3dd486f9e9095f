//! Guard hooks: externally supplied route transition checks.
//!
//! # Data Flow
//! ```text
//! Matched route
//!     → executor.rs (sequential chain, fail-fast)
//!     → hook 0, hook 1, ... (consumer-supplied)
//!     → first Redirect outcome wins; errors abort with the hook index
//! ```
//!
//! # Design Decisions
//! - Hooks run strictly sequentially within one request; a later hook must
//!   never run once an earlier one redirected or failed
//! - Special-role routes skip the chain entirely
//! - The chain is an explicit indexed loop so the failing index is captured

pub mod executor;
pub mod outcome;

pub use executor::{GuardContext, GuardError, GuardExecutor, GuardHook, RedirectDecision};
pub use outcome::GuardOutcome;
