//! Security header assembly.
//!
//! # Responsibilities
//! - Build the Content-Security-Policy header from resolved settings
//! - Report build failures through a pluggable notifier, never to the caller

pub mod csp;

pub use csp::{CspBuilder, CspSettings, ErrorNotifier, LogNotifier};
