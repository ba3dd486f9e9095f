//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; request ID flows through all subsystems
//! - Metric updates are cheap (atomic increments)
//! - Requests carrying an active local override are excluded from latency
//!   sampling so developer previews do not skew production percentiles

pub mod logging;
pub mod metrics;
