//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Workers and executors produce:
//!     → logging.rs (structured tracing events, request_id on every request line)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The bus only ever carries outcomes; misses and drops are visible here instead
//! - Metric updates are no-ops until a recorder is installed, so tests need no setup
//! - Initialization happens once, in the binary

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
