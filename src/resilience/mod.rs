//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Work unit for one request:
//!     → executor.rs (attempt state machine, cancellation, outcome publishing)
//!     → timeouts.rs (optional per-attempt limit)
//!     → On failure: retries.rs + backoff.rs (bounded attempts, exponential delay)
//!     → Terminal: exactly one Success or Failure on the outcome subjects
//! ```
//!
//! # Design Decisions
//! - Every failure is treated as transient and retried until the bound
//! - Shutdown and the request deadline end the loop with a Failure, never silently
//! - Executors are cheap to clone and share no per-request state

pub mod backoff;
pub mod executor;
pub mod retries;
pub mod timeouts;

pub use backoff::calculate_backoff;
pub use executor::{AttemptState, OutcomeSubjects, ResilientExecutor};
pub use retries::RetryPolicy;
pub use timeouts::{with_timeout, AttemptError};
