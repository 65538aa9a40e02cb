//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Router + executors → Orchestrator / Connectors → spawned workers
//!
//! Shutdown (shutdown.rs):
//!     Trigger → workers stop consuming → executors publish their Failure → drain → flush
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown; a second one forces exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config, observability, bus, then workers
//! - Ordered shutdown: stop consuming, drain, flush the bus
//! - Draining is bounded by `lifecycle.drain_timeout_secs`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::wait_for_signal;
pub use startup::{spawn_workers, RunningWorkers, StartupError};
