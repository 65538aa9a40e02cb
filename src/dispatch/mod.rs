//! Dispatch workers.
//!
//! # Data Flow
//! ```text
//! publish.orchestrate
//!     → orchestrator.rs (decode envelope, resolve target, republish payload)
//!     → publish.<platform>
//!     → connector.rs (decode platform shape, publish through ResilientExecutor)
//!     → publish.success | publish.failed
//! ```
//!
//! # Design Decisions
//! - Every inbound message gets its own task; requests are never ordered
//! - Workers own a bus handle and nothing else shared except the routing table
//! - A worker stops consuming on shutdown, then drains its in-flight tasks

pub mod connector;
pub mod health;
pub mod orchestrator;
mod worker;

use crate::bus::BusError;

pub use connector::Connector;
pub use health::HealthStatus;
pub use orchestrator::{Dispatch, Orchestrator};

/// Errors that stop a worker.
#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error("failed to subscribe to `{subject}`: {source}")]
    Subscribe {
        subject: String,
        #[source]
        source: BusError,
    },
}
