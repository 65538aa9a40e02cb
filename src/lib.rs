//! Publish dispatch library.
//!
//! Routes abstract publish requests to per-platform connectors over a
//! pub/sub bus and delivers each one with bounded retries, closing every
//! request with exactly one Success or Failure event.

// Core subsystems
pub mod bus;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod platforms;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use bus::{InMemoryBus, Message, MessageBus, NatsBus};
pub use config::schema::DispatchConfig;
pub use dispatch::{Connector, Orchestrator};
pub use lifecycle::Shutdown;
pub use resilience::{ResilientExecutor, RetryPolicy};
