//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrate request (request_id, target, payload)
//!     → router.rs (target lookup)
//!     → Return: destination subject or no route
//!
//! Route compilation (at startup):
//!     RouteConfig[]
//!     → validated by config::validation
//!     → frozen as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes loaded once at startup, immutable at runtime
//! - A miss is a defined outcome, not an error
//! - Deterministic: same target always resolves to the same subject

pub mod router;

pub use router::Router;
