//! Message bus subsystem.
//!
//! # Data Flow
//! ```text
//! Worker
//!     → MessageBus::subscribe(subject) → Subscription (stream of Message)
//!     → MessageBus::publish(Message)
//!
//! Implementations:
//!     nats.rs   → async-nats client (production)
//!     memory.rs → in-process fan-out (tests, local runs)
//! ```
//!
//! # Design Decisions
//! - Subjects are plain strings agreed out-of-band
//! - At-least-once delivery; consumers tolerate duplicates
//! - The correlation id travels as a message header so payloads stay untouched
//! - The bus handle is passed explicitly to every component, never global

pub mod memory;
pub mod nats;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

pub use memory::InMemoryBus;
pub use nats::NatsBus;

/// Header carrying the correlation id alongside a payload.
pub const REQUEST_ID_HEADER: &str = "Request-Id";

/// A message travelling over the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Subject the message was published on.
    pub subject: String,
    /// Raw message body.
    pub payload: Bytes,
    /// Correlation id from the `Request-Id` header, if present.
    pub request_id: Option<String>,
}

impl Message {
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
            request_id: None,
        }
    }

    /// Attach a correlation id header.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Stream of messages delivered on one subject.
pub type Subscription = BoxStream<'static, Message>;

/// Errors raised by bus implementations.
#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error(transparent)]
    Connect(#[from] async_nats::ConnectError),
    #[error(transparent)]
    Publish(#[from] async_nats::PublishError),
    #[error(transparent)]
    Subscribe(#[from] async_nats::SubscribeError),
    #[error(transparent)]
    Flush(#[from] async_nats::client::FlushError),
    #[error("failed to encode message body: {0}")]
    Encode(#[from] serde_json::Error),
    /// The bus was shut down or its internal state is unusable.
    #[error("message bus closed: {0}")]
    Closed(String),
}

/// Publish/subscribe transport shared by every worker.
#[async_trait]
pub trait MessageBus: Send + Sync + std::fmt::Debug {
    /// Publish a message on its subject.
    async fn publish(&self, message: Message) -> Result<(), BusError>;

    /// Subscribe to a subject. With a queue group, each message is delivered
    /// to only one member of the group.
    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<Subscription, BusError>;

    /// Flush buffered outbound messages.
    async fn flush(&self) -> Result<(), BusError>;
}
