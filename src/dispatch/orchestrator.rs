//! Orchestrator worker.
//!
//! # Responsibilities
//! - Consume request envelopes from the orchestrate subject
//! - Resolve each envelope's target through the Router
//! - Republish the payload, unchanged, on the destination subject
//!
//! # Design Decisions
//! - No retry at this layer; connectors own delivery guarantees
//! - Undecodable envelopes and route misses are dropped; they show up in logs
//!   and metrics only
//! - The envelope's request_id rides along as a message header

use std::sync::Arc;
use std::time::Duration;

use crate::bus::{BusError, Message, MessageBus};
use crate::codec::{self, OrchestrateRequest};
use crate::dispatch::worker::consume;
use crate::dispatch::{HealthStatus, WorkerError};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::Router;

pub const SERVICE_NAME: &str = "publish-orchestrator";

/// What happened to one inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Payload republished on `subject`.
    Routed { request_id: String, subject: String },
    /// No route for `target`; nothing published.
    NoRoute { request_id: String, target: String },
    /// Body was not a valid envelope; nothing published.
    Undecodable,
}

/// Routes abstract publish requests to platform subjects.
#[derive(Debug)]
pub struct Orchestrator {
    bus: Arc<dyn MessageBus>,
    router: Arc<Router>,
    subject: String,
    queue_group: Option<String>,
    drain_timeout: Duration,
}

impl Orchestrator {
    pub fn new(bus: Arc<dyn MessageBus>, router: Arc<Router>, subject: impl Into<String>) -> Self {
        Self {
            bus,
            router,
            subject: subject.into(),
            queue_group: None,
            drain_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_queue_group(mut self, group: Option<String>) -> Self {
        self.queue_group = group;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::ok(SERVICE_NAME)
    }

    /// Route one inbound message.
    ///
    /// Only a failed republish is an error; bad envelopes and misses are
    /// reported through the returned [`Dispatch`].
    pub async fn handle(&self, message: &Message) -> Result<Dispatch, BusError> {
        let request: OrchestrateRequest = match codec::decode(&message.payload) {
            Ok(request) => request,
            Err(e) => {
                metrics::record_decode_error(SERVICE_NAME);
                tracing::warn!(
                    subject = %message.subject,
                    request_id = ?codec::recover_request_id(&message.payload),
                    error = %e,
                    "Dropping undecodable envelope"
                );
                return Ok(Dispatch::Undecodable);
            }
        };

        let Some(destination) = self.router.resolve(&request.target) else {
            metrics::record_route_miss();
            tracing::debug!(
                request_id = %request.request_id,
                target = %request.target,
                "No route for target, dropping"
            );
            return Ok(Dispatch::NoRoute {
                request_id: request.request_id,
                target: request.target,
            });
        };

        let forwarded = Message::new(destination, request.payload_bytes().to_vec())
            .with_request_id(request.request_id.clone());
        self.bus.publish(forwarded).await?;

        metrics::record_routed(&request.target);
        tracing::debug!(
            request_id = %request.request_id,
            target = %request.target,
            subject = %destination,
            "Routed request"
        );

        Ok(Dispatch::Routed {
            request_id: request.request_id,
            subject: destination.to_string(),
        })
    }

    /// Consume the orchestrate subject until shutdown.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<(), WorkerError> {
        let subscription = self
            .bus
            .subscribe(&self.subject, self.queue_group.as_deref())
            .await
            .map_err(|source| WorkerError::Subscribe {
                subject: self.subject.clone(),
                source,
            })?;

        tracing::info!(
            worker = SERVICE_NAME,
            subject = %self.subject,
            routes = self.router.len(),
            queue_group = ?self.queue_group,
            "Orchestrator subscribed"
        );

        let drain_timeout = self.drain_timeout;
        let this = Arc::new(self);
        consume(SERVICE_NAME, subscription, shutdown, drain_timeout, |message| {
            let this = this.clone();
            async move {
                if let Err(e) = this.handle(&message).await {
                    tracing::error!(
                        worker = SERVICE_NAME,
                        request_id = ?message.request_id,
                        error = %e,
                        "Failed to republish request"
                    );
                }
            }
        })
        .await;

        tracing::info!(worker = SERVICE_NAME, "Orchestrator stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryBus;
    use crate::config::schema::default_routes;

    fn orchestrator(bus: Arc<InMemoryBus>) -> Orchestrator {
        let router = Arc::new(Router::from_config(&default_routes()));
        Orchestrator::new(bus, router, "publish.orchestrate")
    }

    #[tokio::test]
    async fn test_republishes_payload_verbatim() {
        let bus = Arc::new(InMemoryBus::new());
        let orch = orchestrator(bus.clone());
        let body = r#"{"request_id":"r-1","target":"facebook","payload":{"z":1,  "a":"x"}}"#;

        let dispatch = orch
            .handle(&Message::new("publish.orchestrate", body))
            .await
            .unwrap();

        assert_eq!(
            dispatch,
            Dispatch::Routed {
                request_id: "r-1".to_string(),
                subject: "publish.meta".to_string()
            }
        );
        let sent = bus.published_on("publish.meta");
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0].payload[..], br#"{"z":1,  "a":"x"}"#);
        assert_eq!(sent[0].request_id.as_deref(), Some("r-1"));
    }

    #[tokio::test]
    async fn test_unknown_target_publishes_nothing() {
        let bus = Arc::new(InMemoryBus::new());
        let orch = orchestrator(bus.clone());
        let body = r#"{"request_id":"r-2","target":"unknown-platform","payload":{}}"#;

        let dispatch = orch
            .handle(&Message::new("publish.orchestrate", body))
            .await
            .unwrap();

        assert!(matches!(dispatch, Dispatch::NoRoute { .. }));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_envelope_publishes_nothing() {
        let bus = Arc::new(InMemoryBus::new());
        let orch = orchestrator(bus.clone());

        for body in ["not json", r#"{"target":"twitter","payload":{}}"#] {
            let dispatch = orch
                .handle(&Message::new("publish.orchestrate", body))
                .await
                .unwrap();
            assert_eq!(dispatch, Dispatch::Undecodable);
        }
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn test_routing_is_case_sensitive() {
        let bus = Arc::new(InMemoryBus::new());
        let orch = orchestrator(bus.clone());
        let body = r#"{"request_id":"r-3","target":"Twitter","payload":{}}"#;

        let dispatch = orch
            .handle(&Message::new("publish.orchestrate", body))
            .await
            .unwrap();

        assert!(matches!(dispatch, Dispatch::NoRoute { .. }));
    }

    #[test]
    fn test_health() {
        let orch = orchestrator(Arc::new(InMemoryBus::new()));
        assert_eq!(orch.health(), HealthStatus::ok("publish-orchestrator"));
    }
}
