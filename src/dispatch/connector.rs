//! Generic platform connector.
//!
//! # Responsibilities
//! - Consume one platform's subject
//! - Decode the platform's request shape
//! - Publish through the platform capability under the ResilientExecutor
//!
//! # Data Flow
//! ```text
//! publish.<platform>
//!     → Platform::decode_message(payload, Request-Id header)
//!         → Err: Failure{request_id?, error, raw_payload} on the failure subject
//!         → Ok:  ResilientExecutor::execute(PlatformPublisher::publish)
//!                → Success{request_id, external_id, url} | Failure{request_id, error}
//! ```
//!
//! # Design Decisions
//! - One type serves every platform; the platform is a value
//! - A decode failure is terminal immediately; retrying cannot fix the body
//! - The `Request-Id` header set by the orchestrator is the correlation id;
//!   the body's `request_id` is only a fallback

use std::sync::Arc;
use std::time::Duration;

use crate::bus::{BusError, Message, MessageBus};
use crate::codec::{Failure, Outcome};
use crate::dispatch::worker::consume;
use crate::dispatch::{HealthStatus, WorkerError};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::platforms::{self, Platform, PlatformPublisher, Published};
use crate::resilience::{OutcomeSubjects, ResilientExecutor, RetryPolicy};

/// Delivers one platform's requests with retries.
#[derive(Debug)]
pub struct Connector {
    platform: Platform,
    subject: String,
    bus: Arc<dyn MessageBus>,
    publisher: Arc<dyn PlatformPublisher>,
    executor: ResilientExecutor,
    queue_group: Option<String>,
    drain_timeout: Duration,
}

impl Connector {
    pub fn new(
        platform: Platform,
        bus: Arc<dyn MessageBus>,
        publisher: Arc<dyn PlatformPublisher>,
        policy: RetryPolicy,
        subjects: OutcomeSubjects,
    ) -> Self {
        let executor = ResilientExecutor::new(bus.clone(), policy, subjects, platform.service_name());
        Self {
            platform,
            subject: platform.default_subject().to_string(),
            bus,
            publisher,
            executor,
            queue_group: None,
            drain_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_queue_group(mut self, group: Option<String>) -> Self {
        self.queue_group = group;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::ok(self.platform.service_name())
    }

    /// Handle one inbound message through to its terminal outcome.
    ///
    /// Returns the outcome that was published; an `Err` means the bus refused
    /// the outcome itself.
    pub async fn handle(
        &self,
        message: &Message,
        shutdown: &ShutdownSignal,
    ) -> Result<Outcome<Published>, BusError> {
        let request = match self
            .platform
            .decode_message(&message.payload, message.request_id.as_deref())
        {
            Ok(request) => request,
            Err(e) => {
                let request_id =
                    platforms::recover_request_id(&message.payload, message.request_id.as_deref());
                metrics::record_decode_error(&self.platform.service_name());
                tracing::warn!(
                    platform = %self.platform,
                    request_id = ?request_id,
                    error = %e,
                    "Rejecting undecodable request"
                );
                let failure = Failure::undecodable(request_id, e.to_string(), &message.payload);
                self.executor.publish_failure(&failure).await?;
                return Ok(Outcome::Failure(failure));
            }
        };

        let publisher = self.publisher.as_ref();
        let request = &request;
        self.executor
            .execute(
                &request.request_id,
                move |_attempt| publisher.publish(request),
                shutdown,
            )
            .await
    }

    /// Consume the platform subject until shutdown.
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<(), WorkerError> {
        let subscription = self
            .bus
            .subscribe(&self.subject, self.queue_group.as_deref())
            .await
            .map_err(|source| WorkerError::Subscribe {
                subject: self.subject.clone(),
                source,
            })?;

        let service = self.platform.service_name();
        tracing::info!(
            worker = %service,
            subject = %self.subject,
            max_attempts = self.executor.policy().max_attempts,
            queue_group = ?self.queue_group,
            "Connector subscribed"
        );

        let drain_timeout = self.drain_timeout;
        let this = Arc::new(self);
        let signal = shutdown.clone();
        consume(&service, subscription, shutdown, drain_timeout, |message| {
            let this = this.clone();
            let signal = signal.clone();
            async move {
                // Publish failures are already logged and counted by the executor.
                let _ = this.handle(&message, &signal).await;
            }
        })
        .await;

        tracing::info!(worker = %service, "Connector stopped");
        Ok(())
    }
}
