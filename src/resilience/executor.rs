//! Resilient execution of a work unit.
//!
//! # States
//! - Attempting(n): attempt `n` is running or about to run
//! - Succeeded: the work unit returned a result
//! - FailedTerminal: the last allowed attempt failed, or the loop was cancelled
//!
//! # State Transitions
//! ```text
//! Attempting(n) → Succeeded:        work unit succeeds
//! Attempting(n) → Attempting(n+1):  work unit fails, n < max_attempts (after backoff)
//! Attempting(max) → FailedTerminal: work unit fails
//! Attempting(n) → FailedTerminal:   shutdown or request deadline at a suspension point
//! ```
//!
//! # Design Decisions
//! - Exactly one outcome is published per call, whatever the path out of the loop
//! - Suspension points are the attempt itself and the backoff sleep; both honor cancellation
//! - No state is shared between concurrent calls

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::time::Instant;

use crate::bus::{BusError, Message, MessageBus};
use crate::codec::{self, Failure, Outcome};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::timeouts::with_timeout;
use crate::resilience::RetryPolicy;

/// Position of one request in the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Attempting(u32),
    Succeeded,
    FailedTerminal,
}

impl AttemptState {
    pub fn initial() -> Self {
        AttemptState::Attempting(1)
    }

    pub fn on_success(self) -> Self {
        match self {
            AttemptState::Attempting(_) => AttemptState::Succeeded,
            terminal => terminal,
        }
    }

    pub fn on_failure(self, max_attempts: u32) -> Self {
        match self {
            AttemptState::Attempting(n) if n < max_attempts => AttemptState::Attempting(n + 1),
            AttemptState::Attempting(_) => AttemptState::FailedTerminal,
            terminal => terminal,
        }
    }

    pub fn on_cancel(self) -> Self {
        match self {
            AttemptState::Attempting(_) => AttemptState::FailedTerminal,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Attempting(_))
    }
}

/// Subjects terminal outcomes are published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeSubjects {
    pub success: String,
    pub failed: String,
}

impl OutcomeSubjects {
    pub fn new(success: impl Into<String>, failed: impl Into<String>) -> Self {
        Self {
            success: success.into(),
            failed: failed.into(),
        }
    }
}

/// Runs work units under a retry policy and publishes one terminal outcome each.
#[derive(Debug, Clone)]
pub struct ResilientExecutor {
    bus: Arc<dyn MessageBus>,
    policy: RetryPolicy,
    subjects: OutcomeSubjects,
    /// Owning worker, used as a log field and metric label.
    worker: String,
}

impl ResilientExecutor {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        policy: RetryPolicy,
        subjects: OutcomeSubjects,
        worker: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            policy,
            subjects,
            worker: worker.into(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn subjects(&self) -> &OutcomeSubjects {
        &self.subjects
    }

    /// Run `work` until it succeeds, the attempt bound is reached, or the
    /// loop is cancelled, then publish the single terminal outcome.
    ///
    /// `work` receives the 1-based attempt number. The returned outcome is the
    /// one that was published; an `Err` means the publish itself failed.
    pub async fn execute<R, E, F, Fut>(
        &self,
        request_id: &str,
        mut work: F,
        shutdown: &ShutdownSignal,
    ) -> Result<Outcome<R>, BusError>
    where
        R: Serialize,
        E: fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let started = Instant::now();
        let deadline = self.policy.request_deadline.map(|limit| started + limit);
        let mut cancel = shutdown.clone();
        let mut state = AttemptState::initial();
        let mut attempt = 1;

        let outcome = loop {
            metrics::record_attempt(&self.worker);
            tracing::debug!(worker = %self.worker, request_id = %request_id, attempt, "Starting attempt");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    state = state.on_cancel();
                    break Outcome::failure(
                        request_id,
                        format!("cancelled during attempt {attempt}: worker shutting down"),
                    );
                }
                _ = deadline_elapsed(deadline) => {
                    state = state.on_cancel();
                    break Outcome::failure(
                        request_id,
                        format!("request deadline exceeded during attempt {attempt}"),
                    );
                }
                result = with_timeout(self.policy.attempt_timeout, work(attempt)) => result,
            };

            let error = match result {
                Ok(value) => {
                    state = state.on_success();
                    break Outcome::success(request_id, value);
                }
                Err(error) => error,
            };

            state = state.on_failure(self.policy.max_attempts);
            let AttemptState::Attempting(next) = state else {
                tracing::warn!(
                    worker = %self.worker,
                    request_id = %request_id,
                    attempt,
                    error = %error,
                    "Attempts exhausted"
                );
                break Outcome::failure(request_id, error.to_string());
            };

            let delay = calculate_backoff(&self.policy, attempt);
            metrics::record_retry(&self.worker);
            tracing::info!(
                worker = %self.worker,
                request_id = %request_id,
                attempt,
                delay = ?delay,
                error = %error,
                "Attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    state = state.on_cancel();
                    break Outcome::failure(
                        request_id,
                        format!("cancelled after attempt {attempt}: worker shutting down (last error: {error})"),
                    );
                }
                _ = deadline_elapsed(deadline) => {
                    state = state.on_cancel();
                    break Outcome::failure(
                        request_id,
                        format!("request deadline exceeded after attempt {attempt} (last error: {error})"),
                    );
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempt = next;
        };

        debug_assert!(state.is_terminal());
        metrics::record_outcome(&self.worker, outcome.label(), started);
        tracing::info!(
            worker = %self.worker,
            request_id = %request_id,
            outcome = outcome.label(),
            elapsed = ?started.elapsed(),
            "Request settled"
        );

        self.publish_outcome(&outcome).await?;
        Ok(outcome)
    }

    /// Publish a terminal outcome on its subject.
    ///
    /// A success whose result cannot be encoded is published as a failure, so
    /// the request still gets exactly one event.
    pub async fn publish_outcome<R: Serialize>(&self, outcome: &Outcome<R>) -> Result<(), BusError> {
        match outcome {
            Outcome::Success(success) => match codec::encode(success) {
                Ok(body) => {
                    self.send(&self.subjects.success, body, Some(&success.request_id))
                        .await
                }
                Err(e) => {
                    let failure = Failure::new(
                        success.request_id.clone(),
                        format!("failed to encode result: {e}"),
                    );
                    self.publish_failure(&failure).await
                }
            },
            Outcome::Failure(failure) => self.publish_failure(failure).await,
        }
    }

    /// Publish a failure outcome on the failure subject.
    pub async fn publish_failure(&self, failure: &Failure) -> Result<(), BusError> {
        let body = codec::encode(failure)?;
        self.send(&self.subjects.failed, body, failure.request_id.as_deref())
            .await
    }

    async fn send(&self, subject: &str, body: Vec<u8>, request_id: Option<&str>) -> Result<(), BusError> {
        let mut message = Message::new(subject, body);
        if let Some(request_id) = request_id {
            message = message.with_request_id(request_id);
        }
        self.bus.publish(message).await.inspect_err(|e| {
            metrics::record_outcome_publish_error(&self.worker);
            tracing::error!(
                worker = %self.worker,
                subject = %subject,
                request_id = ?request_id,
                error = %e,
                "Failed to publish outcome"
            );
        })
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
