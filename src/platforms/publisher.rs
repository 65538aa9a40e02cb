//! Platform publish capability.
//!
//! # Design Decisions
//! - The connector only sees the trait; the stub stands in until real
//!   platform clients exist
//! - Every error is reported to the executor, which treats it as transient

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::platforms::{Platform, PublishRequest, Published};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("{platform} is unavailable: {reason}")]
    Unavailable { platform: Platform, reason: String },
}

/// Publishes one decoded request to its platform.
#[async_trait]
pub trait PlatformPublisher: Send + Sync + std::fmt::Debug {
    async fn publish(&self, request: &PublishRequest) -> Result<Published, PublishError>;
}

/// Placeholder publisher: waits a fixed latency, then reports a random
/// platform-shaped identifier, or a simulated outage at `failure_rate`.
#[derive(Debug, Clone)]
pub struct StubPublisher {
    latency: Duration,
    failure_rate: f64,
}

impl StubPublisher {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failure_rate: 0.0,
        }
    }

    /// Probability in `[0, 1]` that an attempt fails; out-of-range values are clamped.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }
}

impl Default for StubPublisher {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl PlatformPublisher for StubPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<Published, PublishError> {
        tokio::time::sleep(self.latency).await;

        let outage = self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate);
        if outage {
            return Err(PublishError::Unavailable {
                platform: request.platform,
                reason: "simulated outage".to_string(),
            });
        }

        let number: u32 = rand::thread_rng().gen_range(1_000_000..=9_999_999);
        let external_id = format!("{}{}", request.platform.id_prefix(), number);
        let url = request.platform.canonical_url(&external_id);

        tracing::debug!(
            platform = %request.platform,
            request_id = %request.request_id,
            external_id = %external_id,
            "Stub publish complete"
        );

        Ok(Published { external_id, url })
    }
}
