//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatch
//! workers. All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::platforms::Platform;
use crate::resilience::RetryPolicy;

/// Root configuration for a dispatch process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Message bus connection.
    pub bus: BusConfig,

    /// Shared subjects.
    pub subjects: SubjectConfig,

    /// Retry policy applied by every connector.
    pub retries: RetryConfig,

    /// Orchestrator worker.
    pub orchestrator: OrchestratorConfig,

    /// Routing table: abstract target → destination subject.
    pub routes: Vec<RouteConfig>,

    /// Platform connectors to run in this process.
    pub connectors: Vec<ConnectorConfig>,

    /// Placeholder platform publisher.
    pub stub: StubConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup and shutdown settings.
    pub lifecycle: LifecycleConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            subjects: SubjectConfig::default(),
            retries: RetryConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            routes: default_routes(),
            connectors: default_connectors(),
            stub: StubConfig::default(),
            observability: ObservabilityConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

/// Message bus connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Server URL (e.g., "nats://localhost:4222").
    pub url: String,

    /// Client name reported to the server.
    pub client_name: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Queue group joined by every subscription, so replicas share load.
    pub queue_group: Option<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            client_name: "publish-dispatch".to_string(),
            connect_timeout_secs: 5,
            queue_group: None,
        }
    }
}

/// Well-known subjects shared by all workers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubjectConfig {
    /// Inbound subject of the orchestrator.
    pub orchestrate: String,

    /// Outbound subject for Success outcomes.
    pub success: String,

    /// Outbound subject for Failure outcomes.
    pub failed: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            orchestrate: "publish.orchestrate".to_string(),
            success: "publish.success".to_string(),
            failed: "publish.failed".to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after every retry.
    pub backoff_multiplier: f64,

    /// Upper bound on a single backoff delay in milliseconds.
    pub max_backoff_ms: Option<u64>,

    /// Limit on a single attempt in milliseconds; an overrun counts as a failure.
    pub attempt_timeout_ms: Option<u64>,

    /// Limit on the whole retry sequence in milliseconds.
    pub request_deadline_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
            max_backoff_ms: None,
            attempt_timeout_ms: None,
            request_deadline_ms: None,
        }
    }
}

impl RetryConfig {
    /// Build the runtime policy, optionally overriding the attempt bound.
    pub fn policy(&self, max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            max_attempts: max_attempts.unwrap_or(self.max_attempts),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: self.max_backoff_ms.map(Duration::from_millis),
            attempt_timeout: self.attempt_timeout_ms.map(Duration::from_millis),
            request_deadline: self.request_deadline_ms.map(Duration::from_millis),
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Run the orchestrator in this process.
    pub enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// One entry of the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Abstract target, usually a platform name.
    pub target: String,

    /// Destination subject.
    pub subject: String,
}

impl RouteConfig {
    pub fn new(target: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            subject: subject.into(),
        }
    }
}

/// Platform connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectorConfig {
    /// Platform served by this connector.
    pub platform: Platform,

    /// Inbound subject; defaults to the platform's subject.
    #[serde(default)]
    pub subject: Option<String>,

    /// Run this connector in this process.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-connector override of `retries.max_attempts`.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl ConnectorConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            subject: None,
            enabled: true,
            max_attempts: None,
        }
    }

    /// Effective inbound subject.
    pub fn subject(&self) -> String {
        self.subject
            .clone()
            .unwrap_or_else(|| self.platform.default_subject().to_string())
    }
}

fn default_enabled() -> bool {
    true
}

/// Placeholder publisher settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StubConfig {
    /// Simulated platform API latency in milliseconds.
    pub latency_ms: u64,

    /// Probability in `[0, 1]` that a simulated attempt fails.
    pub failure_rate: f64,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            latency_ms: 200,
            failure_rate: 0.0,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time allowed for in-flight requests to settle after shutdown, in seconds.
    pub drain_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 10,
        }
    }
}

impl LifecycleConfig {
    /// Extra time the process waits past the drain timeout before giving up on workers.
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Upper bound on the whole shutdown sequence.
    pub fn shutdown_limit(&self) -> Duration {
        self.drain_timeout().saturating_add(Self::SHUTDOWN_GRACE)
    }
}

/// Production routing table.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("twitter", "publish.twitter"),
        RouteConfig::new("linkedin", "publish.linkedin"),
        RouteConfig::new("facebook", "publish.meta"),
        RouteConfig::new("instagram", "publish.meta"),
        RouteConfig::new("tiktok", "publish.tiktok"),
        RouteConfig::new("youtube", "publish.youtube"),
        RouteConfig::new("pinterest", "publish.pinterest"),
        RouteConfig::new("buffer", "publish.buffer"),
        RouteConfig::new("hootsuite", "publish.buffer"),
    ]
}

/// One connector per supported platform.
pub fn default_connectors() -> Vec<ConnectorConfig> {
    Platform::ALL.iter().copied().map(ConnectorConfig::new).collect()
}
