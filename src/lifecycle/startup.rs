//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the Router, executors and workers from validated configuration
//! - Spawn each enabled worker with its own shutdown signal
//! - Report each worker's health once it is launched
//!
//! # Design Decisions
//! - Fail fast: a configuration that runs no worker is an error
//! - Workers are independent tasks; one failing does not stop the others

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::bus::MessageBus;
use crate::config::DispatchConfig;
use crate::dispatch::{Connector, HealthStatus, Orchestrator, WorkerError};
use crate::lifecycle::Shutdown;
use crate::platforms::PlatformPublisher;
use crate::resilience::OutcomeSubjects;
use crate::routing::Router;

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Bus(#[from] crate::bus::BusError),
    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("invalid metrics address `{address}`: {source}")]
    MetricsAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("configuration enables no workers")]
    NoWorkers,
}

/// Build every worker the configuration enables, without starting them.
pub fn build_workers(
    config: &DispatchConfig,
    bus: Arc<dyn MessageBus>,
    publisher: Arc<dyn PlatformPublisher>,
) -> (Option<Orchestrator>, Vec<Connector>) {
    let drain_timeout = config.lifecycle.drain_timeout();
    let queue_group = config.bus.queue_group.clone();

    let orchestrator = config.orchestrator.enabled.then(|| {
        let router = Arc::new(Router::from_config(&config.routes));
        Orchestrator::new(bus.clone(), router, config.subjects.orchestrate.clone())
            .with_queue_group(queue_group.clone())
            .with_drain_timeout(drain_timeout)
    });

    let subjects = OutcomeSubjects::new(
        config.subjects.success.clone(),
        config.subjects.failed.clone(),
    );
    let connectors = config
        .connectors
        .iter()
        .filter(|c| c.enabled)
        .map(|c| {
            Connector::new(
                c.platform,
                bus.clone(),
                publisher.clone(),
                config.retries.policy(c.max_attempts),
                subjects.clone(),
            )
            .with_subject(c.subject())
            .with_queue_group(queue_group.clone())
            .with_drain_timeout(drain_timeout)
        })
        .collect();

    (orchestrator, connectors)
}

/// Handles of the launched workers.
#[derive(Debug)]
pub struct RunningWorkers {
    handles: Vec<(String, JoinHandle<Result<(), WorkerError>>)>,
    health: Vec<HealthStatus>,
}

impl RunningWorkers {
    pub fn health(&self) -> &[HealthStatus] {
        &self.health
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to stop, logging any that failed.
    pub async fn join(self) {
        for (service, handle) in self.handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(worker = %service, error = %e, "Worker failed"),
                Err(e) => tracing::error!(worker = %service, error = %e, "Worker task panicked"),
            }
        }
    }
}

/// Build and spawn every enabled worker.
pub fn spawn_workers(
    config: &DispatchConfig,
    bus: Arc<dyn MessageBus>,
    publisher: Arc<dyn PlatformPublisher>,
    shutdown: &Shutdown,
) -> Result<RunningWorkers, StartupError> {
    let (orchestrator, connectors) = build_workers(config, bus, publisher);
    if orchestrator.is_none() && connectors.is_empty() {
        return Err(StartupError::NoWorkers);
    }

    let mut running = RunningWorkers {
        handles: Vec::with_capacity(connectors.len() + 1),
        health: Vec::with_capacity(connectors.len() + 1),
    };

    if let Some(orchestrator) = orchestrator {
        let health = orchestrator.health();
        let handle = tokio::spawn(orchestrator.run(shutdown.subscribe()));
        running.handles.push((health.service.clone(), handle));
        running.health.push(health);
    }

    for connector in connectors {
        let health = connector.health();
        let handle = tokio::spawn(connector.run(shutdown.subscribe()));
        running.handles.push((health.service.clone(), handle));
        running.health.push(health);
    }

    for health in &running.health {
        tracing::info!(service = %health.service, status = health.status, "Worker launched");
    }

    Ok(running)
}
