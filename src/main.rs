//! Publish dispatch workers.
//!
//! # Architecture Overview
//!
//! ```text
//!   producer ──▶ publish.orchestrate
//!                      │
//!                      ▼
//!               ┌──────────────┐   Router: target → subject
//!               │ orchestrator │──────────────────────────────┐
//!               └──────────────┘                              │
//!                                                             ▼
//!                 publish.twitter / linkedin / tiktok / pinterest / buffer
//!                                                             │
//!                                                             ▼
//!               ┌──────────────┐   ResilientExecutor: bounded retries,
//!               │  connector   │   exponential backoff, one outcome
//!               └──────┬───────┘
//!                      │
//!                      ▼
//!            publish.success | publish.failed
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use publish_dispatch::bus::{MessageBus, NatsBus};
use publish_dispatch::config::load_or_default;
use publish_dispatch::lifecycle::{spawn_workers, wait_for_signal, Shutdown, StartupError};
use publish_dispatch::observability::{init_logging, init_metrics};
use publish_dispatch::platforms::{PlatformPublisher, StubPublisher};

#[derive(Parser, Debug)]
#[command(name = "publish-dispatch")]
#[command(about = "Orchestrator and platform connectors for the publishing pipeline", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "DISPATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "publish-dispatch starting");
    tracing::info!(
        bus_url = %config.bus.url,
        routes = config.routes.len(),
        connectors = config.connectors.iter().filter(|c| c.enabled).count(),
        max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr = address.parse().map_err(|source| StartupError::MetricsAddress {
            address: address.clone(),
            source,
        })?;
        init_metrics(addr).map_err(StartupError::from)?;
    }

    let bus: Arc<dyn MessageBus> = Arc::new(
        NatsBus::connect(&config.bus)
            .await
            .map_err(StartupError::from)?,
    );
    let publisher: Arc<dyn PlatformPublisher> = Arc::new(
        StubPublisher::new(Duration::from_millis(config.stub.latency_ms))
            .with_failure_rate(config.stub.failure_rate),
    );

    let shutdown = Shutdown::new();
    let workers = spawn_workers(&config, bus.clone(), publisher, &shutdown)?;
    tracing::info!(workers = workers.len(), "All workers running");

    let signal = wait_for_signal().await;
    tracing::info!(signal, "Shutting down");
    shutdown.trigger();

    let drain_limit = config.lifecycle.shutdown_limit();
    tokio::select! {
        _ = workers.join() => {}
        signal = wait_for_signal() => {
            tracing::warn!(signal, "Second signal received, forcing exit");
        }
        _ = tokio::time::sleep(drain_limit) => {
            tracing::warn!(timeout = ?drain_limit, "Workers did not stop in time");
        }
    }

    if let Err(e) = bus.flush().await {
        tracing::error!(error = %e, "Failed to flush bus");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
