use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::Value;

use publish_dispatch::bus::{Message, MessageBus, NatsBus};
use publish_dispatch::codec;
use publish_dispatch::config::{load_or_default, BusConfig};
use publish_dispatch::platforms::Platform;
use publish_dispatch::routing::Router;

#[derive(Parser)]
#[command(name = "dispatch-cli")]
#[command(about = "Operator CLI for the publish dispatch bus", long_about = None)]
struct Cli {
    #[arg(short, long, env = "NATS_URL", default_value = "nats://localhost:4222")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a request envelope to the orchestrator
    Orchestrate {
        #[arg(short, long)]
        target: String,
        /// Generated (UUID v4) when omitted
        #[arg(short, long)]
        request_id: Option<String>,
        /// Platform payload as a JSON object
        #[arg(short, long)]
        payload: String,
        #[arg(long, default_value = "publish.orchestrate")]
        subject: String,
    },
    /// Publish a platform request directly to a connector
    Publish {
        #[arg(long)]
        platform: Platform,
        /// Full platform request as a JSON object
        #[arg(short, long)]
        payload: String,
    },
    /// Print outcomes as they arrive
    Watch {
        #[arg(long, default_value = "publish.success")]
        success: String,
        #[arg(long, default_value = "publish.failed")]
        failed: String,
    },
    /// Print the resolved routing table
    Routes {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Orchestrate {
            target,
            request_id,
            payload,
            subject,
        } => {
            let payload: Value = serde_json::from_str(&payload)?;
            if !payload.is_object() {
                return Err("payload must be a JSON object".into());
            }
            let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let envelope = serde_json::json!({
                "request_id": request_id,
                "target": target,
                "payload": payload,
            });

            let bus = connect(&cli.url).await?;
            bus.publish(Message::new(subject.as_str(), codec::encode(&envelope)?))
                .await?;
            bus.flush().await?;
            println!("{request_id}");
        }
        Commands::Publish { platform, payload } => {
            // Fail locally on a shape the connector would reject.
            let request = platform.decode(payload.as_bytes())?;

            let bus = connect(&cli.url).await?;
            bus.publish(
                Message::new(platform.default_subject(), payload.into_bytes())
                    .with_request_id(request.request_id.as_str()),
            )
            .await?;
            bus.flush().await?;
            println!("{}", request.request_id);
        }
        Commands::Watch { success, failed } => {
            let bus = connect(&cli.url).await?;
            let successes = bus.subscribe(&success, None).await?;
            let failures = bus.subscribe(&failed, None).await?;
            let mut outcomes = futures_util::stream::select(successes, failures);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    next = outcomes.next() => match next {
                        Some(message) => print_outcome(&message),
                        None => break,
                    },
                }
            }
        }
        Commands::Routes { config } => {
            let config = load_or_default(config.as_deref())?;
            let router = Router::from_config(&config.routes);
            for (target, subject) in router.routes() {
                println!("{target:<12} -> {subject}");
            }
        }
    }

    Ok(())
}

async fn connect(url: &str) -> Result<NatsBus, Box<dyn std::error::Error>> {
    let config = BusConfig {
        url: url.to_string(),
        client_name: "dispatch-cli".to_string(),
        ..BusConfig::default()
    };
    Ok(NatsBus::connect(&config).await?)
}

fn print_outcome(message: &Message) {
    match serde_json::from_slice::<Value>(&message.payload) {
        Ok(value) => println!("[{}] {}", message.subject, value),
        Err(_) => println!(
            "[{}] {}",
            message.subject,
            String::from_utf8_lossy(&message.payload)
        ),
    }
}
