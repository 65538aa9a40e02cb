//! NATS transport.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::bus::{BusError, Message, MessageBus, Subscription, REQUEST_ID_HEADER};
use crate::config::BusConfig;

/// Message bus backed by a core NATS connection.
///
/// `async_nats::Client` is cheap to clone and internally synchronized, so
/// concurrent publishes from many tasks interleave safely.
#[derive(Debug, Clone)]
pub struct NatsBus {
    client: async_nats::Client,
}

impl NatsBus {
    /// Connect to the server described by `config`.
    pub async fn connect(config: &BusConfig) -> Result<Self, BusError> {
        let client = async_nats::ConnectOptions::new()
            .name(&config.client_name)
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(config.url.as_str())
            .await?;

        tracing::info!(url = %config.url, client_name = %config.client_name, "Connected to NATS");
        Ok(Self { client })
    }

    /// Wrap an already connected client.
    pub fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn publish(&self, message: Message) -> Result<(), BusError> {
        match message.request_id {
            Some(request_id) => {
                let mut headers = async_nats::HeaderMap::new();
                headers.insert(REQUEST_ID_HEADER, request_id.as_str());
                self.client
                    .publish_with_headers(message.subject, headers, message.payload)
                    .await?;
            }
            None => {
                self.client.publish(message.subject, message.payload).await?;
            }
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<Subscription, BusError> {
        let subscriber = match queue_group {
            Some(group) => {
                self.client
                    .queue_subscribe(subject.to_string(), group.to_string())
                    .await?
            }
            None => self.client.subscribe(subject.to_string()).await?,
        };

        Ok(subscriber.map(from_nats).boxed())
    }

    async fn flush(&self) -> Result<(), BusError> {
        self.client.flush().await?;
        Ok(())
    }
}

fn from_nats(message: async_nats::Message) -> Message {
    let request_id = message
        .headers
        .as_ref()
        .and_then(|headers| headers.get(REQUEST_ID_HEADER))
        .map(|value| value.as_str().to_string());

    Message {
        subject: message.subject.to_string(),
        payload: message.payload,
        request_id,
    }
}
