//! In-memory message bus for tests and local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::bus::{BusError, Message, MessageBus, Subscription};

/// In-process pub/sub bus.
///
/// - Exact subject matching, no wildcards
/// - Fan-out to every plain subscriber of a subject
/// - Queue-group subscribers share the subject round-robin, one delivery per group
/// - Every published message is also recorded for inspection
#[derive(Debug, Default)]
pub struct InMemoryBus {
    state: Mutex<BusState>,
}

#[derive(Debug, Default)]
struct BusState {
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<Message>>>,
    groups: HashMap<(String, String), QueueGroup>,
    published: Vec<Message>,
}

#[derive(Debug, Default)]
struct QueueGroup {
    members: Vec<mpsc::UnboundedSender<Message>>,
    next: usize,
}

impl QueueGroup {
    /// Hand the message to the next live member. A member whose receiver is
    /// gone is removed and the next one tried, so the group loses a message
    /// only when it has no live member left.
    fn deliver(&mut self, message: &Message) -> bool {
        while !self.members.is_empty() {
            let idx = self.next % self.members.len();
            if self.members[idx].send(message.clone()).is_ok() {
                self.next = idx.wrapping_add(1);
                return true;
            }
            self.members.remove(idx);
        }
        false
    }
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages published so far, in publish order.
    pub fn published(&self) -> Vec<Message> {
        self.state
            .lock()
            .map(|state| state.published.clone())
            .unwrap_or_default()
    }

    /// Messages published on one subject, in publish order.
    pub fn published_on(&self, subject: &str) -> Vec<Message> {
        self.published()
            .into_iter()
            .filter(|message| message.subject == subject)
            .collect()
    }

    /// Number of live subscriptions on a subject, queue groups included.
    pub fn subscriber_count(&self, subject: &str) -> usize {
        let Ok(state) = self.state.lock() else {
            return 0;
        };
        let plain = state
            .subscribers
            .get(subject)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0);
        let grouped: usize = state
            .groups
            .iter()
            .filter(|((s, _), _)| s == subject)
            .map(|(_, group)| group.members.iter().filter(|tx| !tx.is_closed()).count())
            .sum();
        plain + grouped
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, message: Message) -> Result<(), BusError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BusError::Closed("in-memory bus lock poisoned".to_string()))?;

        if let Some(subs) = state.subscribers.get_mut(&message.subject) {
            // Drop dead subscribers while publishing.
            subs.retain(|tx| tx.send(message.clone()).is_ok());
        }
        for ((subject, _), group) in state.groups.iter_mut() {
            if *subject == message.subject && !group.deliver(&message) {
                tracing::debug!(subject = %subject, "Queue group has no live member, message not delivered");
            }
        }
        state.published.push(message);
        Ok(())
    }

    async fn subscribe(
        &self,
        subject: &str,
        queue_group: Option<&str>,
    ) -> Result<Subscription, BusError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| BusError::Closed("in-memory bus lock poisoned".to_string()))?;
            match queue_group {
                Some(group) => state
                    .groups
                    .entry((subject.to_string(), group.to_string()))
                    .or_default()
                    .members
                    .push(tx),
                None => state
                    .subscribers
                    .entry(subject.to_string())
                    .or_default()
                    .push(tx),
            }
        }

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        });
        Ok(stream.boxed())
    }

    async fn flush(&self) -> Result<(), BusError> {
        Ok(())
    }
}
