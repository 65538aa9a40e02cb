//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use publish_dispatch::bus::InMemoryBus;
use publish_dispatch::config::schema::default_routes;
use publish_dispatch::dispatch::{Connector, Orchestrator};
use publish_dispatch::platforms::{
    Platform, PlatformPublisher, PublishError, PublishRequest, Published,
};
use publish_dispatch::resilience::{OutcomeSubjects, RetryPolicy};
use publish_dispatch::routing::Router;
use tokio::time::Instant;

/// Publisher that plays back a fixed script of results, then keeps
/// returning the last one. Records when each attempt started.
#[derive(Debug)]
pub struct ScriptedPublisher {
    script: Mutex<VecDeque<Result<Published, PublishError>>>,
    last: Result<Published, PublishError>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedPublisher {
    pub fn new(script: Vec<Result<Published, PublishError>>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| Err(unavailable("empty script")));
        Self {
            script: Mutex::new(script.into()),
            last,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail `failures` times, then succeed with `external_id`.
    pub fn failing_then(failures: usize, platform: Platform, external_id: &str) -> Self {
        let mut script: Vec<_> = (0..failures)
            .map(|i| Err(unavailable(&format!("attempt {} failed", i + 1))))
            .collect();
        script.push(Ok(Published {
            external_id: external_id.to_string(),
            url: platform.canonical_url(external_id),
        }));
        Self::new(script)
    }

    pub fn always_failing(reason: &str) -> Self {
        Self::new(vec![Err(unavailable(reason))])
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn request_ids(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }
}

pub fn unavailable(reason: &str) -> PublishError {
    PublishError::Unavailable {
        platform: Platform::Twitter,
        reason: reason.to_string(),
    }
}

#[async_trait]
impl PlatformPublisher for ScriptedPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<Published, PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.request_id.clone(), Instant::now()));
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.last.clone())
    }
}

pub fn subjects() -> OutcomeSubjects {
    OutcomeSubjects::new("publish.success", "publish.failed")
}

pub fn orchestrator(bus: Arc<InMemoryBus>) -> Orchestrator {
    let router = Arc::new(Router::from_config(&default_routes()));
    Orchestrator::new(bus, router, "publish.orchestrate")
}

pub fn connector(
    bus: Arc<InMemoryBus>,
    platform: Platform,
    publisher: Arc<dyn PlatformPublisher>,
) -> Connector {
    Connector::new(platform, bus, publisher, RetryPolicy::default(), subjects())
}

/// Let spawned workers run until the bus is quiet.
pub async fn settle(bus: &InMemoryBus, expected_published: usize) {
    for _ in 0..1000 {
        if bus.published().len() >= expected_published {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // Give stragglers a chance to publish something they should not.
    tokio::time::sleep(Duration::from_secs(5)).await;
}

#[allow(dead_code)]
pub async fn subscribers_ready(bus: &InMemoryBus, subject: &str) {
    for _ in 0..100 {
        if bus.subscriber_count(subject) > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("no subscriber on {subject}");
}
