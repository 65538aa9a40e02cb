//! End-to-end dispatch tests over the in-memory bus.

use std::sync::Arc;
use std::time::Duration;

use publish_dispatch::bus::{InMemoryBus, Message, MessageBus};
use publish_dispatch::codec::Outcome;
use publish_dispatch::lifecycle::{Shutdown, ShutdownSignal};
use publish_dispatch::platforms::{Platform, StubPublisher};
use serde_json::{json, Value};

mod common;
use common::ScriptedPublisher;

fn body(message: &Message) -> Value {
    serde_json::from_slice(&message.payload).unwrap()
}

fn tweet(request_id: &str) -> String {
    format!(r#"{{"request_id":"{request_id}","content":"launch day","credentials":{{"token":"t"}}}}"#)
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_retry_then_success() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::failing_then(2, Platform::Twitter, "tw_123"));
    let shutdown = Shutdown::new();

    let orch = tokio::spawn(common::orchestrator(bus.clone()).run(shutdown.subscribe()));
    let conn = tokio::spawn(
        common::connector(bus.clone(), Platform::Twitter, publisher.clone())
            .run(shutdown.subscribe()),
    );
    common::subscribers_ready(&bus, "publish.orchestrate").await;
    common::subscribers_ready(&bus, "publish.twitter").await;

    let payload = tweet("r-1");
    let envelope = format!(r#"{{"request_id":"r-1","target":"twitter","payload":{payload}}}"#);
    bus.publish(Message::new("publish.orchestrate", envelope))
        .await
        .unwrap();

    // envelope + republish + one outcome
    common::settle(&bus, 3).await;

    let forwarded = bus.published_on("publish.twitter");
    assert_eq!(forwarded.len(), 1);
    assert_eq!(&forwarded[0].payload[..], payload.as_bytes());

    let successes = bus.published_on("publish.success");
    assert_eq!(successes.len(), 1);
    assert_eq!(
        body(&successes[0]),
        json!({
            "request_id": "r-1",
            "external_id": "tw_123",
            "url": "https://x.com/i/web/status/tw_123"
        })
    );
    assert!(bus.published_on("publish.failed").is_empty());
    assert_eq!(publisher.calls(), 3);

    shutdown.trigger();
    orch.await.unwrap().unwrap();
    conn.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_backoff_schedule_and_single_failure() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::always_failing("503 from upstream"));
    let conn = common::connector(bus.clone(), Platform::Twitter, publisher.clone());

    let outcome = conn
        .handle(
            &Message::new("publish.twitter", tweet("r-2")),
            &ShutdownSignal::never(),
        )
        .await
        .unwrap();

    let times = publisher.call_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(500));
    assert_eq!(times[2] - times[1], Duration::from_millis(1000));

    let Outcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.request_id.as_deref(), Some("r-2"));
    assert_eq!(failure.error, "twitter is unavailable: 503 from upstream");

    // Nothing further happens once the outcome is out.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(publisher.calls(), 3);
    assert_eq!(bus.published_on("publish.failed").len(), 1);
    assert!(bus.published_on("publish.success").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_success_short_circuits_retries() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::failing_then(1, Platform::Twitter, "tw_7"));
    let conn = common::connector(bus.clone(), Platform::Twitter, publisher.clone());

    let outcome = conn
        .handle(
            &Message::new("publish.twitter", tweet("r-3")),
            &ShutdownSignal::never(),
        )
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(publisher.calls(), 2);
    assert_eq!(bus.published_on("publish.success").len(), 1);
    assert!(bus.published_on("publish.failed").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_request_id_preserved_across_hops() {
    let bus = Arc::new(InMemoryBus::new());
    let twitter = Arc::new(ScriptedPublisher::failing_then(0, Platform::Twitter, "tw_42"));
    let buffer = Arc::new(ScriptedPublisher::always_failing("quota exceeded"));
    let shutdown = Shutdown::new();

    let workers = vec![
        tokio::spawn(common::orchestrator(bus.clone()).run(shutdown.subscribe())),
        tokio::spawn(
            common::connector(bus.clone(), Platform::Twitter, twitter.clone())
                .run(shutdown.subscribe()),
        ),
        tokio::spawn(
            common::connector(bus.clone(), Platform::Buffer, buffer.clone())
                .run(shutdown.subscribe()),
        ),
    ];
    common::subscribers_ready(&bus, "publish.orchestrate").await;
    common::subscribers_ready(&bus, "publish.twitter").await;
    common::subscribers_ready(&bus, "publish.buffer").await;

    let tweet_envelope = json!({
        "request_id": "r-42",
        "target": "twitter",
        "payload": {"request_id": "r-42", "content": "hi", "credentials": {}}
    });
    let buffer_envelope = json!({
        "request_id": "r-43",
        "target": "hootsuite",
        "payload": {"request_id": "r-43", "content": "hi", "profile_id": "p-1", "credentials": {}}
    });
    for envelope in [tweet_envelope, buffer_envelope] {
        bus.publish(Message::new("publish.orchestrate", envelope.to_string()))
            .await
            .unwrap();
    }

    // two envelopes + two republishes + two outcomes
    common::settle(&bus, 6).await;

    let republished = bus.published_on("publish.twitter");
    assert_eq!(republished[0].request_id.as_deref(), Some("r-42"));
    assert_eq!(twitter.request_ids(), vec!["r-42".to_string()]);

    let successes = bus.published_on("publish.success");
    assert_eq!(successes.len(), 1);
    assert_eq!(body(&successes[0])["request_id"], "r-42");
    assert_eq!(successes[0].request_id.as_deref(), Some("r-42"));

    let failures = bus.published_on("publish.failed");
    assert_eq!(failures.len(), 1);
    assert_eq!(body(&failures[0])["request_id"], "r-43");
    assert_eq!(buffer.calls(), 3);

    shutdown.trigger();
    for worker in workers {
        worker.await.unwrap().unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_envelope_request_id_is_authoritative() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::failing_then(0, Platform::Twitter, "tw_9"));
    let shutdown = Shutdown::new();

    let workers = vec![
        tokio::spawn(common::orchestrator(bus.clone()).run(shutdown.subscribe())),
        tokio::spawn(
            common::connector(bus.clone(), Platform::Twitter, publisher.clone())
                .run(shutdown.subscribe()),
        ),
    ];
    common::subscribers_ready(&bus, "publish.orchestrate").await;
    common::subscribers_ready(&bus, "publish.twitter").await;

    // The payload's own id disagrees with the envelope's; the second payload has none.
    let envelopes = [
        json!({
            "request_id": "r-42",
            "target": "twitter",
            "payload": {"request_id": "r-99", "content": "hi", "credentials": {}}
        }),
        json!({
            "request_id": "r-43",
            "target": "twitter",
            "payload": {"content": "hi", "credentials": {}}
        }),
    ];
    for envelope in envelopes {
        bus.publish(Message::new("publish.orchestrate", envelope.to_string()))
            .await
            .unwrap();
    }

    // two envelopes + two republishes + two outcomes
    common::settle(&bus, 6).await;

    let mut seen = publisher.request_ids();
    seen.sort();
    assert_eq!(seen, vec!["r-42".to_string(), "r-43".to_string()]);

    let successes = bus.published_on("publish.success");
    assert_eq!(successes.len(), 2);
    let mut ids: Vec<(String, Option<String>)> = successes
        .iter()
        .map(|message| {
            (
                body(message)["request_id"].as_str().unwrap().to_string(),
                message.request_id.clone(),
            )
        })
        .collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            ("r-42".to_string(), Some("r-42".to_string())),
            ("r-43".to_string(), Some("r-43".to_string())),
        ]
    );
    assert!(bus.published_on("publish.failed").is_empty());

    shutdown.trigger();
    for worker in workers {
        worker.await.unwrap().unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_stub_outage_exhausts_retries() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(StubPublisher::default().with_failure_rate(1.0));
    let conn = common::connector(bus.clone(), Platform::Linkedin, publisher);

    let raw = r#"{"request_id":"r-8","content":"hi","credentials":{}}"#;
    let outcome = conn
        .handle(&Message::new("publish.linkedin", raw), &ShutdownSignal::never())
        .await
        .unwrap();

    let Outcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.error, "linkedin is unavailable: simulated outage");
    assert_eq!(bus.published_on("publish.failed").len(), 1);
    assert!(bus.published_on("publish.success").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_target_is_dropped() {
    let bus = Arc::new(InMemoryBus::new());
    let shutdown = Shutdown::new();
    let orch = tokio::spawn(common::orchestrator(bus.clone()).run(shutdown.subscribe()));
    common::subscribers_ready(&bus, "publish.orchestrate").await;

    let envelope = json!({"request_id": "r-5", "target": "unknown-platform", "payload": {}});
    bus.publish(Message::new("publish.orchestrate", envelope.to_string()))
        .await
        .unwrap();
    bus.publish(Message::new("publish.orchestrate", "{not json"))
        .await
        .unwrap();

    common::settle(&bus, 2).await;
    assert_eq!(bus.published().len(), 2);
    assert!(bus
        .published()
        .iter()
        .all(|message| message.subject == "publish.orchestrate"));

    shutdown.trigger();
    orch.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_malformed_connector_request_fails_fast() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::failing_then(0, Platform::Pinterest, "pin_1"));
    let shutdown = Shutdown::new();
    let conn = tokio::spawn(
        common::connector(bus.clone(), Platform::Pinterest, publisher.clone())
            .run(shutdown.subscribe()),
    );
    common::subscribers_ready(&bus, "publish.pinterest").await;

    let raw = r#"{"request_id":"r-6","title":"no board","credentials":{}}"#;
    bus.publish(Message::new("publish.pinterest", raw))
        .await
        .unwrap();

    common::settle(&bus, 2).await;

    let failures = bus.published_on("publish.failed");
    assert_eq!(failures.len(), 1);
    let failure = body(&failures[0]);
    assert_eq!(failure["request_id"], "r-6");
    assert_eq!(failure["raw_payload"], raw);
    assert_eq!(publisher.calls(), 0);

    shutdown.trigger();
    conn.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_mid_retry_publishes_one_failure() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::always_failing("down"));
    let shutdown = Shutdown::new();
    let conn = tokio::spawn(
        common::connector(bus.clone(), Platform::Twitter, publisher.clone())
            .run(shutdown.subscribe()),
    );
    common::subscribers_ready(&bus, "publish.twitter").await;

    bus.publish(Message::new("publish.twitter", tweet("r-7")))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.trigger();
    conn.await.unwrap().unwrap();

    assert_eq!(publisher.calls(), 1);
    let failures = bus.published_on("publish.failed");
    assert_eq!(failures.len(), 1);
    assert_eq!(body(&failures[0])["request_id"], "r-7");
    assert!(bus.published_on("publish.success").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_settle_independently() {
    let bus = Arc::new(InMemoryBus::new());
    let publisher = Arc::new(ScriptedPublisher::always_failing("down"));
    let conn = Arc::new(common::connector(
        bus.clone(),
        Platform::Twitter,
        publisher.clone(),
    ));

    let mut tasks = Vec::new();
    for i in 0..5 {
        let conn = conn.clone();
        tasks.push(tokio::spawn(async move {
            conn.handle(
                &Message::new("publish.twitter", tweet(&format!("r-{i}"))),
                &ShutdownSignal::never(),
            )
            .await
        }));
    }
    for task in tasks {
        assert!(!task.await.unwrap().unwrap().is_success());
    }

    assert_eq!(publisher.calls(), 15);
    let mut ids: Vec<String> = bus
        .published_on("publish.failed")
        .iter()
        .map(|message| body(message)["request_id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["r-0", "r-1", "r-2", "r-3", "r-4"]);
}
