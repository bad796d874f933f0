// crates/sentinel-bus/tests/bus.rs
// Integration tests for `MessageBus` durability, ordering, and fan-out.

use sentinel_config::BusConfig;
use sentinel_core::CorrelationId;
use sentinel_bus::MessageBus;
use tokio_stream::StreamExt;

fn open_bus(dir: &tempfile::TempDir) -> MessageBus {
    let config = BusConfig::default();
    MessageBus::open(&dir.path().join("bus.db"), &config, 2).expect("bus opens")
}

#[tokio::test]
async fn backlog_drains_in_priority_then_age_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = open_bus(&dir);

    bus.publish("telemetry_stream", serde_json::json!({"n": 1}), 0, None).await.expect("publish 1");
    bus.publish("telemetry_stream", serde_json::json!({"n": 2}), 10, None).await.expect("publish 2");
    bus.publish("telemetry_stream", serde_json::json!({"n": 3}), 5, None).await.expect("publish 3");

    let mut subscription = bus.subscribe("telemetry_stream", None).await.expect("subscribe succeeds");
    let first = subscription.next().await.expect("first message");
    let second = subscription.next().await.expect("second message");
    let third = subscription.next().await.expect("third message");

    assert_eq!(first.payload, serde_json::json!({"n": 2}));
    assert_eq!(second.payload, serde_json::json!({"n": 3}));
    assert_eq!(third.payload, serde_json::json!({"n": 1}));
}

#[tokio::test]
async fn live_publish_reaches_an_existing_subscriber() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = open_bus(&dir);

    let mut subscription = bus.subscribe("execution_queue", None).await.expect("subscribe succeeds");
    bus.publish("execution_queue", serde_json::json!({"task": "build"}), 0, None).await.expect("publish succeeds");

    let received = subscription.next().await.expect("message delivered live");
    assert_eq!(received.payload, serde_json::json!({"task": "build"}));
}

#[tokio::test]
async fn ack_is_idempotent_and_marks_processed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = open_bus(&dir);

    let id = bus.publish("queue", serde_json::json!({}), 0, None).await.expect("publish succeeds");
    assert_eq!(bus.get_pending_count("queue").await.expect("count succeeds"), 1);

    bus.ack(id).await.expect("first ack succeeds");
    bus.ack(id).await.expect("second ack is a no-op, not an error");

    assert_eq!(bus.get_pending_count("queue").await.expect("count succeeds"), 0);
}

#[tokio::test]
async fn acked_messages_are_not_redelivered_to_new_subscribers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = open_bus(&dir);

    let id = bus.publish("queue", serde_json::json!({}), 0, None).await.expect("publish succeeds");
    bus.ack(id).await.expect("ack succeeds");

    let mut subscription = bus.subscribe("queue", None).await.expect("subscribe succeeds");
    let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), subscription.next()).await;
    assert!(timed_out.is_err(), "acked message must not be redelivered");
}

#[tokio::test]
async fn correlation_lookup_spans_queues_in_creation_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = open_bus(&dir);
    let correlation = CorrelationId::new("wf-42");

    bus.publish("improvement_queue", serde_json::json!({"step": 1}), 0, Some(correlation.clone()))
        .await
        .expect("publish 1");
    bus.publish("execution_queue", serde_json::json!({"step": 2}), 0, Some(correlation.clone()))
        .await
        .expect("publish 2");

    let rows = bus.get_by_correlation(&correlation).await.expect("lookup succeeds");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].payload, serde_json::json!({"step": 1}));
    assert_eq!(rows[1].queue_name, "execution_queue");
}

#[tokio::test]
async fn dropping_the_last_subscriber_collapses_the_registry_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = open_bus(&dir);

    let subscription = bus.subscribe("queue", None).await.expect("subscribe succeeds");
    let stats = bus.get_stats().await.expect("stats succeed");
    assert_eq!(stats.active_subscribers.get("queue"), Some(&1));

    drop(subscription);
    let stats = bus.get_stats().await.expect("stats succeed");
    assert!(!stats.active_subscribers.contains_key("queue"));
}
