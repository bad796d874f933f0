// crates/sentinel-witness/tests/witness.rs
// Integration tests for `Witness`'s end-to-end CLASSIFY/VALIDATE/ENRICH/
// SELF-VERIFY/PUBLISH/PERSIST pipeline.

use std::sync::Arc;
use std::time::Duration;

use sentinel_bus::MessageBus;
use sentinel_config::BusConfig;
use sentinel_config::StoreConfig;
use sentinel_config::WitnessConfig;
use sentinel_core::SignalSource;
use sentinel_detector::PatternDetector;
use sentinel_patterns::PatternStore;
use sentinel_store::KvStore;
use sentinel_witness::Witness;
use tokio_stream::StreamExt;

struct Harness {
    bus: Arc<MessageBus>,
    witness: Arc<Witness>,
    config: WitnessConfig,
    stop: tokio::sync::watch::Sender<bool>,
}

async fn harness(dir: &tempfile::TempDir) -> Harness {
    let bus = Arc::new(MessageBus::open(&dir.path().join("bus.db"), &BusConfig::default(), 2).expect("bus opens"));
    let store = KvStore::open(&dir.path().join("store.db"), &StoreConfig::default(), 2).expect("store opens");
    let patterns = Arc::new(PatternStore::new(store));
    let detector = Arc::new(PatternDetector::new(0.7));
    let config = WitnessConfig::default();

    let witness = Arc::new(Witness::new(Arc::clone(&bus), patterns, detector, config.clone()));
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let run_handle = Arc::clone(&witness);
    tokio::spawn(async move { run_handle.run(stop_rx).await });

    Harness { bus, witness, config, stop: stop_tx }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

#[tokio::test]
async fn a_failure_event_is_classified_enriched_and_published() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;

    harness
        .bus
        .publish(
            harness.config.telemetry_queue.clone(),
            serde_json::json!({"message": "fatal error: crash in worker", "_message_id": 42}),
            0,
            None,
        )
        .await
        .expect("publish succeeds");

    let mut output = harness.bus.subscribe(harness.config.output_queue.clone(), None).await.expect("subscribe succeeds");
    let message = tokio::time::timeout(Duration::from_secs(2), output.next())
        .await
        .expect("a signal is published before the timeout")
        .expect("the subscription stream is not closed");

    let signal: sentinel_core::Signal = serde_json::from_value(message.payload).expect("signal deserializes");
    assert_eq!(signal.source, SignalSource::Telemetry);
    assert_eq!(signal.pattern, "critical_error");
    assert!(signal.summary.starts_with("Critical Error: "));
    assert!(signal.confidence >= 0.7);

    let stats = harness.witness.get_stats();
    assert_eq!(stats.signals_published, 1);
}

#[tokio::test]
async fn an_unmatched_event_is_dropped_without_killing_the_loop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;

    harness
        .bus
        .publish(harness.config.context_queue.clone(), serde_json::json!({"message": "nothing interesting here"}), 0, None)
        .await
        .expect("publish succeeds");

    harness
        .bus
        .publish(
            harness.config.context_queue.clone(),
            serde_json::json!({"message": "the user is frustrated and wants a refund"}),
            0,
            None,
        )
        .await
        .expect("publish succeeds");

    let mut output = harness.bus.subscribe(harness.config.output_queue.clone(), None).await.expect("subscribe succeeds");
    let message = tokio::time::timeout(Duration::from_secs(2), output.next())
        .await
        .expect("the second event still produces a signal")
        .expect("the subscription stream is not closed");

    let signal: sentinel_core::Signal = serde_json::from_value(message.payload).expect("signal deserializes");
    assert_eq!(signal.source, SignalSource::PersonalContext);

    let stats = harness.witness.get_stats();
    assert_eq!(stats.events_seen, 2);
    assert_eq!(stats.events_dropped, 1);
    assert_eq!(stats.signals_published, 1);
}

#[tokio::test]
async fn a_matched_pattern_is_persisted_to_the_pattern_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;
    let store = KvStore::open(&dir.path().join("store.db"), &StoreConfig::default(), 2).expect("store reopens");
    let patterns = PatternStore::new(store);

    harness
        .bus
        .publish(harness.config.telemetry_queue.clone(), serde_json::json!({"error": "ModuleNotFoundError: no module named foo"}), 0, None)
        .await
        .expect("publish succeeds");

    let mut output = harness.bus.subscribe(harness.config.output_queue.clone(), None).await.expect("subscribe succeeds");
    tokio::time::timeout(Duration::from_secs(2), output.next()).await.expect("a signal is published").expect("stream open");

    let records = patterns.search_patterns(Some("failure"), None, None, None).await.expect("search succeeds");
    assert!(!records.is_empty(), "the matched pattern should have been recorded in the pattern store");
}

#[tokio::test]
async fn an_event_with_no_extractable_text_under_null_payload_is_dropped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;

    harness.bus.publish(harness.config.telemetry_queue.clone(), serde_json::Value::Null, 0, None).await.expect("publish succeeds");
    harness
        .bus
        .publish(harness.config.telemetry_queue.clone(), serde_json::json!({"message": "fatal: crash"}), 0, None)
        .await
        .expect("publish succeeds");

    let mut output = harness.bus.subscribe(harness.config.output_queue.clone(), None).await.expect("subscribe succeeds");
    tokio::time::timeout(Duration::from_secs(2), output.next())
        .await
        .expect("the second event still produces a signal despite the first being null")
        .expect("stream open");

    let stats = harness.witness.get_stats();
    assert_eq!(stats.events_dropped, 1);
}
