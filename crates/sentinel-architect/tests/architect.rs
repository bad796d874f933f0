// crates/sentinel-architect/tests/architect.rs
// Integration tests for `Architect`'s end-to-end TRIAGE/GATHER CONTEXT/
// ASSESS COMPLEXITY/FORMULATE STRATEGY/GENERATE TASK GRAPH/SELF-VERIFY/
// PUBLISH pipeline.

use std::sync::Arc;
use std::time::Duration;

use sentinel_architect::Architect;
use sentinel_bus::MessageBus;
use sentinel_config::ArchitectConfig;
use sentinel_config::BusConfig;
use sentinel_config::StoreConfig;
use sentinel_core::CorrelationId;
use sentinel_core::Signal;
use sentinel_core::SignalSource;
use sentinel_core::SourceId;
use sentinel_core::TaskSpec;
use sentinel_core::TaskType;
use sentinel_core::Urgency;
use sentinel_patterns::PatternStore;
use sentinel_store::KvStore;
use tokio_stream::StreamExt;

struct Harness {
    bus: Arc<MessageBus>,
    architect: Arc<Architect>,
    config: ArchitectConfig,
    stop: tokio::sync::watch::Sender<bool>,
}

async fn harness(dir: &tempfile::TempDir) -> Harness {
    let bus = Arc::new(MessageBus::open(&dir.path().join("bus.db"), &BusConfig::default(), 2).expect("bus opens"));
    let store = KvStore::open(&dir.path().join("store.db"), &StoreConfig::default(), 2).expect("store opens");
    let patterns = Arc::new(PatternStore::new(store));
    let config = ArchitectConfig {
        workspace_dir: dir.path().join("workspace").to_string_lossy().into_owned(),
        ..ArchitectConfig::default()
    };

    let architect = Arc::new(Architect::new(Arc::clone(&bus), patterns, config.clone()));
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let run_handle = Arc::clone(&architect);
    tokio::spawn(async move { run_handle.run(stop_rx).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    Harness { bus, architect, config, stop: stop_tx }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

fn sample_signal(pattern: &str, priority: Urgency, confidence: f64) -> Signal {
    sample_signal_with_keywords(pattern, priority, confidence, &[])
}

fn sample_signal_with_keywords(pattern: &str, priority: Urgency, confidence: f64, keywords: &[&str]) -> Signal {
    let mut data = serde_json::Map::new();
    data.insert("pattern_type".to_owned(), serde_json::Value::String("failure".to_owned()));
    data.insert(
        "keywords_matched".to_owned(),
        serde_json::Value::Array(keywords.iter().map(|k| serde_json::Value::String((*k).to_owned())).collect()),
    );
    Signal {
        priority,
        source: SignalSource::Telemetry,
        pattern: pattern.to_owned(),
        confidence,
        data,
        summary: format!("{pattern} observed"),
        timestamp: time::OffsetDateTime::now_utc(),
        source_id: SourceId::Text("evt-1".to_owned()),
        correlation_id: Some(CorrelationId::new("corr-test")),
    }
}

#[tokio::test]
async fn a_simple_signal_produces_a_three_task_plan() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;

    let signal = sample_signal("critical_error", Urgency::Normal, 0.8);
    harness
        .bus
        .publish(harness.config.input_queue.clone(), serde_json::to_value(&signal).expect("serializes"), 0, signal.correlation_id.clone())
        .await
        .expect("publish succeeds");

    let mut output = harness.bus.subscribe(harness.config.output_queue.clone(), None).await.expect("subscribe succeeds");

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let message = tokio::time::timeout(Duration::from_secs(2), output.next())
            .await
            .expect("a task is published before the timeout")
            .expect("the subscription stream is not closed");
        let task: TaskSpec = serde_json::from_value(message.payload).expect("task deserializes");
        tasks.push(task);
    }

    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().any(|task| task.task_type == TaskType::CodeGeneration));
    assert!(tasks.iter().any(|task| task.task_type == TaskType::TestGeneration));
    let merge = tasks.iter().find(|task| task.task_type == TaskType::Merge).expect("a merge task exists");
    assert_eq!(merge.dependencies.len(), 2);

    let stats = harness.architect.get_stats();
    assert_eq!(stats.signals_processed, 1);
    assert_eq!(stats.tasks_created, 3);
}

#[tokio::test]
async fn a_critical_signal_escalates_the_reasoning_engine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;

    let signal = sample_signal_with_keywords("constitutional_violation", Urgency::Critical, 0.95, &["architecture"]);
    harness
        .bus
        .publish(harness.config.input_queue.clone(), serde_json::to_value(&signal).expect("serializes"), 10, signal.correlation_id.clone())
        .await
        .expect("publish succeeds");

    let mut output = harness.bus.subscribe(harness.config.output_queue.clone(), None).await.expect("subscribe succeeds");
    for _ in 0..3 {
        tokio::time::timeout(Duration::from_secs(2), output.next())
            .await
            .expect("a task is published before the timeout")
            .expect("the subscription stream is not closed");
    }

    let stats = harness.architect.get_stats();
    assert_eq!(stats.escalations, 1);
    assert_eq!(stats.specs_generated, 1);
    assert_eq!(stats.adrs_generated, 1);
}

#[tokio::test]
async fn an_unparseable_signal_reports_failure_but_still_acks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let harness = harness(&dir).await;

    let mut telemetry = harness.bus.subscribe(harness.config.telemetry_queue.clone(), None).await.expect("subscribe succeeds");

    harness
        .bus
        .publish(harness.config.input_queue.clone(), serde_json::json!({"not_a_signal": true}), 0, None)
        .await
        .expect("publish succeeds");

    let message = tokio::time::timeout(Duration::from_secs(2), telemetry.next())
        .await
        .expect("a failure report is published before the timeout")
        .expect("the subscription stream is not closed");

    let report = message.payload.as_object().expect("report is an object");
    assert_eq!(report.get("status").and_then(serde_json::Value::as_str), Some("failure"));

    assert_eq!(harness.bus.get_pending_count(harness.config.input_queue.clone()).await.expect("count succeeds"), 0);
}
