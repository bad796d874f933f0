// crates/sentinel-runtime/tests/runtime.rs
// Integration tests for `System`'s open/spawn/shutdown lifecycle.

use std::sync::Arc;
use std::time::Duration;

use sentinel_config::SystemConfig;
use sentinel_router::NoopHealingExecutor;
use sentinel_runtime::System;

#[tokio::test]
async fn open_spawn_and_shutdown_completes_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let system = System::open(dir.path(), SystemConfig::default()).expect("system opens");

    let handles = system.spawn_agents(None);
    system.shutdown(handles).await;
}

#[tokio::test]
async fn a_telemetry_event_produces_a_signal_on_the_output_queue() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SystemConfig::default();
    let output_queue = config.witness.output_queue.clone();
    let telemetry_queue = config.witness.telemetry_queue.clone();
    let system = System::open(dir.path(), config).expect("system opens");

    let handles = system.spawn_agents(None);
    let bus = system.bus();

    bus.publish(
        telemetry_queue,
        serde_json::json!({"message": "timeout exceeded in authentication module", "id": "evt-1", "metadata": {"file": "auth.py", "line": 123}}),
        0,
        None,
    )
    .await
    .expect("publish succeeds");

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if bus.get_pending_count(output_queue.clone()).await.expect("count succeeds") > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("a signal is published before the timeout");

    system.shutdown(handles).await;
}

#[tokio::test]
async fn spawning_with_a_healing_executor_starts_the_router() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SystemConfig::default();
    let telemetry_queue = config.witness.telemetry_queue.clone();
    let system = System::open(dir.path(), config).expect("system opens");

    let executor: Arc<dyn sentinel_router::HealingExecutor> = Arc::new(NoopHealingExecutor);
    let handles = system.spawn_agents(Some(executor));
    let bus = system.bus();

    bus.publish(
        telemetry_queue,
        serde_json::json!({"event_type": "error_detected", "error_type": "KeyError", "source_file": "src/lookup.rs", "message": "boom"}),
        0,
        None,
    )
    .await
    .expect("publish succeeds");

    tokio::time::sleep(Duration::from_millis(200)).await;

    system.shutdown(handles).await;
}
