// crates/sentinel-hitl/tests/protocol.rs
// Integration tests for `HitlProtocol`'s ask/wait/respond/expire lifecycle.

use std::sync::Arc;
use std::time::Duration;

use sentinel_bus::MessageBus;
use sentinel_config::BusConfig;
use sentinel_config::HitlConfig;
use sentinel_hitl::HitlProtocol;

async fn open_protocol(dir: &tempfile::TempDir) -> (Arc<MessageBus>, HitlProtocol) {
    let bus = Arc::new(MessageBus::open(&dir.path().join("bus.db"), &BusConfig::default(), 2).expect("bus opens"));
    let config = HitlConfig::default();
    let protocol =
        HitlProtocol::open(&dir.path().join("hitl.db"), &config, Arc::clone(&bus), 2).expect("protocol opens");
    (bus, protocol)
}

#[tokio::test]
async fn ask_then_submit_then_wait_returns_the_submitted_answer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;

    let question_id = protocol.ask_async("proceed?", None, None, Some(5)).await.expect("ask succeeds");
    protocol.submit_response(&question_id, "yes").await.expect("submit succeeds");

    let response = protocol
        .wait_response(&question_id, Duration::from_secs(1))
        .await
        .expect("wait returns the already-answered response");
    assert_eq!(response.answer, "yes");
}

#[tokio::test]
async fn wait_response_wakes_on_a_concurrent_submit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;
    let protocol = Arc::new(protocol);

    let question_id = protocol.ask_async("deploy?", None, None, Some(5)).await.expect("ask succeeds");

    let waiter = {
        let protocol = Arc::clone(&protocol);
        let question_id = question_id.clone();
        tokio::spawn(async move { protocol.wait_response(&question_id, Duration::from_secs(2)).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    protocol.submit_response(&question_id, "no").await.expect("submit succeeds");

    let response = waiter.await.expect("waiter task joins").expect("wait succeeds");
    assert_eq!(response.answer, "no");
}

#[tokio::test]
async fn wait_response_times_out_when_nobody_answers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;

    let question_id = protocol.ask_async("respond?", None, None, Some(30)).await.expect("ask succeeds");
    let outcome = protocol.wait_response(&question_id, Duration::from_millis(50)).await;

    assert!(matches!(outcome, Err(sentinel_hitl::HitlError::Timeout)));
}

#[tokio::test]
async fn approve_parses_yes_and_no_case_insensitively() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;
    let protocol = Arc::new(protocol);

    let answerer = {
        let protocol = Arc::clone(&protocol);
        tokio::spawn(async move {
            loop {
                let pending = protocol.get_pending(10).await.expect("pending succeeds");
                if let Some(question) = pending.into_iter().next() {
                    protocol.submit_response(&question.question_id, "YES").await.expect("submit succeeds");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let approved = protocol.approve("refactor test.py", None, Some(2)).await.expect("approve succeeds");
    answerer.await.expect("answerer task joins");
    assert!(approved);
}

#[tokio::test]
async fn expire_old_questions_only_touches_overdue_pending_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;

    let expiring_soon = protocol.ask_async("will it expire?", None, None, Some(0)).await.expect("ask succeeds");
    let still_pending = protocol.ask_async("still open?", None, None, Some(60)).await.expect("ask succeeds");

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let expired_count = protocol.expire_old_questions().await.expect("expiry sweep succeeds");
    assert_eq!(expired_count, 1);

    let pending = protocol.get_pending(10).await.expect("pending succeeds");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].question_id, still_pending);

    let outcome = protocol.wait_response(&expiring_soon, Duration::from_millis(10)).await;
    assert!(matches!(outcome, Err(sentinel_hitl::HitlError::Timeout)));
}

#[tokio::test]
async fn get_stats_reports_acceptance_rate_across_answered_questions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;

    let approved = protocol.ask_async("ok to merge?", None, None, Some(5)).await.expect("ask succeeds");
    let declined = protocol.ask_async("ok to delete?", None, None, Some(5)).await.expect("ask succeeds");
    protocol.submit_response(&approved, "yes").await.expect("submit succeeds");
    protocol.submit_response(&declined, "no").await.expect("submit succeeds");

    let stats = protocol.get_stats().await.expect("stats succeed");
    assert_eq!(stats.total_questions, 2);
    assert_eq!(stats.answered, 2);
    assert!((stats.acceptance_rate - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn submit_response_rejects_a_question_that_does_not_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (_bus, protocol) = open_protocol(&dir).await;

    let outcome = protocol.submit_response(&sentinel_core::QuestionId::new("missing"), "yes").await;
    assert!(matches!(outcome, Err(sentinel_hitl::HitlError::NotFound(_))));
}
