// crates/sentinel-hitl/src/waiters.rs
// ============================================================================
// Module: WaiterRegistry
// Description: One-shot async waiters for in-flight questions, keyed by
//              question id.
// Purpose: Let `wait_response` suspend until `submit_response` (or an
//          expiry sweep) resolves the same question, without polling.
// Dependencies: tokio::sync::oneshot
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use sentinel_core::HitlResponse;
use tokio::sync::oneshot;

/// Registry of pending one-shot waiters, one per outstanding question.
///
/// A question acquires a waiter when `wait_response` is first called for it
/// and loses it the moment that call returns, times out, or is cancelled —
/// there is never more than one waiter per question id.
#[derive(Default)]
pub(crate) struct WaiterRegistry {
    waiters: Mutex<HashMap<String, oneshot::Sender<HitlResponse>>>,
}

impl WaiterRegistry {
    pub(crate) fn new() -> Self {
        Self { waiters: Mutex::new(HashMap::new()) }
    }

    /// Registers a fresh waiter for `question_id`, returning the receiving
    /// half. Replaces (and silently drops) any prior waiter for the same id.
    pub(crate) fn register(&self, question_id: &str) -> oneshot::Receiver<HitlResponse> {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        waiters.insert(question_id.to_owned(), tx);
        rx
    }

    /// Delivers `response` to the waiter for its question id, if one is
    /// still registered. Returns `true` if a waiter was woken.
    pub(crate) fn fire(&self, response: HitlResponse) -> bool {
        let sender = {
            let mut waiters = self.waiters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            waiters.remove(response.question_id.as_str())
        };
        match sender {
            Some(tx) => tx.send(response).is_ok(),
            None => false,
        }
    }

    /// Drops the waiter for `question_id` without resolving it, used when
    /// `wait_response` gives up (timeout or cancellation) so a late
    /// `fire` finds nothing to deliver to.
    pub(crate) fn remove(&self, question_id: &str) {
        let mut waiters = self.waiters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        waiters.remove(question_id);
    }
}
