// crates/sentinel-bus/src/registry.rs
// ============================================================================
// Module: SubscriberRegistry
// Description: The in-process fan-out list of live subscribers per queue.
// Purpose: Let `publish` notify every currently-subscribed receiver without
//          blocking on a slow one, and let a dropped subscription clean
//          itself out of the registry.
// Dependencies: std, tokio, tracing, sentinel-core
// ============================================================================

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use sentinel_core::Message;
use tokio::sync::mpsc;

/// Live, in-process fan-out registry, keyed by queue name.
///
/// Held behind a short-lived `std::sync::Mutex`: every operation is a plain
/// map lookup and `try_send`, never an `.await`, so the lock is never held
/// across a suspension point.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<String, Vec<(u64, mpsc::Sender<Message>)>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    /// Registers a new subscriber for `queue`, returning its sender half's
    /// id so [`SubscriberRegistry::remove`] can later find it again.
    pub fn register(&self, queue: &str, sender: mpsc::Sender<Message>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.entry(queue.to_owned()).or_default().push((id, sender));
        id
    }

    /// Removes the subscriber `id` from `queue`. If it was the last
    /// subscriber for that queue, the queue's entry is removed entirely.
    pub fn remove(&self, queue: &str, id: u64) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(list) = subscribers.get_mut(queue) {
            list.retain(|(existing_id, _)| *existing_id != id);
            if list.is_empty() {
                subscribers.remove(queue);
            }
        }
    }

    /// Delivers `message` to every currently-registered subscriber of
    /// `queue`. A subscriber whose bounded mailbox is full has this message
    /// dropped for it only; the durable row is unaffected.
    pub fn notify(&self, queue: &str, message: &Message) {
        let subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(list) = subscribers.get(queue) else {
            return;
        };
        for (_, sender) in list {
            if let Err(mpsc::error::TrySendError::Full(_)) = sender.try_send(message.clone()) {
                tracing::warn!(queue, message_id = %message.id, "subscriber mailbox full, dropping delivery");
            }
        }
    }

    /// Number of currently-live subscribers per queue.
    pub fn active_counts(&self) -> std::collections::BTreeMap<String, usize> {
        let subscribers = self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        subscribers.iter().map(|(queue, list)| (queue.clone(), list.len())).collect()
    }
}
