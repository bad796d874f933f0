// crates/sentinel-bus/src/subscription.rs
// ============================================================================
// Module: Subscription
// Description: The async stream handed back by `MessageBus::subscribe`.
// Purpose: Chain the initial durable-backlog drain with the live in-process
//          feed, and deregister from the subscriber registry on drop.
// Dependencies: tokio, tokio-stream, sentinel-core
// ============================================================================

use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use sentinel_core::Message;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

use crate::registry::SubscriberRegistry;

/// A live subscription to one queue: the durable backlog followed by the
/// in-process live feed, as one continuous [`Stream`].
///
/// Dropping a `Subscription` removes it from the owning bus's subscriber
/// registry; if it was the queue's last subscriber, the registry's entry
/// for that queue is removed entirely.
pub struct Subscription {
    inner: Pin<Box<dyn Stream<Item = Message> + Send>>,
    registry: Arc<SubscriberRegistry>,
    queue: String,
    subscriber_id: u64,
}

impl Subscription {
    pub(crate) fn new(
        backlog: Vec<Message>,
        live: tokio::sync::mpsc::Receiver<Message>,
        registry: Arc<SubscriberRegistry>,
        queue: String,
        subscriber_id: u64,
    ) -> Self {
        let live_stream = tokio_stream::wrappers::ReceiverStream::new(live);
        let inner = Box::pin(tokio_stream::iter(backlog).chain(live_stream));
        Self {
            inner,
            registry,
            queue,
            subscriber_id,
        }
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(&self.queue, self.subscriber_id);
    }
}
