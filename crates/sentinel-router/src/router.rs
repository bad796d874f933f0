// crates/sentinel-router/src/router.rs
// ============================================================================
// Module: Router
// Description: The event router and healing trigger's per-event loop.
// Purpose: Route each raw event to a pattern-match fast path, a
//          type-dispatched handler, or an unhandled-event log line, and
//          drive autonomous healing for error-shaped events.
// Dependencies: sentinel-bus, sentinel-config, sentinel-core,
//               sentinel-patterns, tokio, tokio-stream, tracing
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use sentinel_bus::MessageBus;
use sentinel_config::RouterConfig;
use sentinel_core::Message;
use sentinel_patterns::PatternStore;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio_stream::StreamExt;

use crate::error::RouterError;
use crate::event::EventKind;
use crate::event::RouterEvent;
use crate::executor::HealingExecutor;
use crate::healing;
use crate::healing::HealingResult;
use crate::similarity;
use crate::stats::RouterStats;

/// The outcome of routing a single event, returned by [`Router::route`] for
/// tests and callers that want the dispatch result rather than just the
/// side effects.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    /// The branch of the decision tree that handled the event.
    pub handler: &'static str,
    /// Whether that branch reports success.
    pub success: bool,
    /// A short, branch-specific detail string for logging.
    pub detail: String,
}

/// The event router and healing trigger.
///
/// Optional fast path that routes raw bus events: a pattern-match branch
/// first, then type-based dispatch, then an unhandled-event log line. Error
/// and error-shaped test-failure events are handed to the healing trigger,
/// which enforces a cooldown and learns from pattern application outcomes.
pub struct Router {
    bus: Arc<MessageBus>,
    patterns: Arc<PatternStore>,
    config: RouterConfig,
    input_queue: String,
    executor: Arc<dyn HealingExecutor>,
    cooldown: Mutex<HashMap<String, OffsetDateTime>>,
    stats: Mutex<RouterStats>,
}

impl Router {
    /// Builds a `Router` over already-open shared handles.
    ///
    /// `input_queue` is supplied by the caller rather than `RouterConfig`,
    /// since this fast path observes the same raw event stream the
    /// perception agent classifies, not a queue of its own.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>, patterns: Arc<PatternStore>, config: RouterConfig, input_queue: impl Into<String>, executor: Arc<dyn HealingExecutor>) -> Self {
        Self {
            bus,
            patterns,
            config,
            input_queue: input_queue.into(),
            executor,
            cooldown: Mutex::new(HashMap::new()),
            stats: Mutex::new(RouterStats::default()),
        }
    }

    /// Returns a snapshot of the counters accumulated so far.
    #[must_use]
    pub fn get_stats(&self) -> RouterStats {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Runs the routing loop until `stop` is set to `true`.
    ///
    /// # Errors
    /// Returns [`RouterError::Bus`] if subscribing to `input_queue` fails
    /// at startup.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> Result<(), RouterError> {
        let mut events = self.bus.subscribe(self.input_queue.clone(), None).await?;

        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                next = events.next() => {
                    match next {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    /// Processes one bus message, logging the outcome; a message whose
    /// payload does not parse as a [`RouterEvent`] is logged and
    /// acknowledged without further dispatch.
    async fn handle_message(&self, message: Message) {
        self.record_seen();

        let Some(event) = RouterEvent::parse(&message.payload) else {
            tracing::warn!("router received a payload with no event_type");
            if let Err(err) = self.bus.ack(message.id).await {
                tracing::error!(error = %err, "failed to ack malformed event");
            }
            return;
        };

        match self.route(&event).await {
            Ok(outcome) => {
                tracing::debug!(handler = outcome.handler, success = outcome.success, detail = %outcome.detail, "event routed");
            }
            Err(err) => {
                tracing::warn!(event_type = %event.event_type, error = %err, "event routing failed");
            }
        }

        if let Err(err) = self.bus.ack(message.id).await {
            tracing::error!(error = %err, "failed to ack event");
        }
    }

    /// Routes one event: pattern-match fast path, then type dispatch, then
    /// the unhandled-event branch.
    ///
    /// # Errors
    /// Returns [`RouterError::Pattern`] if the pattern store search fails.
    pub async fn route(&self, event: &RouterEvent) -> Result<RouteOutcome, RouterError> {
        let candidates = self.patterns.search_patterns(None, None, None, None).await?;
        let matches = similarity::find_matches(event, &candidates, &self.config.similarity_weights, self.config.pattern_match_threshold);

        if let Some(best) = matches.first() {
            self.record_pattern_dispatch();
            return Ok(RouteOutcome {
                handler: "pattern_matched",
                success: true,
                detail: format!("applied pattern {} at score {:.2}", best.record.pattern_name, best.score),
            });
        }

        match event.kind {
            EventKind::ErrorDetected => Ok(self.dispatch_healing(event).await?),
            EventKind::TestFailure if event.error_type.is_some() => Ok(self.dispatch_healing(event).await?),
            EventKind::TestFailure => Ok(RouteOutcome {
                handler: "test_failure_handler",
                success: true,
                detail: "analyzed".to_owned(),
            }),
            EventKind::FileChanged => {
                self.record_change();
                Ok(RouteOutcome {
                    handler: "change_handler",
                    success: true,
                    detail: "analyzed".to_owned(),
                })
            }
            EventKind::PatternMatched => Ok(RouteOutcome {
                handler: "pattern_application_handler",
                success: false,
                detail: "no pattern cleared the threshold".to_owned(),
            }),
            EventKind::Other => {
                self.record_unhandled();
                tracing::warn!(event_type = %event.event_type, "unhandled event");
                Ok(RouteOutcome {
                    handler: "unhandled",
                    success: false,
                    detail: format!("no handler for event type: {}", event.event_type),
                })
            }
        }
    }

    /// Runs the healing trigger's full flow for an error-shaped event.
    async fn dispatch_healing(&self, event: &RouterEvent) -> Result<RouteOutcome, RouterError> {
        self.record_healing_attempt();
        let result = self.handle_error(event).await?;

        if result.skipped {
            self.record_skipped();
        } else if result.success {
            self.record_success();
        } else {
            self.record_failure();
        }

        Ok(RouteOutcome {
            handler: "healing_trigger",
            success: result.success,
            detail: result.reason.unwrap_or_default(),
        })
    }

    /// The healing trigger's own flow: cooldown check, pattern lookup,
    /// apply-or-attempt-generic, learn.
    ///
    /// # Errors
    /// Returns [`RouterError::Pattern`] if the pattern store fails.
    async fn handle_error(&self, event: &RouterEvent) -> Result<HealingResult, RouterError> {
        let key = event.cooldown_key();
        let now = OffsetDateTime::now_utc();

        if healing::in_cooldown(&self.cooldown.lock().unwrap_or_else(std::sync::PoisonError::into_inner), &key, self.config.cooldown_minutes, now) {
            return Ok(HealingResult::cooldown());
        }

        let error_type = event.error_type.as_deref().unwrap_or(&event.event_type);
        let pattern = healing::find_pattern_for_error(&self.patterns, error_type).await?;

        let result = if let Some(pattern) = pattern {
            healing::apply_pattern(self.executor.as_ref(), &self.patterns, &pattern, event).await?
        } else {
            healing::attempt_generic_healing(self.executor.as_ref(), event).await
        };

        if !result.success {
            self.cooldown.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(key, now);
        }

        Ok(result)
    }

    /// Records one event as seen on the input queue.
    fn record_seen(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).events_seen += 1;
    }

    /// Records one event dispatched via the pattern-match fast path.
    fn record_pattern_dispatch(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pattern_dispatched += 1;
    }

    /// Records one event dispatched to the healing trigger.
    fn record_healing_attempt(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).healing_attempted += 1;
    }

    /// Records one healing attempt skipped for cooldown.
    fn record_skipped(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).healing_skipped_cooldown += 1;
    }

    /// Records one successful healing attempt.
    fn record_success(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).healing_succeeded += 1;
    }

    /// Records one failed healing attempt.
    fn record_failure(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).healing_failed += 1;
    }

    /// Records one file-change event observed.
    fn record_change(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).changes_observed += 1;
    }

    /// Records one event that matched no branch of the dispatch tree.
    fn record_unhandled(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).unhandled += 1;
    }
}
