// crates/sentinel-witness/src/witness.rs
// ============================================================================
// Module: Witness
// Description: The WITNESS perception agent's 8-step per-event loop.
// Purpose: Turn raw bus events on two input queues into validated `Signal`s
//          on one output queue, using the pattern detector to classify and
//          the pattern store to remember.
// Dependencies: sentinel-bus, sentinel-config, sentinel-core,
//               sentinel-detector, sentinel-patterns, tokio, tokio-stream,
//               tracing
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use sentinel_bus::MessageBus;
use sentinel_config::WitnessConfig;
use sentinel_core::Message;
use sentinel_core::Signal;
use sentinel_core::SignalSource;
use sentinel_detector::PatternDetector;
use sentinel_patterns::PatternStore;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::StreamMap;

use crate::classify;
use crate::error::WitnessError;
use crate::stats::WitnessStats;

/// WITNESS, the stateless perception agent.
///
/// Holds no state of its own beyond [`WitnessStats`] and whatever
/// occurrence history `detector` accumulates; every event is processed
/// independently of every other.
pub struct Witness {
    bus: Arc<MessageBus>,
    patterns: Arc<PatternStore>,
    detector: Arc<PatternDetector>,
    config: WitnessConfig,
    stats: Mutex<WitnessStats>,
}

impl Witness {
    /// Builds a `Witness` over already-open shared handles.
    #[must_use]
    pub fn new(
        bus: Arc<MessageBus>,
        patterns: Arc<PatternStore>,
        detector: Arc<PatternDetector>,
        config: WitnessConfig,
    ) -> Self {
        Self {
            bus,
            patterns,
            detector,
            config,
            stats: Mutex::new(WitnessStats::default()),
        }
    }

    /// Returns a snapshot of the counters accumulated so far.
    #[must_use]
    pub fn get_stats(&self) -> WitnessStats {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Runs the perception loop until `stop` is set to `true`.
    ///
    /// Subscribes to both input queues concurrently (LISTEN) and processes
    /// whichever yields next; every per-event failure from steps 2-7 is
    /// caught and logged rather than propagated, so one malformed event
    /// never kills the loop.
    ///
    /// # Errors
    /// Returns [`WitnessError::Bus`] only if subscribing to either input
    /// queue fails at startup.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> Result<(), WitnessError> {
        let telemetry = self.bus.subscribe(self.config.telemetry_queue.clone(), None).await?;
        let personal_context = self.bus.subscribe(self.config.context_queue.clone(), None).await?;

        let mut streams = StreamMap::new();
        streams.insert(SignalSource::Telemetry, telemetry);
        streams.insert(SignalSource::PersonalContext, personal_context);

        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                next = streams.next() => {
                    match next {
                        Some((source, message)) => self.handle_event(source, message).await,
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    /// Processes one event end to end (steps 2-7), recording the outcome
    /// in [`WitnessStats`] and logging any drop or failure; never returns
    /// an error to the caller.
    async fn handle_event(&self, source: SignalSource, message: Message) {
        let queue = self.queue_name(source);
        self.record_seen(queue);

        match self.process_event(source, &message).await {
            Ok(true) => {
                tracing::debug!(queue, source_id = %classify::extract_source_id(&message.payload), "published signal");
            }
            Ok(false) => {
                self.record_drop();
                tracing::warn!(queue, source_id = %classify::extract_source_id(&message.payload), "event dropped at classify/validate/self-verify");
            }
            Err(err) => {
                self.record_drop();
                tracing::warn!(queue, source_id = %classify::extract_source_id(&message.payload), error = %err, "event processing failed");
            }
        }
    }

    /// Runs CLASSIFY through PERSIST for one event. Returns `Ok(true)` if a
    /// `Signal` was published, `Ok(false)` if it was discarded at CLASSIFY,
    /// VALIDATE, or SELF-VERIFY.
    async fn process_event(&self, source: SignalSource, message: &Message) -> Result<bool, WitnessError> {
        let Some(text) = classify::extract_text(&message.payload) else {
            return Ok(false);
        };
        let metadata = message.payload.as_object();

        let Some(pattern_match) = self.detector.detect(&text, metadata) else {
            return Ok(false);
        };

        let mut data = serde_json::Map::new();
        data.insert("pattern_type".to_owned(), serde_json::Value::String(pattern_match.pattern_type.as_str().to_owned()));
        data.insert(
            "keywords_matched".to_owned(),
            serde_json::Value::Array(pattern_match.keywords_matched.iter().cloned().map(serde_json::Value::String).collect()),
        );
        data.insert("base_score".to_owned(), serde_json::json!(pattern_match.base_score));
        data.insert("keyword_score".to_owned(), serde_json::json!(pattern_match.keyword_score));
        if let Some(metadata) = metadata {
            for (key, value) in metadata {
                data.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        let summary = classify::truncate_summary(&format!("{}: {text}", classify::title_case(&pattern_match.pattern_name)));

        let signal = Signal {
            priority: classify::derive_priority(&pattern_match),
            source,
            pattern: pattern_match.pattern_name.clone(),
            confidence: pattern_match.confidence,
            data,
            summary,
            timestamp: OffsetDateTime::now_utc(),
            source_id: classify::extract_source_id(&message.payload),
            correlation_id: message.correlation_id.clone(),
        };

        if !signal.is_valid() {
            return Ok(false);
        }

        let payload = serde_json::to_value(&signal)?;
        self.bus
            .publish(self.config.output_queue.clone(), payload, signal.priority.bus_priority(), signal.correlation_id.clone())
            .await?;

        self.patterns
            .store_pattern(
                pattern_match.pattern_type.as_str(),
                pattern_match.pattern_name.clone(),
                signal.summary.clone(),
                signal.confidence,
                Some(signal.data.clone()),
                1,
            )
            .await?;

        self.record_publish();
        Ok(true)
    }

    /// Queue name a given input source maps to, for logging.
    fn queue_name(&self, source: SignalSource) -> &str {
        match source {
            SignalSource::Telemetry => &self.config.telemetry_queue,
            SignalSource::PersonalContext => &self.config.context_queue,
        }
    }

    /// Records one event as seen, attributed to the queue it came from.
    fn record_seen(&self, queue: &str) {
        let mut stats = self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        stats.events_seen += 1;
        *stats.by_queue.entry(queue.to_owned()).or_insert(0) += 1;
    }

    /// Records one event as dropped or failed.
    fn record_drop(&self) {
        let mut stats = self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        stats.events_dropped += 1;
    }

    /// Records one signal as published.
    fn record_publish(&self) {
        let mut stats = self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        stats.signals_published += 1;
    }
}
