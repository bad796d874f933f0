// crates/sentinel-architect/src/architect.rs
// ============================================================================
// Module: Architect
// Description: ARCHITECT's 10-step per-signal planning loop.
// Purpose: Turn each validated Signal WITNESS publishes into a verified,
//          published task DAG, escalating reasoning engine by priority and
//          complexity, and reporting failures to telemetry without ever
//          leaving a signal unacknowledged.
// Dependencies: sentinel-bus, sentinel-config, sentinel-core,
//               sentinel-patterns, tokio, tokio-stream, tracing, uuid
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use sentinel_bus::MessageBus;
use sentinel_config::ArchitectConfig;
use sentinel_core::CorrelationId;
use sentinel_core::Message;
use sentinel_core::PatternRecord;
use sentinel_core::Signal;
use sentinel_core::Strategy;
use sentinel_patterns::PatternStore;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::complexity;
use crate::documents;
use crate::error::ArchitectError;
use crate::plan;
use crate::stats::ArchitectStats;

/// ARCHITECT, the cognition agent.
///
/// Holds no state across signals beyond [`ArchitectStats`]; every failure
/// inside [`Architect::handle_message`] is caught, reported to
/// `telemetry_queue`, and the originating message is still acknowledged.
pub struct Architect {
    bus: Arc<MessageBus>,
    patterns: Arc<PatternStore>,
    config: ArchitectConfig,
    workspace_dir: PathBuf,
    stats: Mutex<ArchitectStats>,
}

impl Architect {
    /// Builds an `Architect` over already-open shared handles.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>, patterns: Arc<PatternStore>, config: ArchitectConfig) -> Self {
        let workspace_dir = PathBuf::from(&config.workspace_dir);
        Self {
            bus,
            patterns,
            config,
            workspace_dir,
            stats: Mutex::new(ArchitectStats::default()),
        }
    }

    /// Returns a snapshot of the counters accumulated so far.
    #[must_use]
    pub fn get_stats(&self) -> ArchitectStats {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Runs the planning loop until `stop` is set to `true`.
    ///
    /// Creates the workspace scratch directory (LISTEN's precondition),
    /// subscribes to `input_queue`, and processes whichever message
    /// arrives next; every per-signal failure is caught in
    /// [`Architect::handle_message`] rather than propagated, so one
    /// malformed signal never kills the loop.
    ///
    /// # Errors
    /// Returns [`ArchitectError::Io`] if the workspace directory cannot be
    /// created, or [`ArchitectError::Bus`] if subscribing fails at startup.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> Result<(), ArchitectError> {
        tokio::fs::create_dir_all(&self.workspace_dir)
            .await
            .map_err(|err| ArchitectError::Io(format!("workspace creation failed: {err}")))?;

        let mut signals = self.bus.subscribe(self.config.input_queue.clone(), None).await?;

        loop {
            tokio::select! {
                biased;
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                next = signals.next() => {
                    match next {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }
                }
            }
        }

        Ok(())
    }

    /// Processes one message end to end, reporting any failure to
    /// `telemetry_queue` and always cleaning up the workspace scratch file
    /// and acknowledging the message, regardless of outcome.
    async fn handle_message(&self, message: Message) {
        let correlation_id = message
            .correlation_id
            .clone()
            .unwrap_or_else(|| CorrelationId::new(Uuid::new_v4().to_string()));

        let outcome = self.process_message(&message, &correlation_id).await;

        if let Err(err) = &outcome {
            tracing::warn!(correlation_id = %correlation_id, error = %err, "planning failed");
            self.record_failure();
            if let Err(report_err) = self.report_failure(&message, &correlation_id, err).await {
                tracing::error!(correlation_id = %correlation_id, error = %report_err, "failed to publish failure report");
            }
        }

        self.cleanup_workspace(&correlation_id).await;

        if let Err(err) = self.bus.ack(message.id).await {
            tracing::error!(correlation_id = %correlation_id, error = %err, "failed to ack message");
        }
    }

    /// Runs TRIAGE through PUBLISH for one message.
    async fn process_message(&self, message: &Message, correlation_id: &CorrelationId) -> Result<(), ArchitectError> {
        let signal: Signal = serde_json::from_value(message.payload.clone())?;

        let query = if signal.pattern.is_empty() { "general" } else { signal.pattern.as_str() };
        let historical = self.patterns.search_patterns(None, None, Some(query), Some(0.6)).await?;
        let historical: Vec<_> = historical.into_iter().take(5).collect();

        let complexity_score = complexity::assess(&signal, &historical);
        let (engine, escalated) = complexity::select_engine(&signal, complexity_score);
        if escalated {
            self.record_escalation();
        }

        let strategy = self.formulate_strategy(&signal, &historical, correlation_id, complexity_score, engine);

        self.externalize_strategy(correlation_id, &strategy).await?;

        let tasks = plan::generate_task_graph(
            correlation_id,
            signal.priority,
            &strategy.decision,
            strategy.spec_content.as_deref(),
            strategy.adr_content.as_deref(),
        );
        plan::verify_plan(&tasks)?;

        for task in &tasks {
            let payload = serde_json::to_value(task)?;
            self.bus.publish(self.config.output_queue.clone(), payload, task.priority.bus_priority(), Some(correlation_id.clone())).await?;
        }
        self.record_tasks(tasks.len());
        self.record_processed();

        Ok(())
    }

    /// FORMULATE STRATEGY: decides whether the signal warrants a spec
    /// and/or ADR, then builds the `Strategy` those decisions produce.
    fn formulate_strategy(
        &self,
        signal: &Signal,
        historical: &[PatternRecord],
        correlation_id: &CorrelationId,
        complexity_score: f64,
        engine: &'static str,
    ) -> Strategy {
        let warrants_spec = complexity_score >= self.config.min_complexity;
        let architectural = warrants_spec && documents::is_architectural(signal);

        let spec_content = warrants_spec.then(|| documents::generate_spec(signal, historical, correlation_id.as_str()));
        let adr_content = architectural.then(|| documents::generate_adr(signal));

        let decision = if warrants_spec {
            format!("complex strategy for {} via {engine} (complexity {complexity_score:.2})", signal.pattern)
        } else {
            format!("simple strategy for {} via {engine} (complexity {complexity_score:.2})", signal.pattern)
        };

        if spec_content.is_some() {
            self.record_spec();
        }
        if adr_content.is_some() {
            self.record_adr();
        }

        Strategy {
            priority: signal.priority,
            complexity: complexity_score,
            engine,
            decision,
            spec_content,
            adr_content,
            tasks: Vec::new(),
        }
    }

    /// EXTERNALIZE: writes the strategy scratch file for audit.
    async fn externalize_strategy(&self, correlation_id: &CorrelationId, strategy: &Strategy) -> Result<(), ArchitectError> {
        let content = documents::build_strategy_content(correlation_id.as_str(), strategy);
        let path = self.strategy_path(correlation_id);
        tokio::fs::write(&path, content).await.map_err(|err| ArchitectError::Io(format!("strategy write failed: {err}")))
    }

    /// RESET: removes the strategy scratch file. Missing files are not an
    /// error; this runs even after a planning failure.
    async fn cleanup_workspace(&self, correlation_id: &CorrelationId) {
        let path = self.strategy_path(correlation_id);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(correlation_id = %correlation_id, error = %err, "workspace cleanup failed");
            }
        }
    }

    /// Publishes a failure report to `telemetry_queue` at priority 10.
    async fn report_failure(&self, message: &Message, correlation_id: &CorrelationId, err: &ArchitectError) -> Result<(), ArchitectError> {
        let mut report = serde_json::Map::new();
        report.insert("status".to_owned(), serde_json::Value::String("failure".to_owned()));
        report.insert("correlation_id".to_owned(), serde_json::Value::String(correlation_id.as_str().to_owned()));
        report.insert("signal".to_owned(), message.payload.clone());
        report.insert("error".to_owned(), serde_json::Value::String(err.to_string()));
        let timestamp_text = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "unknown".to_owned());
        report.insert("timestamp".to_owned(), serde_json::Value::String(timestamp_text));

        self.bus
            .publish(self.config.telemetry_queue.clone(), serde_json::Value::Object(report), 10, Some(correlation_id.clone()))
            .await?;
        Ok(())
    }

    /// Path to the per-signal strategy scratch file.
    fn strategy_path(&self, correlation_id: &CorrelationId) -> PathBuf {
        self.workspace_dir.join(format!("{correlation_id}_strategy.md"))
    }

    /// Records one signal as having completed the cycle.
    fn record_processed(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).signals_processed += 1;
    }

    /// Records one signal as having failed planning.
    fn record_failure(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).planning_failures += 1;
    }

    /// Records one engine selection as an escalation.
    fn record_escalation(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).escalations += 1;
    }

    /// Records one spec document as generated.
    fn record_spec(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).specs_generated += 1;
    }

    /// Records one ADR document as generated.
    fn record_adr(&self) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).adrs_generated += 1;
    }

    /// Records `count` additional tasks as created.
    fn record_tasks(&self, count: usize) {
        self.stats.lock().unwrap_or_else(std::sync::PoisonError::into_inner).tasks_created += u64::try_from(count).unwrap_or(u64::MAX);
    }
}
