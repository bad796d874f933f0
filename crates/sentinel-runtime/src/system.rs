// crates/sentinel-runtime/src/system.rs
// ============================================================================
// Module: System
// Description: The process-wide composition root.
// Purpose: Open every durable handle once, construct each agent over shared
//          references to them, and own the spawn/shutdown lifecycle, so no
//          agent ever reaches for a singleton.
// Dependencies: sentinel-architect, sentinel-bus, sentinel-config,
//               sentinel-detector, sentinel-hitl, sentinel-patterns,
//               sentinel-router, sentinel-store, sentinel-witness, tokio,
//               tracing
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use sentinel_architect::Architect;
use sentinel_architect::ArchitectError;
use sentinel_bus::MessageBus;
use sentinel_config::SystemConfig;
use sentinel_detector::PatternDetector;
use sentinel_hitl::HitlProtocol;
use sentinel_patterns::PatternStore;
use sentinel_router::HealingExecutor;
use sentinel_router::Router;
use sentinel_router::RouterError;
use sentinel_store::KvStore;
use sentinel_witness::Witness;
use sentinel_witness::WitnessError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::SystemError;

/// Read-connection pool size handed to every SQLite-backed collaborator.
const READ_POOL_SIZE: usize = 4;

/// Filename of the single SQLite database the store, bus, and HITL table
/// share, each under its own table name.
const DATABASE_FILE: &str = "sentinel.db";

/// Every durable handle the agents are built over, opened once and shared
/// by reference.
///
/// Dropping a `System` drops its last `Arc` to each handle, closing the
/// underlying SQLite connections; there is no separate `close` step.
pub struct System {
    bus: Arc<MessageBus>,
    patterns: Arc<PatternStore>,
    detector: Arc<PatternDetector>,
    hitl: Arc<HitlProtocol>,
    config: SystemConfig,
}

/// Joinable handles for every task [`System::spawn_agents`] started, plus
/// the stop signal that cancels all of them together.
pub struct AgentHandles {
    stop: watch::Sender<bool>,
    witness: JoinHandle<Result<(), WitnessError>>,
    architect: JoinHandle<Result<(), ArchitectError>>,
    router: Option<JoinHandle<Result<(), RouterError>>>,
}

impl System {
    /// Opens the K/V store, message bus, and HITL question table under
    /// `data_dir`, then constructs the pattern store and detector over
    /// them.
    ///
    /// `data_dir` is supplied separately from `config`, the same split
    /// every collaborator's own `open` draws between a filesystem location
    /// and its typed tunables.
    ///
    /// # Errors
    /// Returns [`SystemError::Io`] if `data_dir` cannot be created, or the
    /// wrapped collaborator error if opening any durable handle fails. No
    /// partially-open system is returned.
    pub fn open(data_dir: &Path, config: SystemConfig) -> Result<Self, SystemError> {
        std::fs::create_dir_all(data_dir).map_err(|err| SystemError::Io(err.to_string()))?;
        let path = data_dir.join(DATABASE_FILE);

        let store = KvStore::open(&path, &config.store, READ_POOL_SIZE)?;
        let bus = Arc::new(MessageBus::open(&path, &config.bus, READ_POOL_SIZE)?);
        let hitl = Arc::new(HitlProtocol::open(&path, &config.hitl, Arc::clone(&bus), READ_POOL_SIZE)?);
        let patterns = Arc::new(PatternStore::new(store));
        let detector = Arc::new(PatternDetector::new(config.detector.min_confidence));

        Ok(Self {
            bus,
            patterns,
            detector,
            hitl,
            config,
        })
    }

    /// The message bus, shared by every spawned agent and by external
    /// callers that publish directly onto a queue (e.g. seeding
    /// `telemetry_stream` in a test).
    #[must_use]
    pub fn bus(&self) -> Arc<MessageBus> {
        Arc::clone(&self.bus)
    }

    /// The pattern store, for callers that want to inspect learned
    /// patterns without going through an agent.
    #[must_use]
    pub fn patterns(&self) -> Arc<PatternStore> {
        Arc::clone(&self.patterns)
    }

    /// The HITL protocol, for callers that submit or wait on questions
    /// directly.
    #[must_use]
    pub fn hitl(&self) -> Arc<HitlProtocol> {
        Arc::clone(&self.hitl)
    }

    /// Spawns the WITNESS and ARCHITECT loops as `tokio` tasks, and the
    /// event router as well if `healing_executor` is given.
    ///
    /// The router is wired to WITNESS's own `telemetry_queue`, observing
    /// the same raw stream WITNESS classifies, rather than a queue of its
    /// own.
    #[must_use]
    pub fn spawn_agents(&self, healing_executor: Option<Arc<dyn HealingExecutor>>) -> AgentHandles {
        let (stop_tx, stop_rx) = watch::channel(false);

        let witness = Witness::new(Arc::clone(&self.bus), Arc::clone(&self.patterns), Arc::clone(&self.detector), self.config.witness.clone());
        let witness_stop = stop_rx.clone();
        let witness = tokio::spawn(async move { witness.run(witness_stop).await });

        let architect = Architect::new(Arc::clone(&self.bus), Arc::clone(&self.patterns), self.config.architect.clone());
        let architect_stop = stop_rx.clone();
        let architect = tokio::spawn(async move { architect.run(architect_stop).await });

        let router = healing_executor.map(|executor| {
            let router = Router::new(Arc::clone(&self.bus), Arc::clone(&self.patterns), self.config.router.clone(), self.config.witness.telemetry_queue.clone(), executor);
            let router_stop = stop_rx.clone();
            tokio::spawn(async move { router.run(router_stop).await })
        });

        AgentHandles {
            stop: stop_tx,
            witness,
            architect,
            router,
        }
    }

    /// Signals cancellation to every task in `handles` and joins them,
    /// logging any task that panicked or returned an error rather than
    /// propagating it; a misbehaving agent never prevents the rest of
    /// shutdown from completing.
    pub async fn shutdown(self, handles: AgentHandles) {
        let _ = handles.stop.send(true);

        match handles.witness.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "witness loop exited with an error"),
            Err(err) => tracing::error!(error = %err, "witness task panicked"),
        }

        match handles.architect.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "architect loop exited with an error"),
            Err(err) => tracing::error!(error = %err, "architect task panicked"),
        }

        if let Some(router) = handles.router {
            match router.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(error = %err, "router loop exited with an error"),
                Err(err) => tracing::error!(error = %err, "router task panicked"),
            }
        }
    }
}
