//! The engine: registry ownership, debate lifecycle, and the audit surface.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use conclave_council::{
    ConsensusReducer, DebateEngine, DebateOptions, DebateRecord, Outcome, VetoOverride,
};
use conclave_panel::{
    ModelBackend, PerformanceRecord, Proposal, Supervisor, SupervisorRegistry,
};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Debates at or above this complexity count toward the hard-case record.
const HARD_COMPLEXITY: f64 = 0.5;

/// Receives every finished debate record.
pub trait AuditSink: Send + Sync {
    /// Called once per debate, after the decision is final.
    fn record(&self, record: &DebateRecord);
}

/// Default sink: one structured log line per finished debate.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, record: &DebateRecord) {
        info!(
            debate = %record.id,
            outcome = %record.decision.outcome,
            rounds = record.rounds.len(),
            fail_closed = record.decision.fail_closed,
            overridden = record.human_override.is_some(),
            "debate recorded"
        );
    }
}

/// Where a debate currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebateStatus {
    /// Rounds (or the veto window) still in progress.
    Running,
    /// Decided, with the final outcome.
    Finished(Outcome),
    /// The debate aborted before producing a decision.
    Failed,
}

/// Per-debate shared state between the engine and the debate task.
struct DebateSlot {
    veto_tx: Mutex<Option<oneshot::Sender<VetoOverride>>>,
    record: Mutex<Option<Result<DebateRecord, String>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// The long-lived engine owning the supervisor registry and all debates.
///
/// The registry has a single-writer discipline: debates read an immutable
/// snapshot at start, and only the engine writes (registration, weight
/// changes, and the post-decision performance update). A debate never sees
/// membership changes made after it started.
pub struct CouncilEngine {
    config: EngineConfig,
    registry: Arc<RwLock<SupervisorRegistry>>,
    debates: Mutex<HashMap<Uuid, Arc<DebateSlot>>>,
    sink: Arc<dyn AuditSink>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CouncilEngine {
    /// Creates an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Arc::new(RwLock::new(SupervisorRegistry::new())),
            debates: Mutex::new(HashMap::new()),
            sink: Arc::new(TracingSink),
        })
    }

    /// Replaces the audit sink.
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registers a supervisor over `backend` with the engine's retry policy.
    pub fn register_backend(
        &self,
        name: &str,
        specialties: &[&str],
        weight: f64,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<(), EngineError> {
        let mut supervisor =
            Supervisor::new(name, backend).with_retry(self.config.retry.to_policy());
        for tag in specialties {
            supervisor = supervisor.with_specialty(*tag);
        }
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.register_weighted(supervisor, weight)?;
        Ok(())
    }

    /// Removes a supervisor. Running debates keep their snapshot.
    pub fn deregister(&self, name: &str) -> Result<(), EngineError> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.deregister(name)?;
        Ok(())
    }

    /// Changes a supervisor's base weight for future selections.
    pub fn set_weight(&self, name: &str, weight: f64) -> Result<(), EngineError> {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.set_weight(name, weight)?;
        Ok(())
    }

    /// Performance record for one supervisor, if registered.
    pub fn performance(&self, name: &str) -> Option<PerformanceRecord> {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.performance(name)
    }

    /// Number of registered supervisors.
    pub fn supervisor_count(&self) -> usize {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.len()
    }

    /// Starts a debate with the configured default options.
    ///
    /// Must be called inside a tokio runtime; the debate runs as a spawned
    /// task and this returns immediately with its id.
    pub fn start_debate(&self, proposal: Proposal) -> Result<Uuid, EngineError> {
        self.start_debate_with(proposal, self.config.debate.to_options())
    }

    /// Starts a debate with per-debate option overrides.
    pub fn start_debate_with(
        &self,
        proposal: Proposal,
        options: DebateOptions,
    ) -> Result<Uuid, EngineError> {
        options.validate()?;
        let snapshot = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            registry.snapshot()
        };
        if snapshot.is_empty() {
            return Err(EngineError::Configuration(
                "no supervisors registered".into(),
            ));
        }

        let debate = DebateEngine::new(
            self.config.build_selector(),
            ConsensusReducer::new(self.config.consensus),
            options,
        );
        // Team composition runs once here so selection failures (too few
        // supervisors, a lead outside the team) reject the debate before
        // an id is issued or a task spawned.
        debate.compose_team(&snapshot, &proposal)?;

        let id = Uuid::new_v4();
        let (veto_tx, veto_rx) = if debate.options().human_veto_enabled {
            let (tx, rx) = oneshot::channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let slot = Arc::new(DebateSlot {
            veto_tx: Mutex::new(veto_tx),
            record: Mutex::new(None),
            task: Mutex::new(None),
        });

        let registry = Arc::clone(&self.registry);
        let sink = Arc::clone(&self.sink);
        let task_slot = Arc::clone(&slot);
        let handle = tokio::spawn(async move {
            let stored = match debate.run(id, &snapshot, proposal, veto_rx).await {
                Ok(record) => {
                    Self::apply_performance(&registry, &record);
                    sink.record(&record);
                    Ok(record)
                }
                Err(err) => {
                    warn!(debate = %id, error = %err, "debate aborted");
                    Err(err.to_string())
                }
            };
            *lock(&task_slot.record) = Some(stored);
        });
        *lock(&slot.task) = Some(handle);
        lock(&self.debates).insert(id, slot);
        Ok(id)
    }

    /// Delivers an operator ruling into an open veto window.
    pub fn submit_veto(&self, id: Uuid, ruling: VetoOverride) -> Result<(), EngineError> {
        let slot = self.slot(id)?;
        let tx = lock(&slot.veto_tx)
            .take()
            .ok_or(EngineError::VetoClosed(id))?;
        tx.send(ruling).map_err(|_| EngineError::VetoClosed(id))
    }

    /// Where a debate currently stands.
    pub fn status(&self, id: Uuid) -> Result<DebateStatus, EngineError> {
        let slot = self.slot(id)?;
        let record = lock(&slot.record);
        Ok(match &*record {
            None => DebateStatus::Running,
            Some(Ok(r)) => DebateStatus::Finished(r.decision.outcome),
            Some(Err(_)) => DebateStatus::Failed,
        })
    }

    /// The finished record, `None` while the debate is still running.
    pub fn record(&self, id: Uuid) -> Result<Option<DebateRecord>, EngineError> {
        let slot = self.slot(id)?;
        let record = lock(&slot.record);
        match &*record {
            None => Ok(None),
            Some(Ok(r)) => Ok(Some(r.clone())),
            Some(Err(message)) => Err(EngineError::Debate {
                id,
                message: message.clone(),
            }),
        }
    }

    /// Waits for a debate to finish and returns its record.
    ///
    /// Single consumer: the first caller adopts the debate task. Other
    /// callers should poll `status` or `record` instead.
    pub async fn await_decision(&self, id: Uuid) -> Result<DebateRecord, EngineError> {
        let slot = self.slot(id)?;
        // Guard must not be held across the await.
        let task = lock(&slot.task).take();
        if let Some(handle) = task {
            if let Err(err) = handle.await {
                return Err(EngineError::Debate {
                    id,
                    message: err.to_string(),
                });
            }
        }
        self.record(id)?.ok_or(EngineError::Debate {
            id,
            message: "debate finished without a record".into(),
        })
    }

    /// Drops a finished debate's retained state.
    ///
    /// Records are kept until forgotten, so long-lived callers should
    /// forget each debate once its record has been archived. A debate
    /// that is still running cannot be forgotten.
    pub fn forget(&self, id: Uuid) -> Result<(), EngineError> {
        let mut debates = lock(&self.debates);
        let slot = debates
            .get(&id)
            .cloned()
            .ok_or(EngineError::UnknownDebate(id))?;
        if lock(&slot.record).is_none() {
            return Err(EngineError::DebateRunning(id));
        }
        debates.remove(&id);
        Ok(())
    }

    fn slot(&self, id: Uuid) -> Result<Arc<DebateSlot>, EngineError> {
        lock(&self.debates)
            .get(&id)
            .cloned()
            .ok_or(EngineError::UnknownDebate(id))
    }

    /// Folds a final decision into each participant's performance record.
    ///
    /// A member's stance is their last verdict across the debate's rounds;
    /// all-round abstainers are not scored.
    fn apply_performance(registry: &Arc<RwLock<SupervisorRegistry>>, record: &DebateRecord) {
        let approved = match record.decision.outcome {
            Outcome::Approved => true,
            Outcome::Rejected => false,
            // Final records are never undecided.
            Outcome::Undecided => return,
        };
        let hard = record.complexity >= HARD_COMPLEXITY;
        let mut registry = registry.write().unwrap_or_else(PoisonError::into_inner);
        for member in &record.team {
            let stance = record
                .rounds
                .iter()
                .rev()
                .find_map(|round| round.verdict_for(&member.name));
            if let Some(verdict) = stance {
                registry.record_outcome(&member.name, verdict.approved == approved, hard);
            }
        }
    }
}
