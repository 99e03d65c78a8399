//! Supervisor registry: registration, base weights, performance records.
//!
//! The registry is the single mutable home of supervisor state. All writes
//! happen through the council manager's post-debate step; reads during
//! selection take an immutable snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::error::PanelError;
use crate::supervisor::Supervisor;
use crate::Result;

/// Rolling agreement-with-final-decision record for one supervisor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Debates this supervisor participated in (produced a verdict).
    pub debates: u64,
    /// Debates where the supervisor's final verdict matched the outcome.
    pub agreements: u64,
    /// Participations in high-complexity debates.
    pub hard_debates: u64,
    /// Agreements within high-complexity debates.
    pub hard_agreements: u64,
}

impl PerformanceRecord {
    /// Laplace-smoothed accuracy; 0.5 for a supervisor with no history.
    pub fn smoothed_accuracy(&self) -> f64 {
        (self.agreements as f64 + 1.0) / (self.debates as f64 + 2.0)
    }

    /// Smoothed accuracy restricted to high-complexity debates.
    pub fn smoothed_hard_accuracy(&self) -> f64 {
        (self.hard_agreements as f64 + 1.0) / (self.hard_debates as f64 + 2.0)
    }

    /// Records one completed debate.
    pub fn record(&mut self, agreed: bool, hard: bool) {
        self.debates += 1;
        if agreed {
            self.agreements += 1;
        }
        if hard {
            self.hard_debates += 1;
            if agreed {
                self.hard_agreements += 1;
            }
        }
    }
}

/// Immutable per-supervisor view handed to the team selector.
#[derive(Debug, Clone)]
pub struct SupervisorSnapshot {
    /// The supervisor itself (shared, immutable).
    pub supervisor: Arc<Supervisor>,
    /// Base weight at snapshot time.
    pub weight: f64,
    /// Performance record at snapshot time.
    pub performance: PerformanceRecord,
}

#[derive(Debug)]
struct Registered {
    supervisor: Arc<Supervisor>,
    weight: f64,
    performance: PerformanceRecord,
}

/// All registered supervisors, keyed by name.
///
/// `BTreeMap` keeps snapshot order deterministic, which the selector's
/// tie-breaking relies on.
#[derive(Debug, Default)]
pub struct SupervisorRegistry {
    entries: BTreeMap<String, Registered>,
}

impl SupervisorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a supervisor with the default base weight of 1.0.
    pub fn register(&mut self, supervisor: Supervisor) -> Result<()> {
        self.register_weighted(supervisor, 1.0)
    }

    /// Registers a supervisor with an explicit base weight.
    pub fn register_weighted(&mut self, supervisor: Supervisor, weight: f64) -> Result<()> {
        let name = supervisor.name().to_string();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(PanelError::InvalidWeight { name, weight });
        }
        if self.entries.contains_key(&name) {
            return Err(PanelError::DuplicateSupervisor(name));
        }
        info!(supervisor = %name, provider = %supervisor.provider(), weight, "supervisor registered");
        self.entries.insert(
            name,
            Registered {
                supervisor: Arc::new(supervisor),
                weight,
                performance: PerformanceRecord::default(),
            },
        );
        Ok(())
    }

    /// Removes a supervisor. Takes effect on the next selection.
    pub fn deregister(&mut self, name: &str) -> Result<()> {
        match self.entries.remove(name) {
            Some(_) => {
                info!(supervisor = %name, "supervisor deregistered");
                Ok(())
            }
            None => Err(PanelError::UnknownSupervisor(name.to_string())),
        }
    }

    /// Updates a supervisor's base weight.
    pub fn set_weight(&mut self, name: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(PanelError::InvalidWeight {
                name: name.to_string(),
                weight,
            });
        }
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.weight = weight;
                Ok(())
            }
            None => Err(PanelError::UnknownSupervisor(name.to_string())),
        }
    }

    /// Records a debate result for one supervisor.
    ///
    /// Called exactly once per participating supervisor per debate, after
    /// the debate is final.
    pub fn record_outcome(&mut self, name: &str, agreed: bool, hard: bool) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.performance.record(agreed, hard);
        }
    }

    /// Performance record for one supervisor, if registered.
    pub fn performance(&self, name: &str) -> Option<PerformanceRecord> {
        self.entries.get(name).map(|e| e.performance)
    }

    /// Number of registered supervisors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Immutable snapshot of every registered supervisor, in name order.
    pub fn snapshot(&self) -> Vec<SupervisorSnapshot> {
        self.entries
            .values()
            .map(|entry| SupervisorSnapshot {
                supervisor: Arc::clone(&entry.supervisor),
                weight: entry.weight,
                performance: entry.performance,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, BackendReply, ModelBackend};
    use crate::proposal::Proposal;
    use crate::verdict::Confidence;
    use async_trait::async_trait;

    struct Stub;

    #[async_trait]
    impl ModelBackend for Stub {
        fn provider(&self) -> &str {
            "stub"
        }

        async fn ask(&self, _proposal: &Proposal) -> std::result::Result<BackendReply, BackendError> {
            Ok(BackendReply::new(true, Confidence::medium(), "ok"))
        }
    }

    fn supervisor(name: &str) -> Supervisor {
        Supervisor::new(name, Arc::new(Stub))
    }

    #[test]
    fn test_register_and_snapshot() {
        let mut registry = SupervisorRegistry::new();
        registry.register(supervisor("beta")).unwrap();
        registry.register(supervisor("alpha")).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        // Name order, deterministic.
        assert_eq!(snapshot[0].supervisor.name(), "alpha");
        assert!((snapshot[0].weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = SupervisorRegistry::new();
        registry.register(supervisor("alpha")).unwrap();
        let err = registry.register(supervisor("alpha")).unwrap_err();
        assert!(matches!(err, PanelError::DuplicateSupervisor(_)));
    }

    #[test]
    fn test_register_invalid_weight() {
        let mut registry = SupervisorRegistry::new();
        let err = registry
            .register_weighted(supervisor("alpha"), 0.0)
            .unwrap_err();
        assert!(matches!(err, PanelError::InvalidWeight { .. }));
    }

    #[test]
    fn test_deregister() {
        let mut registry = SupervisorRegistry::new();
        registry.register(supervisor("alpha")).unwrap();
        registry.deregister("alpha").unwrap();
        assert!(registry.is_empty());
        assert!(registry.deregister("alpha").is_err());
    }

    #[test]
    fn test_performance_smoothing() {
        let record = PerformanceRecord::default();
        // No history: neutral prior.
        assert!((record.smoothed_accuracy() - 0.5).abs() < f64::EPSILON);

        let mut record = PerformanceRecord::default();
        record.record(true, false);
        record.record(true, true);
        record.record(false, true);
        assert_eq!(record.debates, 3);
        assert_eq!(record.agreements, 2);
        assert_eq!(record.hard_debates, 2);
        assert_eq!(record.hard_agreements, 1);
        assert!((record.smoothed_accuracy() - 3.0 / 5.0).abs() < f64::EPSILON);
        assert!((record.smoothed_hard_accuracy() - 2.0 / 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_outcome_roundtrip() {
        let mut registry = SupervisorRegistry::new();
        registry.register(supervisor("alpha")).unwrap();
        registry.record_outcome("alpha", true, false);
        registry.record_outcome("ghost", true, false); // unknown: no-op

        let perf = registry.performance("alpha").unwrap();
        assert_eq!(perf.debates, 1);
        assert_eq!(perf.agreements, 1);
    }

    #[test]
    fn test_set_weight() {
        let mut registry = SupervisorRegistry::new();
        registry.register(supervisor("alpha")).unwrap();
        registry.set_weight("alpha", 2.5).unwrap();
        assert!((registry.snapshot()[0].weight - 2.5).abs() < f64::EPSILON);
        assert!(registry.set_weight("alpha", -1.0).is_err());
        assert!(registry.set_weight("ghost", 1.0).is_err());
    }
}
