//! Team selection: pick the panel and its effective weights for one debate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use conclave_panel::{Proposal, Supervisor, SupervisorSnapshot};

use crate::complexity::ComplexityEstimator;
use crate::error::SelectError;
use crate::specialty::SpecialtyInferencer;
use crate::Result;

/// What the selector inferred about a proposal.
#[derive(Debug, Clone)]
pub struct ProposalProfile {
    /// Weighted domain tags.
    pub tags: std::collections::BTreeMap<String, f64>,
    /// Fraction of the tag universe touched.
    pub diversity: f64,
    /// Complexity score in `[0, 1]`.
    pub complexity: f64,
}

/// One selected panel member with its effective weight for this debate.
#[derive(Debug, Clone)]
pub struct TeamMember {
    /// The supervisor (shared, immutable).
    pub supervisor: Arc<Supervisor>,
    /// Effective weight, normalized across the team to sum to 1.
    pub weight: f64,
    /// Raw fit score this member was selected with.
    pub fit: f64,
}

/// The weighted subset of supervisors active in one debate.
///
/// Effective weights are computed per debate and never persisted back to
/// the registry.
#[derive(Debug, Clone)]
pub struct Team {
    /// Panel members, fit-descending.
    pub members: Vec<TeamMember>,
    /// Index of the lead supervisor (for ceo consensus modes).
    pub lead: Option<usize>,
}

impl Team {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the team has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Name of the lead supervisor, if one is designated.
    pub fn lead_name(&self) -> Option<&str> {
        self.lead
            .and_then(|i| self.members.get(i))
            .map(|m| m.supervisor.name())
    }

    /// Index of a member by supervisor name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.members
            .iter()
            .position(|m| m.supervisor.name() == name)
    }

    /// Designates the lead by supervisor name; no-op if absent.
    pub fn set_lead(&mut self, name: &str) {
        if let Some(index) = self.position(name) {
            self.lead = Some(index);
        }
    }
}

/// Tunables for panel composition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Greedy selection stops below this fit (padding to the minimum size
    /// ignores it).
    pub fit_floor: f64,
    /// A diversity swap may cost at most this much fit.
    pub diversity_tolerance: f64,
    /// Baseline added to specialty overlap so zero-overlap supervisors keep
    /// a positive fit. Preserves the positive-weight-sum invariant.
    pub overlap_baseline: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            fit_floor: 0.1,
            diversity_tolerance: 0.15,
            overlap_baseline: 0.05,
        }
    }
}

#[derive(Clone)]
struct Candidate {
    snapshot: SupervisorSnapshot,
    fit: f64,
}

/// Composes the panel for one debate from a registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct TeamSelector {
    inferencer: SpecialtyInferencer,
    estimator: ComplexityEstimator,
    config: SelectorConfig,
}

impl TeamSelector {
    /// Creates a selector from its three parts.
    pub fn new(
        inferencer: SpecialtyInferencer,
        estimator: ComplexityEstimator,
        config: SelectorConfig,
    ) -> Self {
        Self {
            inferencer,
            estimator,
            config,
        }
    }

    /// Infers tags, diversity, and complexity for a proposal.
    pub fn assess(&self, proposal: &Proposal) -> ProposalProfile {
        let tags = self.inferencer.infer(&proposal.files);
        let diversity = self.inferencer.diversity(&tags);
        let complexity = self.estimator.estimate(proposal, diversity);
        ProposalProfile {
            tags,
            diversity,
            complexity,
        }
    }

    /// Picks the active panel and per-supervisor weights for a debate.
    ///
    /// Ranks supervisors by fit, greedily selects to `max` or the fit floor
    /// (never fewer than `min`), swaps duplicate-specialty finalists for
    /// distinct alternatives within the configured tolerance, then
    /// normalizes effective weights to sum to 1. The top-fit member becomes
    /// the lead.
    pub fn select(
        &self,
        snapshot: &[SupervisorSnapshot],
        proposal: &Proposal,
        min: usize,
        max: usize,
    ) -> Result<Team> {
        if min == 0 || min > max {
            return Err(SelectError::InvalidBounds { min, max });
        }
        if snapshot.is_empty() {
            return Err(SelectError::EmptyRegistry);
        }
        if snapshot.len() < min {
            return Err(SelectError::NotEnoughSupervisors {
                min,
                available: snapshot.len(),
            });
        }

        let profile = self.assess(proposal);
        let mut ranked: Vec<Candidate> = snapshot
            .iter()
            .map(|snap| Candidate {
                snapshot: snap.clone(),
                fit: self.fit(snap, &profile),
            })
            .collect();
        // Fit descending, name ascending for determinism.
        ranked.sort_by(|a, b| {
            b.fit
                .partial_cmp(&a.fit)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.snapshot.supervisor.name().cmp(b.snapshot.supervisor.name()))
        });

        let above_floor = ranked
            .iter()
            .take(max)
            .take_while(|c| c.fit >= self.config.fit_floor)
            .count();
        // Pad below the floor rather than return an undersized team.
        let chosen_len = above_floor.clamp(min, max).min(ranked.len());
        let mut bench = ranked.split_off(chosen_len);
        let mut chosen = ranked;

        self.apply_diversity_bonus(&mut chosen, &mut bench);

        chosen.sort_by(|a, b| {
            b.fit
                .partial_cmp(&a.fit)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.snapshot.supervisor.name().cmp(b.snapshot.supervisor.name()))
        });

        let total_fit: f64 = chosen.iter().map(|c| c.fit).sum();
        if total_fit <= 0.0 {
            return Err(SelectError::ZeroWeight);
        }

        debug!(
            team_size = chosen.len(),
            complexity = profile.complexity,
            lead = %chosen[0].snapshot.supervisor.name(),
            "team selected"
        );

        let members = chosen
            .into_iter()
            .map(|c| TeamMember {
                supervisor: Arc::clone(&c.snapshot.supervisor),
                weight: c.fit / total_fit,
                fit: c.fit,
            })
            .collect();

        Ok(Team {
            members,
            lead: Some(0),
        })
    }

    /// Fit = (baselined specialty overlap × smoothed accuracy +
    /// complexity-adequacy term) × base weight.
    fn fit(&self, snap: &SupervisorSnapshot, profile: &ProposalProfile) -> f64 {
        let overlap: f64 = profile
            .tags
            .iter()
            .filter(|(tag, _)| snap.supervisor.specialties().contains(*tag))
            .map(|(_, weight)| weight)
            .sum();
        let overlap = self.config.overlap_baseline + overlap;
        let adequacy = profile.complexity * snap.performance.smoothed_hard_accuracy();
        (overlap * snap.performance.smoothed_accuracy() + adequacy) * snap.weight
    }

    /// Swaps duplicate-specialty finalists for distinct-specialty bench
    /// candidates while the fit cost stays within tolerance.
    fn apply_diversity_bonus(&self, chosen: &mut [Candidate], bench: &mut Vec<Candidate>) {
        loop {
            let team_sets: Vec<BTreeSet<String>> = chosen
                .iter()
                .map(|c| c.snapshot.supervisor.specialties().iter().cloned().collect())
                .collect();

            // Lowest-fit member whose specialty set another member shares.
            let duplicate = chosen
                .iter()
                .enumerate()
                .filter(|(i, _)| {
                    team_sets
                        .iter()
                        .enumerate()
                        .any(|(j, set)| j != *i && *set == team_sets[*i])
                })
                .min_by(|(_, a), (_, b)| {
                    a.fit.partial_cmp(&b.fit).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);
            let Some(dup_index) = duplicate else { break };

            // Best bench candidate with a specialty set the team lacks.
            let replacement = bench
                .iter()
                .enumerate()
                .filter(|(_, c)| {
                    let set: BTreeSet<String> =
                        c.snapshot.supervisor.specialties().iter().cloned().collect();
                    !team_sets.contains(&set)
                })
                .max_by(|(_, a), (_, b)| {
                    a.fit.partial_cmp(&b.fit).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);
            let Some(bench_index) = replacement else { break };

            if bench[bench_index].fit + self.config.diversity_tolerance < chosen[dup_index].fit {
                break;
            }

            debug!(
                out = %chosen[dup_index].snapshot.supervisor.name(),
                in_ = %bench[bench_index].snapshot.supervisor.name(),
                "diversity swap"
            );
            std::mem::swap(&mut chosen[dup_index], &mut bench[bench_index]);
        }
    }
}
