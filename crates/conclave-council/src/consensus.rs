//! Consensus reduction: from a round of verdicts to a single decision.
//!
//! Eight policies operate over the verdicts actually present; abstentions
//! are excluded from denominators by default. After every mode, the dissent
//! rule runs: a responder opposing the outcome at high confidence blocks
//! auto-approval, so a lone confident objector cannot be steamrolled by a
//! weighted or majority count.

use serde::{Deserialize, Serialize};
use std::fmt;

use conclave_panel::Verdict;
use conclave_selector::Team;

use crate::round::Round;

/// The consensus policy applied to a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsensusMode {
    /// Approved if approvals outnumber rejections among responders.
    SimpleMajority,
    /// Approved if approvals reach 2/3 of responders.
    Supermajority,
    /// Approved only if every responder approved.
    Unanimous,
    /// Approved if confidence-weighted approval mass reaches the threshold.
    Weighted,
    /// The lead supervisor's verdict is the outcome; lead abstention falls
    /// back to simple majority.
    CeoOverride,
    /// Simple majority, but the lead's explicit reject always forces
    /// rejection.
    CeoVeto,
    /// Approved only if both the lead and the simple majority approve.
    HybridCeoMajority,
    /// Confidence acts as rank weight; the weaker side is eliminated until
    /// one side holds an absolute majority of remaining weight.
    RankedChoice,
}

impl fmt::Display for ConsensusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SimpleMajority => "simple-majority",
            Self::Supermajority => "supermajority",
            Self::Unanimous => "unanimous",
            Self::Weighted => "weighted",
            Self::CeoOverride => "ceo-override",
            Self::CeoVeto => "ceo-veto",
            Self::HybridCeoMajority => "hybrid-ceo-majority",
            Self::RankedChoice => "ranked-choice",
        };
        write!(f, "{name}")
    }
}

/// The reduction result for a debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The panel accepts the proposal.
    Approved,
    /// The panel rejects the proposal.
    Rejected,
    /// No decision this round; the debate may continue.
    Undecided,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Undecided => write!(f, "undecided"),
        }
    }
}

/// The immutable output of one reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Final outcome after the dissent rule.
    pub outcome: Outcome,
    /// Consensus mode that produced it.
    pub mode: ConsensusMode,
    /// Aggregate approval score (mode-specific ratio in `[0, 1]`).
    pub score: f64,
    /// Responders who opposed the computed outcome at high confidence.
    pub dissenters: Vec<String>,
    /// True only when the round limit forced a rejection.
    pub fail_closed: bool,
}

/// Knobs for the reducer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// A dissenting verdict blocks approval only above this confidence.
    pub dissent_threshold: f64,
    /// Whether a present abstention prevents unanimity.
    pub abstention_blocks_unanimous: bool,
    /// Whether abstentions count toward the supermajority denominator.
    pub count_abstentions: bool,
    /// Approval ratio required by supermajority mode.
    pub supermajority_threshold: f64,
    /// Weighted approval mass required by weighted mode.
    pub weighted_threshold: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            dissent_threshold: 0.7,
            abstention_blocks_unanimous: false,
            count_abstentions: false,
            supermajority_threshold: 2.0 / 3.0,
            weighted_threshold: 0.5,
        }
    }
}

/// Applies a consensus policy to a round of verdicts.
///
/// Reduction is order-independent: it only counts, sums, and selects by
/// (confidence, name) keys, never by arrival position.
#[derive(Debug, Clone, Default)]
pub struct ConsensusReducer {
    config: ConsensusConfig,
}

impl ConsensusReducer {
    /// Creates a reducer with the given configuration.
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Reduces one round under `mode` and applies the dissent rule.
    pub fn reduce(&self, round: &Round, team: &Team, mode: ConsensusMode) -> Decision {
        let responders: Vec<&Verdict> = round.responders().collect();

        let (raw, score) = match mode {
            ConsensusMode::SimpleMajority => Self::simple_majority(&responders),
            ConsensusMode::Supermajority => self.supermajority(round, &responders),
            ConsensusMode::Unanimous => self.unanimous(round, &responders),
            ConsensusMode::Weighted => self.weighted(round, team),
            ConsensusMode::CeoOverride => Self::ceo_override(round, team, &responders),
            ConsensusMode::CeoVeto => Self::ceo_veto(round, team, &responders),
            ConsensusMode::HybridCeoMajority => Self::hybrid(round, team, &responders),
            ConsensusMode::RankedChoice => Self::ranked_choice(&responders),
        };

        let dissenters = self.dissenters(&responders, raw);
        let lead_rules = matches!(mode, ConsensusMode::CeoOverride | ConsensusMode::CeoVeto);
        let outcome = if raw == Outcome::Approved && !dissenters.is_empty() && !lead_rules {
            // Strong rejection blocks auto-approval.
            Outcome::Undecided
        } else {
            raw
        };

        Decision {
            outcome,
            mode,
            score,
            dissenters,
            fail_closed: false,
        }
    }

    /// Responders disagreeing with `outcome` above the dissent threshold.
    fn dissenters(&self, responders: &[&Verdict], outcome: Outcome) -> Vec<String> {
        let opposing = match outcome {
            Outcome::Approved => false,
            Outcome::Rejected => true,
            Outcome::Undecided => return Vec::new(),
        };
        let mut names: Vec<String> = responders
            .iter()
            .filter(|v| v.approved == opposing && v.confidence.value() > self.config.dissent_threshold)
            .map(|v| v.supervisor.clone())
            .collect();
        names.sort();
        names
    }

    fn simple_majority(responders: &[&Verdict]) -> (Outcome, f64) {
        if responders.is_empty() {
            return (Outcome::Undecided, 0.0);
        }
        let approvals = responders.iter().filter(|v| v.approved).count();
        let rejections = responders.len() - approvals;
        let score = approvals as f64 / responders.len() as f64;
        let outcome = match approvals.cmp(&rejections) {
            std::cmp::Ordering::Greater => Outcome::Approved,
            std::cmp::Ordering::Less => Outcome::Rejected,
            std::cmp::Ordering::Equal => Outcome::Undecided,
        };
        (outcome, score)
    }

    fn supermajority(&self, round: &Round, responders: &[&Verdict]) -> (Outcome, f64) {
        let denominator = if self.config.count_abstentions {
            round.slots.len()
        } else {
            responders.len()
        };
        if denominator == 0 {
            return (Outcome::Undecided, 0.0);
        }
        let approvals = responders.iter().filter(|v| v.approved).count() as f64;
        let rejections = responders.iter().filter(|v| !v.approved).count() as f64;
        let approval_ratio = approvals / denominator as f64;
        let rejection_ratio = rejections / denominator as f64;

        let outcome = if approval_ratio >= self.config.supermajority_threshold {
            Outcome::Approved
        } else if rejection_ratio >= self.config.supermajority_threshold {
            Outcome::Rejected
        } else {
            Outcome::Undecided
        };
        (outcome, approval_ratio)
    }

    fn unanimous(&self, round: &Round, responders: &[&Verdict]) -> (Outcome, f64) {
        if responders.is_empty() {
            return (Outcome::Undecided, 0.0);
        }
        let approvals = responders.iter().filter(|v| v.approved).count();
        let score = approvals as f64 / responders.len() as f64;
        if approvals < responders.len() {
            return (Outcome::Rejected, score);
        }
        if round.abstentions() > 0 && self.config.abstention_blocks_unanimous {
            return (Outcome::Undecided, score);
        }
        (Outcome::Approved, score)
    }

    fn weighted(&self, round: &Round, team: &Team) -> (Outcome, f64) {
        let mut total_weight = 0.0;
        let mut approval_mass = 0.0;
        for member in &team.members {
            let Some(verdict) = round.verdict_for(member.supervisor.name()) else {
                continue;
            };
            total_weight += member.weight;
            if verdict.approved {
                approval_mass += member.weight * verdict.confidence.value();
            }
        }
        if total_weight <= 0.0 {
            return (Outcome::Undecided, 0.0);
        }
        let score = approval_mass / total_weight;
        let outcome = if score >= self.config.weighted_threshold {
            Outcome::Approved
        } else {
            Outcome::Rejected
        };
        (outcome, score)
    }

    fn lead_verdict<'a>(round: &'a Round, team: &Team) -> Option<&'a Verdict> {
        team.lead_name().and_then(|name| round.verdict_for(name))
    }

    fn ceo_override(round: &Round, team: &Team, responders: &[&Verdict]) -> (Outcome, f64) {
        match Self::lead_verdict(round, team) {
            Some(verdict) => {
                let outcome = if verdict.approved {
                    Outcome::Approved
                } else {
                    Outcome::Rejected
                };
                (outcome, verdict.confidence.value())
            }
            // Lead abstained: fall back to the rest of the panel.
            None => Self::simple_majority(responders),
        }
    }

    fn ceo_veto(round: &Round, team: &Team, responders: &[&Verdict]) -> (Outcome, f64) {
        let (mut outcome, score) = Self::simple_majority(responders);
        if let Some(verdict) = Self::lead_verdict(round, team) {
            if !verdict.approved {
                outcome = Outcome::Rejected;
            }
        }
        (outcome, score)
    }

    fn hybrid(round: &Round, team: &Team, responders: &[&Verdict]) -> (Outcome, f64) {
        let (majority, score) = Self::simple_majority(responders);
        let lead_approved = Self::lead_verdict(round, team)
            .map(|v| v.approved)
            .unwrap_or(false);
        let outcome = if lead_approved && majority == Outcome::Approved {
            Outcome::Approved
        } else {
            Outcome::Rejected
        };
        (outcome, score)
    }

    fn ranked_choice(responders: &[&Verdict]) -> (Outcome, f64) {
        let mut remaining: Vec<&Verdict> = responders.to_vec();
        loop {
            if remaining.is_empty() {
                return (Outcome::Undecided, 0.0);
            }
            let total: f64 = remaining.iter().map(|v| v.confidence.value()).sum();
            let approve: f64 = remaining
                .iter()
                .filter(|v| v.approved)
                .map(|v| v.confidence.value())
                .sum();
            let reject = total - approve;

            if approve > reject {
                return (Outcome::Approved, approve / total);
            }
            if reject > approve {
                return (Outcome::Rejected, approve / total);
            }
            // Exact tie: eliminate the lowest-confidence verdict
            // (name tie-break) and re-tally.
            let weakest = remaining
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.confidence
                        .value()
                        .partial_cmp(&b.confidence.value())
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.supervisor.cmp(&b.supervisor))
                })
                .map(|(i, _)| i);
            match weakest {
                Some(index) => {
                    remaining.remove(index);
                }
                None => return (Outcome::Undecided, 0.0),
            }
        }
    }
}
