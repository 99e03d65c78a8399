//! The debate state machine: select, deliberate, reduce, and finalize.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use conclave_panel::{Proposal, SupervisorSnapshot};
use conclave_selector::{Team, TeamSelector};

use crate::consensus::{ConsensusMode, ConsensusReducer, Decision, Outcome};
use crate::coordinator::RoundCoordinator;
use crate::error::CouncilError;
use crate::round::Round;
use crate::Result;

/// Tunable parameters for a single debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateOptions {
    /// Consensus policy for every round of this debate.
    pub mode: ConsensusMode,
    /// Smallest acceptable team.
    pub min_team_size: usize,
    /// Largest acceptable team.
    pub max_team_size: usize,
    /// Hard cap on rounds; hitting it fails closed to rejection.
    pub max_rounds: u32,
    /// Per-round wall-clock budget for each supervisor call.
    pub round_deadline: Duration,
    /// Extra collection margin after the deadline.
    pub round_grace: Duration,
    /// Drop previous-round abstainers before re-debating.
    pub reselect_between_rounds: bool,
    /// Open a veto window between the computed decision and the final one.
    pub human_veto_enabled: bool,
    /// How long the veto window stays open.
    pub human_veto_window: Duration,
    /// Names a lead supervisor; `None` takes the highest-fit member.
    pub lead: Option<String>,
}

impl Default for DebateOptions {
    fn default() -> Self {
        Self {
            mode: ConsensusMode::SimpleMajority,
            min_team_size: 2,
            max_team_size: 5,
            max_rounds: 3,
            round_deadline: Duration::from_secs(30),
            round_grace: Duration::from_millis(500),
            reselect_between_rounds: false,
            human_veto_enabled: false,
            human_veto_window: Duration::from_secs(30),
            lead: None,
        }
    }
}

impl DebateOptions {
    /// Rejects option sets that could never produce a debate.
    pub fn validate(&self) -> Result<()> {
        if self.min_team_size == 0 {
            return Err(CouncilError::Configuration(
                "min_team_size must be at least 1".into(),
            ));
        }
        if self.min_team_size > self.max_team_size {
            return Err(CouncilError::Configuration(format!(
                "min_team_size {} exceeds max_team_size {}",
                self.min_team_size, self.max_team_size
            )));
        }
        if self.max_rounds == 0 {
            return Err(CouncilError::Configuration(
                "max_rounds must be at least 1".into(),
            ));
        }
        if self.round_deadline.is_zero() {
            return Err(CouncilError::Configuration(
                "round_deadline must be positive".into(),
            ));
        }
        if self.human_veto_enabled && self.human_veto_window.is_zero() {
            return Err(CouncilError::Configuration(
                "human_veto_window must be positive when vetoes are enabled".into(),
            ));
        }
        Ok(())
    }
}

/// A human operator's ruling, delivered inside the veto window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VetoOverride {
    /// The outcome the operator imposes.
    pub approved: bool,
    /// Who ruled.
    pub operator: String,
    /// Why.
    pub reason: String,
}

/// One panel seat as recorded in the debate output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    pub name: String,
    pub weight: f64,
    pub lead: bool,
}

impl TeamSummary {
    fn from_team(team: &Team) -> Vec<Self> {
        team.members
            .iter()
            .enumerate()
            .map(|(index, member)| Self {
                name: member.supervisor.name().to_string(),
                weight: member.weight,
                lead: team.lead == Some(index),
            })
            .collect()
    }
}

/// The complete, serializable history of one debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRecord {
    /// Unique debate id.
    pub id: Uuid,
    /// What was debated.
    pub proposal: Proposal,
    /// The final panel composition.
    pub team: Vec<TeamSummary>,
    /// Estimated proposal complexity in `[0, 1]`.
    pub complexity: f64,
    /// Every round, in order, including abstentions.
    pub rounds: Vec<Round>,
    /// The final decision.
    pub decision: Decision,
    /// The operator ruling, when one arrived in time.
    pub human_override: Option<VetoOverride>,
}

/// Runs debates end to end: team selection, bounded rounds, consensus
/// reduction, and the optional veto window.
#[derive(Debug, Clone)]
pub struct DebateEngine {
    selector: TeamSelector,
    reducer: ConsensusReducer,
    options: DebateOptions,
}

impl DebateEngine {
    /// Creates an engine from its three collaborators.
    pub fn new(selector: TeamSelector, reducer: ConsensusReducer, options: DebateOptions) -> Self {
        Self {
            selector,
            reducer,
            options,
        }
    }

    /// The options this engine runs with.
    pub fn options(&self) -> &DebateOptions {
        &self.options
    }

    /// Selects and configures the panel for a debate over `snapshot`.
    ///
    /// Every configuration failure (empty registry, minimum above the
    /// registered count, a designated lead outside the selected team)
    /// surfaces here, so callers can fail fast before spawning anything.
    pub fn compose_team(
        &self,
        snapshot: &[SupervisorSnapshot],
        proposal: &Proposal,
    ) -> Result<Team> {
        let mut team = self.selector.select(
            snapshot,
            proposal,
            self.options.min_team_size,
            self.options.max_team_size,
        )?;
        if let Some(name) = &self.options.lead {
            if team.position(name).is_none() {
                return Err(CouncilError::Configuration(format!(
                    "designated lead '{name}' is not on the selected team"
                )));
            }
            team.set_lead(name);
        }
        Ok(team)
    }

    /// Debates `proposal` in front of the supervisors in `snapshot` and
    /// returns the full record.
    ///
    /// The caller owns the debate id so the decision stays addressable
    /// while the debate runs. `veto` is the operator's channel; it only
    /// matters when the options enable the veto window. Dropping the
    /// sender, or letting the window elapse, confirms the computed outcome.
    pub async fn run(
        &self,
        id: Uuid,
        snapshot: &[SupervisorSnapshot],
        proposal: Proposal,
        veto: Option<oneshot::Receiver<VetoOverride>>,
    ) -> Result<DebateRecord> {
        self.options.validate()?;

        let profile = self.selector.assess(&proposal);
        let mut team = self.compose_team(snapshot, &proposal)?;

        info!(
            debate = %id,
            team_size = team.len(),
            complexity = profile.complexity,
            mode = %self.options.mode,
            "debate opened"
        );

        let coordinator = RoundCoordinator::new(self.options.round_deadline, self.options.round_grace);
        let mut rounds: Vec<Round> = Vec::new();

        let mut decision = loop {
            let number = rounds.len() as u32 + 1;
            let round = coordinator.run_round(&team, &proposal, number).await;
            let decision = self.reducer.reduce(&round, &team, self.options.mode);
            debug!(
                debate = %id,
                round = number,
                outcome = %decision.outcome,
                score = decision.score,
                "round reduced"
            );
            if decision.outcome != Outcome::Undecided {
                rounds.push(round);
                break decision;
            }
            if number >= self.options.max_rounds {
                warn!(
                    debate = %id,
                    rounds = number,
                    "round limit reached without consensus, failing closed"
                );
                rounds.push(round);
                break Decision {
                    outcome: Outcome::Rejected,
                    fail_closed: true,
                    ..decision
                };
            }
            if self.options.reselect_between_rounds {
                self.drop_abstainers(&mut team, &round);
            }
            rounds.push(round);
        };

        let human_override = if self.options.human_veto_enabled {
            self.await_veto(id, veto, &mut decision).await
        } else {
            None
        };

        info!(
            debate = %id,
            outcome = %decision.outcome,
            fail_closed = decision.fail_closed,
            overridden = human_override.is_some(),
            "debate closed"
        );

        Ok(DebateRecord {
            id,
            proposal,
            team: TeamSummary::from_team(&team),
            complexity: profile.complexity,
            rounds,
            decision,
            human_override,
        })
    }

    /// Holds the computed decision open for an operator ruling.
    async fn await_veto(
        &self,
        id: Uuid,
        veto: Option<oneshot::Receiver<VetoOverride>>,
        decision: &mut Decision,
    ) -> Option<VetoOverride> {
        let rx = veto?;
        match tokio::time::timeout(self.options.human_veto_window, rx).await {
            Ok(Ok(ruling)) => {
                info!(
                    debate = %id,
                    operator = %ruling.operator,
                    approved = ruling.approved,
                    "human override applied"
                );
                decision.outcome = if ruling.approved {
                    Outcome::Approved
                } else {
                    Outcome::Rejected
                };
                Some(ruling)
            }
            Ok(Err(_)) => {
                debug!(debate = %id, "veto channel closed, decision stands");
                None
            }
            Err(_) => {
                debug!(debate = %id, "veto window elapsed, decision stands");
                None
            }
        }
    }

    /// Drops members that abstained last round, as long as the team stays
    /// above the minimum size. Remaining weights are renormalized over fit.
    fn drop_abstainers(&self, team: &mut Team, last_round: &Round) {
        let responders: BTreeSet<&str> = last_round
            .responders()
            .map(|v| v.supervisor.as_str())
            .collect();
        let keeping = team
            .members
            .iter()
            .filter(|m| responders.contains(m.supervisor.name()))
            .count();
        if keeping == team.len() || keeping < self.options.min_team_size {
            return;
        }

        let lead_name = team.lead_name().map(str::to_string);
        team.members
            .retain(|m| responders.contains(m.supervisor.name()));

        let total_fit: f64 = team.members.iter().map(|m| m.fit).sum();
        if total_fit > 0.0 {
            for member in &mut team.members {
                member.weight = member.fit / total_fit;
            }
        }

        team.lead = Some(0);
        if let Some(name) = lead_name {
            team.set_lead(&name);
        }
        debug!(team_size = team.len(), "abstainers dropped before next round");
    }
}
