//! Round coordination: concurrent fan-out with a hard deadline.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use conclave_panel::Proposal;
use conclave_selector::Team;

use crate::round::{Round, Slot};

/// Runs one debate round: one concurrent `evaluate` per panel member.
///
/// Each call is bounded by the round deadline; collection is bounded by the
/// deadline plus a small grace margin for in-flight results. Calls that
/// neither return nor fail in time are abstentions; a late-arriving
/// response is discarded, never retroactively applied.
#[derive(Debug, Clone)]
pub struct RoundCoordinator {
    deadline: Duration,
    grace: Duration,
}

impl RoundCoordinator {
    /// Creates a coordinator with the given round deadline and grace margin.
    pub fn new(deadline: Duration, grace: Duration) -> Self {
        Self { deadline, grace }
    }

    /// Queries the whole panel concurrently and collects what arrives.
    pub async fn run_round(&self, team: &Team, proposal: &Proposal, number: u32) -> Round {
        let mut round = Round::for_team(number, team);
        let mut tasks = JoinSet::new();

        for (index, member) in team.members.iter().enumerate() {
            let supervisor = Arc::clone(&member.supervisor);
            let proposal = proposal.clone();
            let deadline = self.deadline;
            tasks.spawn(async move { (index, supervisor.evaluate(&proposal, deadline).await) });
        }

        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, Ok(verdict))) => {
                        round.slots[index].verdict = Some(verdict);
                    }
                    Ok((index, Err(err))) => {
                        debug!(
                            round = number,
                            supervisor = %round.slots[index].supervisor,
                            error = %err,
                            "supervisor abstained"
                        );
                    }
                    Err(err) => {
                        warn!(round = number, error = %err, "evaluation task failed");
                    }
                }
            }
        };

        if tokio::time::timeout(self.deadline + self.grace, collect)
            .await
            .is_err()
        {
            warn!(
                round = number,
                deadline_ms = self.deadline.as_millis() as u64,
                "round deadline elapsed with evaluations still in flight"
            );
        }
        // The deadline bounds the wait, not the provider call. Stragglers
        // keep running detached; their results are discarded on arrival.
        tasks.detach_all();

        debug!(
            round = number,
            responders = round.responders().count(),
            abstentions = round.abstentions(),
            "round collected"
        );
        round
    }
}
