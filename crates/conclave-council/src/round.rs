//! Round types: the append-only record of one deliberation pass.

use serde::{Deserialize, Serialize};

use conclave_panel::Verdict;
use conclave_selector::Team;

/// One panel member's slot in a round.
///
/// `verdict: None` is an abstention (timeout or provider failure), which is
/// distinct from an explicit reject and excluded from vote denominators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Supervisor this slot belongs to.
    pub supervisor: String,
    /// The verdict, or `None` if the supervisor abstained.
    pub verdict: Option<Verdict>,
}

/// An ordered list of verdict slots, one per selected supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// 1-based round number.
    pub number: u32,
    /// One slot per team member, in team order.
    pub slots: Vec<Slot>,
}

impl Round {
    /// Creates an empty round with one slot per team member.
    pub fn for_team(number: u32, team: &Team) -> Self {
        Self {
            number,
            slots: team
                .members
                .iter()
                .map(|m| Slot {
                    supervisor: m.supervisor.name().to_string(),
                    verdict: None,
                })
                .collect(),
        }
    }

    /// Iterates over the verdicts that actually arrived.
    pub fn responders(&self) -> impl Iterator<Item = &Verdict> {
        self.slots.iter().filter_map(|s| s.verdict.as_ref())
    }

    /// Number of panel members that abstained this round.
    pub fn abstentions(&self) -> usize {
        self.slots.iter().filter(|s| s.verdict.is_none()).count()
    }

    /// The verdict from a named supervisor, if present.
    pub fn verdict_for(&self, supervisor: &str) -> Option<&Verdict> {
        self.slots
            .iter()
            .find(|s| s.supervisor == supervisor)
            .and_then(|s| s.verdict.as_ref())
    }
}
