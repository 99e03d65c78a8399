//! # Conclave Council
//!
//! The deliberation core of the Conclave engine: debate rounds, consensus
//! reduction, and the bounded council state machine.
//!
//! ## Flow
//!
//! ```text
//! Proposal ──► TeamSelector ──► RoundCoordinator ──► ConsensusReducer
//!                  ▲                (fan-out)            (8 modes)
//!                  │                                        │
//!                  └──── undecided, rounds remain ◄─────────┤
//!                                                           ▼
//!                                          [human veto window] ──► Final
//! ```
//!
//! Supervisor calls within a round run concurrently, one task per panel
//! member; rounds themselves are strictly sequential. Every wait is
//! bounded: the round deadline (plus a grace margin for in-flight
//! collection), the round limit (fail-closed to rejection), and the veto
//! window (timeout auto-confirms the computed outcome).

pub mod consensus;
pub mod coordinator;
pub mod debate;
pub mod error;
pub mod round;

pub use consensus::{ConsensusConfig, ConsensusMode, ConsensusReducer, Decision, Outcome};
pub use coordinator::RoundCoordinator;
pub use debate::{DebateEngine, DebateOptions, DebateRecord, TeamSummary, VetoOverride};
pub use error::CouncilError;
pub use round::{Round, Slot};

/// Result type for council operations.
pub type Result<T> = std::result::Result<T, CouncilError>;
