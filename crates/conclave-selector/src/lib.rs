//! # Conclave Selector
//!
//! Panel composition for the Conclave council engine.
//!
//! Three pieces, leaves first:
//!
//! - [`SpecialtyInferencer`]: pure mapping from touched file paths to
//!   weighted domain tags, driven by configurable extension and directory
//!   tables.
//! - [`ComplexityEstimator`]: pure score in `[0, 1]` combining normalized
//!   file count, diff size, and tag diversity.
//! - [`TeamSelector`]: ranks registered supervisors by fit (specialty
//!   overlap × smoothed historical accuracy, plus a complexity-adequacy
//!   term), picks a panel within size bounds, applies a diversity bonus,
//!   and normalizes effective weights to sum to 1.
//!
//! Selection reads only immutable registry snapshots; nothing here mutates
//! supervisor state.

pub mod complexity;
pub mod error;
pub mod specialty;
pub mod team;

pub use complexity::{ComplexityEstimator, ComplexityWeights};
pub use error::SelectError;
pub use specialty::{SpecialtyInferencer, SpecialtyTables};
pub use team::{ProposalProfile, SelectorConfig, Team, TeamMember, TeamSelector};

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, SelectError>;
