//! Error types for the engine crate.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the engine's public API.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration (or a per-debate override) is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No debate with this id was ever started.
    #[error("unknown debate {0}")]
    UnknownDebate(Uuid),

    /// The debate's veto window is not open (never was, already used, or
    /// already elapsed).
    #[error("veto window for debate {0} is closed")]
    VetoClosed(Uuid),

    /// The operation needs the debate to have finished first.
    #[error("debate {0} is still running")]
    DebateRunning(Uuid),

    /// Registry operation failed.
    #[error(transparent)]
    Panel(#[from] conclave_panel::PanelError),

    /// The debate task itself failed.
    #[error("debate {id} failed: {message}")]
    Debate { id: Uuid, message: String },
}

impl From<conclave_council::CouncilError> for EngineError {
    fn from(err: conclave_council::CouncilError) -> Self {
        Self::Configuration(err.to_string())
    }
}
