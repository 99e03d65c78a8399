//! Error types for the panel crate.

use thiserror::Error;

/// Errors from a single supervisor evaluation.
///
/// Every variant is treated by the round coordinator as an abstention:
/// the supervisor simply has no verdict this round. None of these are
/// surfaced to the engine caller.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The provider returned a non-transient error.
    #[error("provider '{provider}' failed: {message}")]
    Provider {
        /// Provider tag of the failing backend.
        provider: String,
        /// Provider-reported error message.
        message: String,
    },

    /// The caller's deadline elapsed before a decisive response arrived.
    #[error("deadline elapsed before '{supervisor}' responded")]
    DeadlineExceeded {
        /// Name of the supervisor that timed out.
        supervisor: String,
    },

    /// Transient failures persisted past the retry budget.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The last transient error observed.
        last_error: String,
    },
}

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum PanelError {
    /// A supervisor with this name is already registered.
    #[error("supervisor '{0}' is already registered")]
    DuplicateSupervisor(String),

    /// No supervisor with this name is registered.
    #[error("supervisor '{0}' is not registered")]
    UnknownSupervisor(String),

    /// A base weight must be positive and finite.
    #[error("invalid weight {weight} for supervisor '{name}'")]
    InvalidWeight {
        /// Supervisor the weight was assigned to.
        name: String,
        /// The offending weight.
        weight: f64,
    },
}
