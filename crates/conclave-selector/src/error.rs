//! Error types for team selection.

use thiserror::Error;

/// Configuration errors from panel composition.
///
/// These are the only caller-visible failures in the engine: all of them
/// fire before any debate round runs.
#[derive(Debug, Error)]
pub enum SelectError {
    /// No supervisors are registered.
    #[error("supervisor registry is empty")]
    EmptyRegistry,

    /// Fewer supervisors are registered than the minimum team size.
    #[error("minimum team size {min} exceeds registered supervisors ({available})")]
    NotEnoughSupervisors {
        /// Requested minimum.
        min: usize,
        /// Registered supervisor count.
        available: usize,
    },

    /// The requested size bounds are inverted or degenerate.
    #[error("invalid team size bounds: min {min}, max {max}")]
    InvalidBounds {
        /// Requested minimum.
        min: usize,
        /// Requested maximum.
        max: usize,
    },

    /// Complexity weights must be non-negative and sum to 1.
    #[error("complexity weights must sum to 1, got {sum}")]
    InvalidWeights {
        /// The actual sum.
        sum: f64,
    },

    /// The selected team's effective weights summed to zero.
    #[error("selected team has zero total weight")]
    ZeroWeight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_error_display() {
        let err = SelectError::NotEnoughSupervisors {
            min: 3,
            available: 1,
        };
        assert!(err.to_string().contains("minimum team size 3"));
        assert!(err.to_string().contains("(1)"));
    }
}
