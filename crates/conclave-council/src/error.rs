//! Error types for the council crate.

use thiserror::Error;

/// Errors that can abort a debate before any round runs.
///
/// Everything else (abstentions, undecided rounds, veto timeouts) resolves
/// to a valid terminal decision instead of an error.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// The debate cannot start: empty registry, bad team bounds, invalid
    /// option values.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<conclave_selector::SelectError> for CouncilError {
    fn from(err: conclave_selector::SelectError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_selector::SelectError;

    #[test]
    fn test_select_error_converts_to_configuration() {
        let err: CouncilError = SelectError::EmptyRegistry.into();
        assert!(err.to_string().contains("registry is empty"));
    }
}
