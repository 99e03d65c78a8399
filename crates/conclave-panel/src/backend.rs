//! Model backend capability.
//!
//! One concrete [`ModelBackend`] per provider; the council engine never
//! branches on provider identity.

use async_trait::async_trait;
use thiserror::Error;

use crate::proposal::Proposal;
use crate::verdict::Confidence;

/// A decisive reply from a provider.
///
/// Any well-formed reply, including a rejection, ends the evaluation:
/// rejections are answers, not failures.
#[derive(Debug, Clone)]
pub struct BackendReply {
    /// Whether the model approves the proposal.
    pub approved: bool,
    /// Model-reported confidence.
    pub confidence: Confidence,
    /// The model's reasoning.
    pub rationale: String,
}

impl BackendReply {
    /// Creates a new reply.
    pub fn new(approved: bool, confidence: Confidence, rationale: impl Into<String>) -> Self {
        Self {
            approved,
            confidence,
            rationale: rationale.into(),
        }
    }
}

/// Errors a provider call can produce.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network hiccups, rate limits, 5xx responses. Worth retrying.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Authentication failures, malformed responses. Retrying won't help.
    #[error("provider error: {0}")]
    Fatal(String),
}

impl BackendError {
    /// Returns true if the error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Capability wrapping one model/provider.
///
/// Implementations are expected to be cheap to call concurrently; the round
/// coordinator issues one `ask` per panel member in parallel.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider tag, e.g. `"anthropic"` or `"openai"`.
    fn provider(&self) -> &str;

    /// Asks the model to judge a proposal.
    async fn ask(&self, proposal: &Proposal) -> Result<BackendReply, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_transient() {
        assert!(BackendError::Transient("429".to_string()).is_transient());
        assert!(!BackendError::Fatal("bad key".to_string()).is_transient());
    }

    #[test]
    fn test_backend_reply_new() {
        let reply = BackendReply::new(true, Confidence::high(), "safe change");
        assert!(reply.approved);
        assert_eq!(reply.rationale, "safe change");
    }
}
