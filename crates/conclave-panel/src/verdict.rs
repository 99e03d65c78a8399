//! Verdict types: one supervisor's structured answer for one round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence attached to a verdict.
///
/// Ranges from 0.0 (no confidence) to 1.0 (absolute certainty). The range
/// holds on every path: the constructor asserts it and deserialization
/// rejects out-of-range input.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Confidence(f64);

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("confidence {value} is outside [0.0, 1.0]"));
        }
        Ok(Self(value))
    }
}

impl Confidence {
    /// Creates a new confidence value.
    ///
    /// # Panics
    /// Panics if value is outside `[0.0, 1.0]`.
    pub fn new(value: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&value),
            "Confidence must be between 0.0 and 1.0"
        );
        Self(value)
    }

    /// Returns the confidence value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Creates a high confidence value (0.9).
    pub fn high() -> Self {
        Self(0.9)
    }

    /// Creates a medium confidence value (0.6).
    pub fn medium() -> Self {
        Self(0.6)
    }

    /// Creates a low confidence value (0.3).
    pub fn low() -> Self {
        Self(0.3)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::medium()
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// One supervisor's judgment for one round.
///
/// Produced by exactly one supervisor call and never mutated afterward.
/// A failed or timed-out call produces *no* verdict; absence is an
/// abstention, distinct from an explicit reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Name of the supervisor that produced this verdict.
    pub supervisor: String,
    /// Whether the supervisor approves the proposal.
    pub approved: bool,
    /// How certain the supervisor is.
    pub confidence: Confidence,
    /// The supervisor's reasoning.
    pub rationale: String,
    /// When the response arrived.
    pub responded_at: DateTime<Utc>,
}

impl Verdict {
    /// Creates a new verdict stamped with the current time.
    pub fn new(
        supervisor: impl Into<String>,
        approved: bool,
        confidence: Confidence,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            supervisor: supervisor.into(),
            approved,
            confidence,
            rationale: rationale.into(),
            responded_at: Utc::now(),
        }
    }

    /// Creates an approving verdict.
    pub fn approve(
        supervisor: impl Into<String>,
        confidence: Confidence,
        rationale: impl Into<String>,
    ) -> Self {
        Self::new(supervisor, true, confidence, rationale)
    }

    /// Creates a rejecting verdict.
    pub fn reject(
        supervisor: impl Into<String>,
        confidence: Confidence,
        rationale: impl Into<String>,
    ) -> Self {
        Self::new(supervisor, false, confidence, rationale)
    }
}
