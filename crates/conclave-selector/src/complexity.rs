//! Complexity estimation: how hard is this proposal to judge.

use serde::{Deserialize, Serialize};

use conclave_panel::Proposal;

use crate::error::SelectError;

/// Weights for the three complexity components. Must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityWeights {
    /// Weight of the normalized file count.
    pub file_count: f64,
    /// Weight of the normalized diff size.
    pub diff_size: f64,
    /// Weight of tag diversity.
    pub tag_diversity: f64,
}

impl Default for ComplexityWeights {
    fn default() -> Self {
        Self {
            file_count: 0.4,
            diff_size: 0.4,
            tag_diversity: 0.2,
        }
    }
}

impl ComplexityWeights {
    /// Validates that all weights are non-negative and sum to 1.
    pub fn validate(&self) -> Result<(), SelectError> {
        let sum = self.file_count + self.diff_size + self.tag_diversity;
        let non_negative =
            self.file_count >= 0.0 && self.diff_size >= 0.0 && self.tag_diversity >= 0.0;
        if !non_negative || (sum - 1.0).abs() > 1e-6 {
            return Err(SelectError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Pure scorer: `estimate` maps a proposal to `[0, 1]`.
///
/// File count and diff size saturate at configurable ceilings; beyond them
/// a proposal is considered maximally complex on that axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityEstimator {
    /// Component weights.
    pub weights: ComplexityWeights,
    /// File count treated as maximal complexity.
    pub file_saturation: usize,
    /// Diff size (changed lines) treated as maximal complexity.
    pub diff_saturation: usize,
}

impl Default for ComplexityEstimator {
    fn default() -> Self {
        Self {
            weights: ComplexityWeights::default(),
            file_saturation: 20,
            diff_saturation: 2000,
        }
    }
}

impl ComplexityEstimator {
    /// Creates an estimator with custom weights and default saturation.
    pub fn new(weights: ComplexityWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    /// Scores a proposal given its precomputed tag diversity.
    pub fn estimate(&self, proposal: &Proposal, diversity: f64) -> f64 {
        let files = (proposal.files.len() as f64 / self.file_saturation as f64).min(1.0);
        let diff = (proposal.diff_size as f64 / self.diff_saturation as f64).min(1.0);
        let diversity = diversity.clamp(0.0, 1.0);

        self.weights.file_count * files
            + self.weights.diff_size * diff
            + self.weights.tag_diversity * diversity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_valid() {
        ComplexityWeights::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_weights() {
        let weights = ComplexityWeights {
            file_count: 0.5,
            diff_size: 0.5,
            tag_diversity: 0.5,
        };
        assert!(matches!(
            weights.validate(),
            Err(SelectError::InvalidWeights { .. })
        ));

        let negative = ComplexityWeights {
            file_count: -0.2,
            diff_size: 1.0,
            tag_diversity: 0.2,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_estimate_trivial_proposal() {
        let estimator = ComplexityEstimator::default();
        let score = estimator.estimate(&Proposal::new("typo fix"), 0.0);
        assert!((score - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_estimate_saturates_at_one() {
        let estimator = ComplexityEstimator::default();
        let proposal = Proposal::new("rewrite everything")
            .with_files((0..100).map(|i| format!("src/f{i}.rs")).collect())
            .with_diff_size(50_000);
        let score = estimator.estimate(&proposal, 1.0);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_monotonic_in_diff() {
        let estimator = ComplexityEstimator::default();
        let small = Proposal::new("p").with_diff_size(100);
        let large = Proposal::new("p").with_diff_size(1000);
        assert!(estimator.estimate(&large, 0.0) > estimator.estimate(&small, 0.0));
    }

    #[test]
    fn test_estimate_respects_weights() {
        // Only diversity counts.
        let estimator = ComplexityEstimator::new(ComplexityWeights {
            file_count: 0.0,
            diff_size: 0.0,
            tag_diversity: 1.0,
        });
        let proposal = Proposal::new("p").with_diff_size(10_000);
        assert!((estimator.estimate(&proposal, 0.25) - 0.25).abs() < f64::EPSILON);
    }
}
