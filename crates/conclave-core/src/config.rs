//! Engine configuration.
//!
//! Everything here deserializes from JSON with full defaults, so an empty
//! object `{}` is a valid configuration. Durations are expressed in
//! milliseconds to keep config files flat.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use conclave_council::{ConsensusConfig, ConsensusMode, DebateOptions};
use conclave_panel::RetryPolicy;
use conclave_selector::{
    ComplexityEstimator, SelectorConfig, SpecialtyInferencer, SpecialtyTables, TeamSelector,
};

use crate::error::EngineError;

/// Retry behavior applied to every registered supervisor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// First retry delay.
    pub base_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub multiplier: f64,
    /// Attempts per evaluation, including the first.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 250,
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

impl RetryConfig {
    /// Converts to the panel's retry policy.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: self.multiplier,
            max_attempts: self.max_attempts,
        }
    }
}

/// Default debate parameters; per-debate overrides take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    pub mode: ConsensusMode,
    pub min_team_size: usize,
    pub max_team_size: usize,
    pub max_rounds: u32,
    pub round_deadline_ms: u64,
    pub round_grace_ms: u64,
    pub reselect_between_rounds: bool,
    pub human_veto_enabled: bool,
    pub human_veto_window_ms: u64,
    pub lead: Option<String>,
}

impl Default for DebateConfig {
    fn default() -> Self {
        let options = DebateOptions::default();
        Self {
            mode: options.mode,
            min_team_size: options.min_team_size,
            max_team_size: options.max_team_size,
            max_rounds: options.max_rounds,
            round_deadline_ms: options.round_deadline.as_millis() as u64,
            round_grace_ms: options.round_grace.as_millis() as u64,
            reselect_between_rounds: options.reselect_between_rounds,
            human_veto_enabled: options.human_veto_enabled,
            human_veto_window_ms: options.human_veto_window.as_millis() as u64,
            lead: options.lead,
        }
    }
}

impl DebateConfig {
    /// Converts to the council's per-debate options.
    pub fn to_options(&self) -> DebateOptions {
        DebateOptions {
            mode: self.mode,
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
            max_rounds: self.max_rounds,
            round_deadline: Duration::from_millis(self.round_deadline_ms),
            round_grace: Duration::from_millis(self.round_grace_ms),
            reselect_between_rounds: self.reselect_between_rounds,
            human_veto_enabled: self.human_veto_enabled,
            human_veto_window: Duration::from_millis(self.human_veto_window_ms),
            lead: self.lead.clone(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Supervisor retry behavior.
    pub retry: RetryConfig,
    /// Greedy team selection knobs.
    pub selector: SelectorConfig,
    /// File-to-domain mapping tables.
    pub specialties: SpecialtyTables,
    /// Complexity scoring weights and saturation points.
    pub complexity: ComplexityEstimator,
    /// Consensus reduction knobs.
    pub consensus: ConsensusConfig,
    /// Default debate parameters.
    pub debate: DebateConfig,
}

impl EngineConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::Configuration(format!("invalid config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations an engine could not run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.retry.max_attempts == 0 {
            return Err(EngineError::Configuration(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(EngineError::Configuration(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }
        self.complexity
            .weights
            .validate()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        if !(0.0..=1.0).contains(&self.consensus.dissent_threshold) {
            return Err(EngineError::Configuration(
                "consensus.dissent_threshold must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.consensus.supermajority_threshold)
            || self.consensus.supermajority_threshold <= 0.5
        {
            return Err(EngineError::Configuration(
                "consensus.supermajority_threshold must be in (0.5, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.consensus.weighted_threshold) {
            return Err(EngineError::Configuration(
                "consensus.weighted_threshold must be in [0, 1]".into(),
            ));
        }
        self.debate
            .to_options()
            .validate()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        Ok(())
    }

    /// Builds a team selector from the selection sections.
    pub fn build_selector(&self) -> TeamSelector {
        TeamSelector::new(
            SpecialtyInferencer::new(self.specialties.clone()),
            self.complexity.clone(),
            self.selector,
        )
    }
}
