//! Engine configuration.
//!
//! All tunable numbers live here with the defaults the rest of the crate
//! assumes. Configs can be loaded from YAML; [`EngineConfig::validate`]
//! rejects values the state machine cannot honor.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Version tag of the action abstraction and infoset keyer.
///
/// Persisted strategy files carry this tag; a prior trained under a
/// different abstraction is not key-compatible.
pub const ABSTRACTION_VERSION: &str = "v1";

/// Comparison epsilon for chip amounts.
pub const CHIP_EPSILON: f64 = 1e-9;

/// Runtime configuration for sessions and the trainer's game model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Starting stack per seat, in chips.
    pub start_stack: f64,
    /// Small blind, posted by seat 0.
    pub small_blind: f64,
    /// Big blind, posted by seat 1.
    pub big_blind: f64,
    /// Maximum raises per street.
    pub max_raises: u8,
    /// Monte-Carlo trials per equity estimate at decision time.
    pub equity_trials: u32,
    /// Monte-Carlo trials per equity estimate during training.
    pub train_equity_trials: u32,
    /// Equity cache capacity (entries).
    pub equity_cache_entries: usize,
    /// Realtime subgame wall-clock budget in milliseconds.
    pub rt_subgame_ms: u64,
    /// Realtime subgame lookahead depth.
    pub rt_subgame_depth: u32,
    /// Pot size at or above which the realtime subgame triggers.
    pub rt_trigger_pot: f64,
    /// SPR at or below which the realtime subgame triggers.
    pub rt_trigger_spr: f64,
    /// Weight of the blueprint prior when blending with regret matching.
    pub rt_prior_weight: f64,
    /// Weight of EV (vs log-prior) when blending blueprint scores.
    pub ev_blend: f64,
    /// Floor applied to prior probabilities before taking logs.
    pub prob_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_stack: 200.0,
            small_blind: 1.0,
            big_blind: 2.0,
            max_raises: 3,
            equity_trials: 600,
            train_equity_trials: 180,
            equity_cache_entries: 4096,
            rt_subgame_ms: 300,
            rt_subgame_depth: 5,
            rt_trigger_pot: 60.0,
            rt_trigger_spr: 4.0,
            rt_prior_weight: 0.65,
            ev_blend: 0.4,
            prob_floor: 1e-4,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// parsed values fail validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the values are out of range.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_blind <= 0.0 || self.big_blind <= self.small_blind {
            return Err(ConfigError::InvalidBlinds {
                small: self.small_blind,
                big: self.big_blind,
            });
        }
        if self.start_stack <= self.big_blind {
            return Err(ConfigError::InvalidStack(self.start_stack));
        }
        if self.max_raises == 0 {
            return Err(ConfigError::InvalidMaxRaises(self.max_raises));
        }
        for (name, value) in [
            ("ev_blend", self.ev_blend),
            ("rt_prior_weight", self.rt_prior_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        if self.prob_floor <= 0.0 || self.prob_floor >= 1.0 {
            return Err(ConfigError::OutOfUnitRange {
                name: "prob_floor",
                value: self.prob_floor,
            });
        }
        Ok(())
    }

    /// Decision-time equity trial count, clamped to the evaluation range.
    #[must_use]
    pub fn eval_trials(&self) -> u32 {
        self.equity_trials.clamp(100, 2000)
    }

    /// Training equity trial count, clamped to the training range.
    #[must_use]
    pub fn train_trials(&self) -> u32 {
        self.train_equity_trials.clamp(100, 300)
    }

    /// Realtime subgame budget, clamped to [200, 800] ms.
    #[must_use]
    pub fn subgame_budget_ms(&self) -> u64 {
        self.rt_subgame_ms.clamp(200, 800)
    }
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(std::path::PathBuf, #[source] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid blinds: small={small}, big={big}")]
    InvalidBlinds { small: f64, big: f64 },

    #[error("start stack {0} must exceed the big blind")]
    InvalidStack(f64),

    #[error("invalid max_raises: {0} (must be > 0)")]
    InvalidMaxRaises(u8),

    #[error("{name} = {value} is outside the unit range")]
    OutOfUnitRange { name: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    #[timed_test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[timed_test]
    fn default_parameter_values() {
        let c = EngineConfig::default();
        assert!((c.start_stack - 200.0).abs() < f64::EPSILON);
        assert!((c.small_blind - 1.0).abs() < f64::EPSILON);
        assert!((c.big_blind - 2.0).abs() < f64::EPSILON);
        assert_eq!(c.max_raises, 3);
        assert_eq!(c.equity_trials, 600);
        assert_eq!(c.rt_subgame_ms, 300);
        assert!((c.rt_prior_weight - 0.65).abs() < f64::EPSILON);
        assert!((c.ev_blend - 0.4).abs() < f64::EPSILON);
    }

    #[timed_test]
    fn yaml_overrides_defaults() {
        let c = EngineConfig::from_yaml("start_stack: 100\nmax_raises: 2\n").unwrap();
        assert!((c.start_stack - 100.0).abs() < f64::EPSILON);
        assert_eq!(c.max_raises, 2);
        // Untouched fields keep their defaults.
        assert_eq!(c.equity_trials, 600);
    }

    #[timed_test]
    fn inverted_blinds_rejected() {
        let result = EngineConfig::from_yaml("small_blind: 2\nbig_blind: 1\n");
        assert!(matches!(result, Err(ConfigError::InvalidBlinds { .. })));
    }

    #[timed_test]
    fn zero_max_raises_rejected() {
        let result = EngineConfig::from_yaml("max_raises: 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidMaxRaises(0))));
    }

    #[timed_test]
    fn blend_outside_unit_range_rejected() {
        let result = EngineConfig::from_yaml("ev_blend: 1.5\n");
        assert!(matches!(result, Err(ConfigError::OutOfUnitRange { .. })));
    }

    #[timed_test]
    fn trial_clamps() {
        let mut c = EngineConfig::default();
        c.equity_trials = 5000;
        c.train_equity_trials = 10;
        assert_eq!(c.eval_trials(), 2000);
        assert_eq!(c.train_trials(), 100);
    }

    #[timed_test]
    fn subgame_budget_clamps() {
        let mut c = EngineConfig::default();
        c.rt_subgame_ms = 50;
        assert_eq!(c.subgame_budget_ms(), 200);
        c.rt_subgame_ms = 5000;
        assert_eq!(c.subgame_budget_ms(), 800);
    }
}
