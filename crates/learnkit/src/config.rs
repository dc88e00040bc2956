use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{LearnError, Result};

/// Fudge factor substituted when an adaptive rule is configured with zero.
pub const DEFAULT_FUDGE_FACTOR: f64 = 1e-8;

/// Central configuration for a gradient-descent run.
///
/// The struct is plain data; [`OptimizerConfig::validated`] returns the
/// corrected copy the optimizer actually runs with. Missing fields fall back
/// to [`OptimizerConfig::default`] when deserialising.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    pub learning_rate: f64,
    /// Stop once the loss changes by less than this between iterations.
    pub epsilon: f64,
    pub max_iterations: usize,
    /// Momentum for nesterov, decay rate for adadelta and rmsprop.
    pub momentum: f64,
    /// `0` (or anything at least the sample count) means full-batch descent.
    pub batch_size: usize,
    pub update_rule: UpdateRule,
    /// Added to denominators of the adaptive rules.
    pub fudge_factor: f64,
    /// Seed for batch shuffling.
    pub seed: u64,
}

/// Parameter update applied after each gradient evaluation.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UpdateRule {
    Normal,
    Nesterov,
    Adagrad,
    Adadelta,
    Rmsprop,
}

impl UpdateRule {
    pub fn is_adaptive(&self) -> bool {
        matches!(
            self,
            UpdateRule::Adagrad | UpdateRule::Adadelta | UpdateRule::Rmsprop
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateRule::Normal => "normal",
            UpdateRule::Nesterov => "nesterov",
            UpdateRule::Adagrad => "adagrad",
            UpdateRule::Adadelta => "adadelta",
            UpdateRule::Rmsprop => "rmsprop",
        }
    }
}

impl Default for UpdateRule {
    fn default() -> Self {
        UpdateRule::Normal
    }
}

impl FromStr for UpdateRule {
    type Err = LearnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(UpdateRule::Normal),
            "nesterov" => Ok(UpdateRule::Nesterov),
            "adagrad" => Ok(UpdateRule::Adagrad),
            "adadelta" => Ok(UpdateRule::Adadelta),
            "rmsprop" => Ok(UpdateRule::Rmsprop),
            _ => Err(LearnError::config(
                "update_rule",
                format!(
                    "unknown update rule '{}', expected one of normal, nesterov, adagrad, adadelta, rmsprop",
                    s
                ),
            )),
        }
    }
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OptimizerConfig {
    pub fn new(update_rule: UpdateRule) -> Self {
        Self {
            update_rule,
            ..Self::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_fudge_factor(mut self, fudge_factor: f64) -> Self {
        self.fudge_factor = fudge_factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check ranges and apply the rule-specific corrections.
    ///
    /// - adaptive rules with a zero fudge factor get [`DEFAULT_FUDGE_FACTOR`];
    /// - adadelta always runs with a learning rate of 1.
    ///
    /// Both corrections are logged at warn level.
    pub fn validated(&self) -> Result<Self> {
        let mut cfg = self.clone();

        // overridden before the range checks below
        if cfg.update_rule == UpdateRule::Adadelta && cfg.learning_rate != 1.0 {
            log::warn!(
                "adadelta does not use a learning rate, ignoring {}",
                cfg.learning_rate
            );
            cfg.learning_rate = 1.0;
        }
        if !(cfg.learning_rate.is_finite() && cfg.learning_rate > 0.0) {
            return Err(LearnError::config(
                "learning_rate",
                format!("must be positive and finite, got {}", cfg.learning_rate),
            ));
        }
        if !(cfg.epsilon.is_finite() && cfg.epsilon >= 0.0) {
            return Err(LearnError::config(
                "epsilon",
                format!("must be non-negative and finite, got {}", cfg.epsilon),
            ));
        }
        if cfg.max_iterations == 0 {
            return Err(LearnError::config("max_iterations", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&cfg.momentum) {
            return Err(LearnError::config(
                "momentum",
                format!("must lie in [0, 1), got {}", cfg.momentum),
            ));
        }
        if !(cfg.fudge_factor.is_finite() && cfg.fudge_factor >= 0.0) {
            return Err(LearnError::config(
                "fudge_factor",
                format!("must be non-negative and finite, got {}", cfg.fudge_factor),
            ));
        }

        if cfg.update_rule.is_adaptive() && cfg.fudge_factor == 0.0 {
            log::warn!(
                "{} requires a positive fudge factor, using {:e}",
                cfg.update_rule,
                DEFAULT_FUDGE_FACTOR
            );
            cfg.fudge_factor = DEFAULT_FUDGE_FACTOR;
        }

        Ok(cfg)
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epsilon: 0.01,
            max_iterations: 10_000,
            momentum: 0.9,
            batch_size: 0,
            update_rule: UpdateRule::Normal,
            fudge_factor: DEFAULT_FUDGE_FACTOR,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rule_names_case_insensitively() {
        assert_eq!("RMSprop".parse::<UpdateRule>().unwrap(), UpdateRule::Rmsprop);
        assert_eq!("nesterov".parse::<UpdateRule>().unwrap(), UpdateRule::Nesterov);
    }

    #[test]
    fn unknown_rule_is_a_config_error() {
        let err = "adam".parse::<UpdateRule>().unwrap_err();
        assert!(matches!(
            err,
            LearnError::InvalidConfig {
                field: "update_rule",
                ..
            }
        ));
    }

    #[test]
    fn zero_fudge_factor_is_corrected_for_adaptive_rules() {
        let cfg = OptimizerConfig::new(UpdateRule::Adagrad)
            .with_fudge_factor(0.0)
            .validated()
            .unwrap();
        assert_eq!(cfg.fudge_factor, DEFAULT_FUDGE_FACTOR);

        let plain = OptimizerConfig::new(UpdateRule::Normal)
            .with_fudge_factor(0.0)
            .validated()
            .unwrap();
        assert_eq!(plain.fudge_factor, 0.0);
    }

    #[test]
    fn adadelta_forces_unit_learning_rate() {
        let cfg = OptimizerConfig::new(UpdateRule::Adadelta)
            .with_learning_rate(0.3)
            .validated()
            .unwrap();
        assert_eq!(cfg.learning_rate, 1.0);
    }

    #[test]
    fn adadelta_accepts_any_learning_rate() {
        for lr in [0.0, -2.0, f64::NAN] {
            let cfg = OptimizerConfig::new(UpdateRule::Adadelta)
                .with_learning_rate(lr)
                .validated()
                .unwrap();
            assert_eq!(cfg.learning_rate, 1.0);
        }
        assert!(OptimizerConfig::new(UpdateRule::Rmsprop)
            .with_learning_rate(0.0)
            .validated()
            .is_err());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let base = OptimizerConfig::default();
        assert!(base.clone().with_learning_rate(0.0).validated().is_err());
        assert!(base.clone().with_max_iterations(0).validated().is_err());
        assert!(base.clone().with_momentum(1.0).validated().is_err());
        assert!(base.with_epsilon(f64::NAN).validated().is_err());
    }
}
