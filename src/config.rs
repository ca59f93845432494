//! # Extraction Configuration
//!
//! Controls how a [`BatchExtractor`](crate::BatchExtractor) runs: whether
//! publications are processed in parallel and whether every successful
//! classification is followed by a Monte Carlo significance run.

use crate::monte_carlo::MonteCarloConfig;
use crate::surrogates::SurrogateRule;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Monte Carlo settings attached to a batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignificanceSettings {
    /// Runner configuration; its seed is the master seed for the batch
    pub monte_carlo: MonteCarloConfig,
    /// Null model for the surrogates
    pub rule: SurrogateRule,
}

/// Configuration for batch hibernator extraction
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractionConfig {
    /// Process publications in parallel (requires the `parallel` feature)
    pub parallel: bool,
    /// Significance testing for every successful slot; `None` skips it
    pub significance: Option<SignificanceSettings>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::classification_only()
    }
}

impl ExtractionConfig {
    /// Classification only, no surrogate runs
    pub fn classification_only() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            significance: None,
        }
    }

    /// Classification plus 10 permutation trials per slot
    pub fn standard() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            significance: Some(SignificanceSettings {
                monte_carlo: MonteCarloConfig::default(),
                rule: SurrogateRule::Permutation,
            }),
        }
    }

    /// Classification plus 100 permutation trials per slot
    pub fn thorough() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            significance: Some(SignificanceSettings {
                monte_carlo: MonteCarloConfig {
                    trials: 100,
                    ..MonteCarloConfig::default()
                },
                rule: SurrogateRule::Permutation,
            }),
        }
    }

    /// Fix the master seed for significance runs.
    ///
    /// Has no effect when significance testing is disabled.
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Some(settings) = self.significance.as_mut() {
            settings.monte_carlo.seed = Some(seed);
        }
        self
    }

    /// Replace the surrogate rule.
    ///
    /// Has no effect when significance testing is disabled.
    pub fn with_rule(mut self, rule: SurrogateRule) -> Self {
        if let Some(settings) = self.significance.as_mut() {
            settings.rule = rule;
        }
        self
    }

    /// Check if significance testing is enabled
    pub fn is_significance_enabled(&self) -> bool {
        self.significance.is_some()
    }
}
