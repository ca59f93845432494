//! Monte Carlo significance testing for hibernator classifications.
//!
//! A classification is only interesting if the same method rarely fires on
//! randomized versions of the same history. The runner classifies the observed
//! series once, then classifies `trials` surrogate histories drawn with a
//! [`SurrogateRule`] and reports the fraction of surrogates classified as
//! hibernators. A low fraction supports the observed classification being a
//! structural pattern rather than an artifact of citation volume or length.
//!
//! ## Policy
//!
//! - All trials always run; there is no early termination.
//! - A failure in any trial aborts the whole run with that failure. A partial
//!   null distribution is not a meaningful summary.
//! - Sequential runs draw every surrogate from one ChaCha20 stream seeded with
//!   [`MonteCarloConfig::seed`], so a fixed seed reproduces the run bit for bit.
//! - Parallel runs (feature `parallel`) give trial `i` its own stream seeded
//!   with `derive_stream_seed(seed, i)` (see
//!   [`derive_stream_seed`](crate::secure_rng::derive_stream_seed)). Results
//!   are reproducible for a fixed seed regardless of thread scheduling, but
//!   differ from the sequential stream.
//! - Without a seed, a fresh entropy seed is drawn per run and reported in the
//!   summary so the run can be replayed.

use crate::baseline::CohortBaseline;
use crate::errors::{validate_min_count, validate_parameter, HibernatorResult};
use crate::parameters::{MethodParameters, ResolvedParameters};
use crate::registry::ClassificationMethod;
use crate::secure_rng::SecureRng;
use crate::series::CitationSeries;
use crate::surrogates::{generate_surrogate, SurrogateRule};
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of surrogate trials per run.
pub const DEFAULT_TRIALS: usize = 10;

/// Configuration parameters for Monte Carlo runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonteCarloConfig {
    /// Number of surrogate trials
    pub trials: usize,
    /// Surrogate hibernator fraction below which the result counts as significant
    pub significance_level: f64,
    /// Random seed for reproducible results
    pub seed: Option<u64>,
    /// Run trials in parallel when the `parallel` feature is enabled
    pub parallel: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            significance_level: 0.05,
            seed: None,
            parallel: false,
        }
    }
}

impl MonteCarloConfig {
    /// Default configuration with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    fn validate(&self) -> HibernatorResult<()> {
        validate_min_count(self.trials, 1, "trials", "monte_carlo")?;
        validate_parameter(
            self.significance_level,
            f64::MIN_POSITIVE,
            1.0,
            "significance_level",
            "monte_carlo",
        )
    }
}

/// Aggregated outcome of one Monte Carlo run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationSummary {
    /// Method that was tested
    pub method: ClassificationMethod,
    /// Surrogate rule used for the null model
    pub rule: SurrogateRule,
    /// Classification of the observed series
    pub original_classification: bool,
    /// Number of surrogate trials
    pub trials: usize,
    /// Number of surrogates classified as hibernators
    pub hibernator_trials: usize,
    /// `hibernator_trials / trials`
    pub fraction_hibernator: f64,
    /// Threshold the fraction was compared against
    pub significance_level: f64,
    /// Whether `fraction_hibernator < significance_level`
    pub significant: bool,
    /// Seed that reproduces the run (`None` when driven by a caller-supplied generator)
    pub seed: Option<u64>,
}

impl SimulationSummary {
    /// Observed series is a hibernator and surrogates rarely are.
    pub fn supports_hibernation(&self) -> bool {
        self.original_classification && self.significant
    }
}

/// Repeated surrogate classification under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloRunner {
    config: MonteCarloConfig,
}

impl MonteCarloRunner {
    /// Runner with the given configuration.
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Run the configured number of trials for `method` on `series`.
    ///
    /// `baseline` is only consulted by field-normalized methods; surrogates are
    /// compared against the same baseline as the observed series.
    ///
    /// # Example
    /// ```rust
    /// use hibernator::{
    ///     CitationSeries, ClassificationMethod, MethodParameters, MonteCarloConfig,
    ///     MonteCarloRunner, SurrogateRule,
    /// };
    ///
    /// let series = CitationSeries::new(vec![0, 0, 0, 0, 0, 150]).unwrap();
    /// let params = MethodParameters::new().with("s", 5.0).with("cs", 2.0).with("ca", 100.0);
    /// let runner = MonteCarloRunner::new(MonteCarloConfig::seeded(42));
    ///
    /// let summary = runner
    ///     .run(&series, ClassificationMethod::Naive, &params, SurrogateRule::Permutation, None)
    ///     .unwrap();
    /// assert!(summary.original_classification);
    /// assert!((0.0..=1.0).contains(&summary.fraction_hibernator));
    /// ```
    pub fn run(
        &self,
        series: &CitationSeries,
        method: ClassificationMethod,
        params: &MethodParameters,
        rule: SurrogateRule,
        baseline: Option<&CohortBaseline>,
    ) -> HibernatorResult<SimulationSummary> {
        self.config.validate()?;
        let resolved = method.resolve(params)?;
        let original = method.classify_resolved(series, &resolved, baseline)?;

        let seed = self
            .config
            .seed
            .unwrap_or_else(|| SecureRng::from_entropy().gen());

        let use_parallel = self.config.parallel && cfg!(feature = "parallel");
        log::debug!(
            "Monte Carlo {} x{} ({:?}, seed {}, {})",
            method,
            self.config.trials,
            rule,
            seed,
            if use_parallel { "parallel" } else { "sequential" }
        );

        let hibernator_trials = if use_parallel {
            count_hibernator_trials_parallel(
                series,
                method,
                &resolved,
                &rule,
                baseline,
                self.config.trials,
                seed,
            )?
        } else {
            let mut rng = SecureRng::with_seed(seed);
            count_hibernator_trials(
                series,
                method,
                &resolved,
                &rule,
                baseline,
                self.config.trials,
                &mut rng,
            )?
        };

        Ok(self.summarize(method, rule, original.is_hibernator, hibernator_trials, Some(seed)))
    }

    /// Run sequentially, drawing every surrogate from `rng`.
    ///
    /// Lets callers substitute their own generator; the summary carries no seed.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        series: &CitationSeries,
        method: ClassificationMethod,
        params: &MethodParameters,
        rule: SurrogateRule,
        baseline: Option<&CohortBaseline>,
        rng: &mut R,
    ) -> HibernatorResult<SimulationSummary> {
        self.config.validate()?;
        let resolved = method.resolve(params)?;
        let original = method.classify_resolved(series, &resolved, baseline)?;

        let hibernator_trials = count_hibernator_trials(
            series,
            method,
            &resolved,
            &rule,
            baseline,
            self.config.trials,
            rng,
        )?;

        Ok(self.summarize(method, rule, original.is_hibernator, hibernator_trials, None))
    }

    fn summarize(
        &self,
        method: ClassificationMethod,
        rule: SurrogateRule,
        original_classification: bool,
        hibernator_trials: usize,
        seed: Option<u64>,
    ) -> SimulationSummary {
        let trials = self.config.trials;
        let fraction_hibernator = hibernator_trials as f64 / trials as f64;
        SimulationSummary {
            method,
            rule,
            original_classification,
            trials,
            hibernator_trials,
            fraction_hibernator,
            significance_level: self.config.significance_level,
            significant: fraction_hibernator < self.config.significance_level,
            seed,
        }
    }
}

fn run_trial<R: Rng + ?Sized>(
    series: &CitationSeries,
    method: ClassificationMethod,
    params: &ResolvedParameters,
    rule: &SurrogateRule,
    baseline: Option<&CohortBaseline>,
    rng: &mut R,
) -> HibernatorResult<bool> {
    let surrogate = generate_surrogate(series, rule, rng)?;
    Ok(method
        .classify_resolved(&surrogate, params, baseline)?
        .is_hibernator)
}

fn count_hibernator_trials<R: Rng + ?Sized>(
    series: &CitationSeries,
    method: ClassificationMethod,
    params: &ResolvedParameters,
    rule: &SurrogateRule,
    baseline: Option<&CohortBaseline>,
    trials: usize,
    rng: &mut R,
) -> HibernatorResult<usize> {
    let mut hits = 0;
    for trial in 0..trials {
        let hit = run_trial(series, method, params, rule, baseline, rng).map_err(|e| {
            log::warn!("Monte Carlo {} aborted at trial {}: {}", method, trial, e);
            e
        })?;
        if hit {
            hits += 1;
        }
    }
    Ok(hits)
}

#[cfg(feature = "parallel")]
fn count_hibernator_trials_parallel(
    series: &CitationSeries,
    method: ClassificationMethod,
    params: &ResolvedParameters,
    rule: &SurrogateRule,
    baseline: Option<&CohortBaseline>,
    trials: usize,
    seed: u64,
) -> HibernatorResult<usize> {
    use crate::secure_rng::derive_stream_seed;
    use rayon::prelude::*;

    let outcomes: HibernatorResult<Vec<bool>> = (0..trials)
        .into_par_iter()
        .map(|i| {
            let mut rng = SecureRng::with_seed(derive_stream_seed(seed, i as u64));
            run_trial(series, method, params, rule, baseline, &mut rng)
        })
        .collect();

    match outcomes {
        Ok(hits) => Ok(hits.into_iter().filter(|&hit| hit).count()),
        Err(e) => {
            log::warn!("Monte Carlo {} aborted: {}", method, e);
            Err(e)
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn count_hibernator_trials_parallel(
    series: &CitationSeries,
    method: ClassificationMethod,
    params: &ResolvedParameters,
    rule: &SurrogateRule,
    baseline: Option<&CohortBaseline>,
    trials: usize,
    seed: u64,
) -> HibernatorResult<usize> {
    count_hibernator_trials(
        series,
        method,
        params,
        rule,
        baseline,
        trials,
        &mut SecureRng::with_seed(seed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HibernatorError;

    fn naive_params() -> MethodParameters {
        MethodParameters::new()
            .with("s", 8.0)
            .with("cs", 2.0)
            .with("ca", 100.0)
    }

    fn sleeping_beauty() -> CitationSeries {
        CitationSeries::new(vec![0, 0, 0, 0, 0, 0, 0, 0, 150, 160]).unwrap()
    }

    #[test]
    fn test_default_trial_count_is_ten() {
        let summary = MonteCarloRunner::new(MonteCarloConfig::seeded(1))
            .run(
                &sleeping_beauty(),
                ClassificationMethod::Naive,
                &naive_params(),
                SurrogateRule::Permutation,
                None,
            )
            .unwrap();
        assert_eq!(summary.trials, 10);
        assert!(summary.original_classification);
        assert!(summary.hibernator_trials <= 10);
        assert!((0.0..=1.0).contains(&summary.fraction_hibernator));
        assert_eq!(summary.seed, Some(1));
    }

    #[test]
    fn test_sequential_runs_repeat_bit_for_bit() {
        let runner = MonteCarloRunner::new(MonteCarloConfig {
            trials: 25,
            ..MonteCarloConfig::seeded(2024)
        });
        let run = || {
            runner
                .run(
                    &sleeping_beauty(),
                    ClassificationMethod::Naive,
                    &naive_params(),
                    SurrogateRule::Multinomial,
                    None,
                )
                .unwrap()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(first.fraction_hibernator.to_bits(), second.fraction_hibernator.to_bits());
    }

    #[test]
    fn test_run_with_rng_matches_seeded_sequential_run() {
        let runner = MonteCarloRunner::new(MonteCarloConfig::seeded(77));
        let seeded = runner
            .run(
                &sleeping_beauty(),
                ClassificationMethod::Naive,
                &naive_params(),
                SurrogateRule::Permutation,
                None,
            )
            .unwrap();
        let injected = runner
            .run_with_rng(
                &sleeping_beauty(),
                ClassificationMethod::Naive,
                &naive_params(),
                SurrogateRule::Permutation,
                None,
                &mut SecureRng::with_seed(77),
            )
            .unwrap();
        assert_eq!(seeded.hibernator_trials, injected.hibernator_trials);
        assert_eq!(injected.seed, None);
    }

    #[test]
    fn test_multinomial_null_rarely_sleeps() {
        // Spreading 310 citations uniformly over ten years never leaves eight cold years.
        let summary = MonteCarloRunner::new(MonteCarloConfig {
            trials: 50,
            ..MonteCarloConfig::seeded(9)
        })
        .run(
            &sleeping_beauty(),
            ClassificationMethod::Naive,
            &naive_params(),
            SurrogateRule::Multinomial,
            None,
        )
        .unwrap();
        assert_eq!(summary.hibernator_trials, 0);
        assert!(summary.significant);
        assert!(summary.supports_hibernation());
    }

    #[test]
    fn test_invalid_configuration() {
        let zero_trials = MonteCarloRunner::new(MonteCarloConfig {
            trials: 0,
            ..MonteCarloConfig::default()
        });
        assert!(matches!(
            zero_trials.run(
                &sleeping_beauty(),
                ClassificationMethod::Naive,
                &naive_params(),
                SurrogateRule::Permutation,
                None
            ),
            Err(HibernatorError::InvalidParameters { .. })
        ));

        let bad_level = MonteCarloRunner::new(MonteCarloConfig {
            significance_level: 1.5,
            ..MonteCarloConfig::default()
        });
        assert!(bad_level
            .run(
                &sleeping_beauty(),
                ClassificationMethod::Naive,
                &naive_params(),
                SurrogateRule::Permutation,
                None
            )
            .is_err());
    }

    #[test]
    fn test_trial_failure_aborts_run() {
        let runner = MonteCarloRunner::new(MonteCarloConfig::seeded(3));
        let result = runner.run(
            &sleeping_beauty(),
            ClassificationMethod::Naive,
            &naive_params(),
            SurrogateRule::BlockShuffle { block_size: 0 },
            None,
        );
        assert!(matches!(result, Err(HibernatorError::InvalidParameters { .. })));
    }

    #[test]
    fn test_method_failure_propagates() {
        let runner = MonteCarloRunner::default();
        let result = runner.run(
            &sleeping_beauty(),
            ClassificationMethod::Dnic,
            &MethodParameters::new(),
            SurrogateRule::Permutation,
            None,
        );
        assert!(matches!(result, Err(HibernatorError::MissingContext { .. })));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_runs_are_reproducible() {
        let runner = MonteCarloRunner::new(MonteCarloConfig {
            trials: 40,
            parallel: true,
            ..MonteCarloConfig::seeded(5)
        });
        let run = || {
            runner
                .run(
                    &sleeping_beauty(),
                    ClassificationMethod::AdjustedGini,
                    &MethodParameters::new(),
                    SurrogateRule::Permutation,
                    None,
                )
                .unwrap()
        };
        assert_eq!(run(), run());
    }
}
