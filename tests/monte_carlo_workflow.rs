//! Integration tests for the Monte Carlo significance workflow
//!
//! These tests follow the usual analysis path: classify a history, test the
//! classification against surrogate histories and read the summary.

use hibernator::{
    generate_surrogate, CitationSeries, ClassificationMethod, CohortBaseline, HibernatorError,
    MethodParameters, MonteCarloConfig, MonteCarloRunner, SecureRng, SurrogateRule,
};

fn sleeping_beauty() -> CitationSeries {
    CitationSeries::new(vec![0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 35, 80, 120])
        .unwrap()
        .with_subjects(["CHEM"])
        .with_pub_year(1970)
}

fn naive_params() -> MethodParameters {
    MethodParameters::new()
        .with("s", 12.0)
        .with("cs", 1.0)
        .with("ca", 30.0)
}

#[test]
fn test_fixed_seed_reproduces_summary() {
    let config = MonteCarloConfig {
        trials: 30,
        ..MonteCarloConfig::seeded(1234)
    };
    let runner = MonteCarloRunner::new(config);

    for rule in [
        SurrogateRule::Permutation,
        SurrogateRule::Multinomial,
        SurrogateRule::BlockShuffle { block_size: 3 },
    ] {
        let first = runner
            .run(&sleeping_beauty(), ClassificationMethod::Naive, &naive_params(), rule, None)
            .unwrap();
        let second = runner
            .run(&sleeping_beauty(), ClassificationMethod::Naive, &naive_params(), rule, None)
            .unwrap();

        assert_eq!(first, second, "{:?} run was not reproducible", rule);
        assert!(first.original_classification);
        assert_eq!(first.trials, 30);
        assert!(first.hibernator_trials <= first.trials);
        assert!((0.0..=1.0).contains(&first.fraction_hibernator));
        assert_eq!(
            first.significant,
            first.fraction_hibernator < first.significance_level
        );
    }
}

#[test]
fn test_unseeded_run_reports_replayable_seed() {
    let runner = MonteCarloRunner::new(MonteCarloConfig::default());
    let summary = runner
        .run(
            &sleeping_beauty(),
            ClassificationMethod::Naive,
            &naive_params(),
            SurrogateRule::Permutation,
            None,
        )
        .unwrap();
    let seed = summary.seed.expect("entropy seed is reported");

    let replay = MonteCarloRunner::new(MonteCarloConfig::seeded(seed))
        .run(
            &sleeping_beauty(),
            ClassificationMethod::Naive,
            &naive_params(),
            SurrogateRule::Permutation,
            None,
        )
        .unwrap();
    assert_eq!(summary, replay);
}

#[test]
fn test_field_normalized_method_uses_shared_baseline() {
    let corpus = vec![
        sleeping_beauty(),
        CitationSeries::new(vec![3; 15])
            .unwrap()
            .with_subjects(["CHEM"])
            .with_pub_year(1970),
        CitationSeries::new(vec![20, 10, 5, 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0])
            .unwrap()
            .with_subjects(["CHEM"])
            .with_pub_year(1970),
    ];
    let baseline = CohortBaseline::from_series(&corpus);

    let summary = MonteCarloRunner::new(MonteCarloConfig::seeded(8))
        .run(
            &sleeping_beauty(),
            ClassificationMethod::Quartile,
            &MethodParameters::new(),
            SurrogateRule::Permutation,
            Some(&baseline),
        )
        .unwrap();
    assert_eq!(summary.method, ClassificationMethod::Quartile);
    assert_eq!(summary.trials, 10);

    let missing = MonteCarloRunner::new(MonteCarloConfig::seeded(8)).run(
        &sleeping_beauty(),
        ClassificationMethod::Quartile,
        &MethodParameters::new(),
        SurrogateRule::Permutation,
        None,
    );
    assert!(matches!(missing, Err(HibernatorError::MissingContext { .. })));
}

#[test]
fn test_surrogates_keep_context_and_volume() {
    let original = sleeping_beauty();
    let mut rng = SecureRng::with_seed(55);
    for rule in [
        SurrogateRule::Permutation,
        SurrogateRule::Multinomial,
        SurrogateRule::BlockShuffle { block_size: 4 },
        SurrogateRule::BlockShuffle { block_size: 100 },
    ] {
        let surrogate = generate_surrogate(&original, &rule, &mut rng).unwrap();
        assert_eq!(surrogate.total(), original.total());
        assert_eq!(surrogate.len(), original.len());
        assert_eq!(surrogate.subjects(), original.subjects());
        assert_eq!(surrogate.pub_year(), original.pub_year());
    }
}

#[test]
fn test_invalid_parameters_fail_before_any_trial() {
    let runner = MonteCarloRunner::new(MonteCarloConfig::seeded(1));
    let result = runner.run(
        &sleeping_beauty(),
        ClassificationMethod::Naive,
        &MethodParameters::new().with("s", 10.0),
        SurrogateRule::Permutation,
        None,
    );
    assert!(matches!(result, Err(HibernatorError::InvalidParameters { .. })));
}
