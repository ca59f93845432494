//! Batch hibernator extraction over a corpus of publications.
//!
//! Every requested method is applied to every publication, producing one
//! [`BatchSlot`] per (publication, method) pair. Slots come back in input
//! order with methods grouped per publication in request order, regardless of
//! whether publications were processed in parallel. A failing slot never
//! affects its neighbours; its error is kept in the slot.
//!
//! Field-normalized methods (`dnic`, `quartile`) need a [`CohortBaseline`].
//! Unless one is supplied explicitly, it is built from the batch's own
//! publications the first time such a method is requested.

use crate::baseline::CohortBaseline;
use crate::config::{ExtractionConfig, SignificanceSettings};
use crate::errors::HibernatorResult;
use crate::monte_carlo::{MonteCarloRunner, SimulationSummary};
use crate::parameters::MethodParameters;
use crate::registry::ClassificationMethod;
use crate::results::ClassificationResult;
use crate::secure_rng::{derive_stream_seed, SecureRng};
use crate::series::Publication;
use rand::Rng;
use std::collections::BTreeMap;

/// Outcome of one method on one publication.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSlot {
    /// Identity of the publication
    pub publication_id: String,
    /// Method applied
    pub method: ClassificationMethod,
    /// Classification, or the error that prevented it
    pub outcome: HibernatorResult<ClassificationResult>,
    /// Significance run; `None` when disabled or the classification failed
    pub simulation: Option<HibernatorResult<SimulationSummary>>,
}

impl BatchSlot {
    /// Whether the slot classified the publication as a hibernator.
    pub fn is_hibernator(&self) -> bool {
        matches!(&self.outcome, Ok(result) if result.is_hibernator)
    }
}

/// Apply `methods` to every publication with default extraction settings.
///
/// Methods missing from `params_by_method` run with their schema defaults, so
/// methods with required parameters fail in their slots.
///
/// # Example
/// ```rust
/// use hibernator::{extract_all, CitationSeries, ClassificationMethod, Publication};
/// use std::collections::BTreeMap;
///
/// let publications = vec![
///     Publication::new("late", CitationSeries::new(vec![0, 0, 0, 0, 1, 3, 9, 25, 60, 80]).unwrap()),
///     Publication::new("early", CitationSeries::new(vec![80, 60, 25, 9, 3, 1, 0, 0, 0, 0]).unwrap()),
/// ];
/// let slots = extract_all(&publications, &[ClassificationMethod::AdjustedGini], &BTreeMap::new());
///
/// assert_eq!(slots.len(), 2);
/// assert!(slots[0].is_hibernator());
/// assert!(!slots[1].is_hibernator());
/// ```
pub fn extract_all(
    publications: &[Publication],
    methods: &[ClassificationMethod],
    params_by_method: &BTreeMap<ClassificationMethod, MethodParameters>,
) -> Vec<BatchSlot> {
    extract(
        publications,
        methods,
        params_by_method,
        None,
        &ExtractionConfig::default(),
    )
}

/// Publication ids classified as hibernators by `method`, in slot order.
pub fn hibernators(slots: &[BatchSlot], method: ClassificationMethod) -> Vec<&str> {
    slots
        .iter()
        .filter(|slot| slot.method == method && slot.is_hibernator())
        .map(|slot| slot.publication_id.as_str())
        .collect()
}

/// Number of hibernators found by each method present in `slots`.
pub fn hibernator_counts(slots: &[BatchSlot]) -> BTreeMap<ClassificationMethod, usize> {
    let mut counts = BTreeMap::new();
    for slot in slots {
        let entry = counts.entry(slot.method).or_insert(0);
        if slot.is_hibernator() {
            *entry += 1;
        }
    }
    counts
}

/// Corpus-level extractor with configuration and an optional fixed baseline.
#[derive(Debug, Clone, Default)]
pub struct BatchExtractor {
    publications: Vec<Publication>,
    config: ExtractionConfig,
    baseline: Option<CohortBaseline>,
}

impl BatchExtractor {
    /// Extractor over `publications`.
    pub fn new(publications: Vec<Publication>, config: ExtractionConfig) -> Self {
        Self {
            publications,
            config,
            baseline: None,
        }
    }

    /// Use `baseline` instead of building one from the batch.
    pub fn with_baseline(mut self, baseline: CohortBaseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Append a publication.
    pub fn add_publication(&mut self, publication: Publication) {
        self.publications.push(publication);
    }

    /// Publications in processing order.
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    /// Active configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run every method on every publication.
    pub fn extract_all(
        &self,
        methods: &[ClassificationMethod],
        params_by_method: &BTreeMap<ClassificationMethod, MethodParameters>,
    ) -> Vec<BatchSlot> {
        extract(
            &self.publications,
            methods,
            params_by_method,
            self.baseline.as_ref(),
            &self.config,
        )
    }
}

fn extract(
    publications: &[Publication],
    methods: &[ClassificationMethod],
    params_by_method: &BTreeMap<ClassificationMethod, MethodParameters>,
    explicit_baseline: Option<&CohortBaseline>,
    config: &ExtractionConfig,
) -> Vec<BatchSlot> {
    let built_baseline;
    let baseline = match explicit_baseline {
        Some(baseline) => Some(baseline),
        None if methods.iter().any(|m| m.is_field_normalized()) => {
            built_baseline = CohortBaseline::from_series(publications.iter().map(|p| &p.series));
            Some(&built_baseline)
        }
        None => None,
    };

    // One master seed per batch so every slot's run can be replayed.
    let master_seed = config.significance.as_ref().map(|settings| {
        settings
            .monte_carlo
            .seed
            .unwrap_or_else(|| SecureRng::from_entropy().gen())
    });

    let defaults = MethodParameters::new();
    let job = BatchJob {
        methods,
        params_by_method,
        defaults: &defaults,
        baseline,
        significance: config.significance.as_ref(),
        master_seed,
    };

    log::debug!(
        "Extracting {} publications x {} methods (baseline: {}, significance: {}, {})",
        publications.len(),
        methods.len(),
        baseline.map_or(0, CohortBaseline::contributing_series),
        job.significance.is_some(),
        if config.parallel { "parallel" } else { "sequential" }
    );

    let per_publication = process_publications(publications, &job, config.parallel);
    let slots: Vec<BatchSlot> = per_publication.into_iter().flatten().collect();

    let failed = slots.iter().filter(|slot| slot.outcome.is_err()).count();
    if failed > 0 {
        log::debug!("{} of {} slots failed", failed, slots.len());
    }
    slots
}

struct BatchJob<'a> {
    methods: &'a [ClassificationMethod],
    params_by_method: &'a BTreeMap<ClassificationMethod, MethodParameters>,
    defaults: &'a MethodParameters,
    baseline: Option<&'a CohortBaseline>,
    significance: Option<&'a SignificanceSettings>,
    master_seed: Option<u64>,
}

impl BatchJob<'_> {
    fn slots_for(&self, index: usize, publication: &Publication) -> Vec<BatchSlot> {
        self.methods
            .iter()
            .enumerate()
            .map(|(m, &method)| {
                let slot_index = index * self.methods.len() + m;
                self.slot(slot_index, publication, method)
            })
            .collect()
    }

    fn slot(
        &self,
        slot_index: usize,
        publication: &Publication,
        method: ClassificationMethod,
    ) -> BatchSlot {
        let params = self.params_by_method.get(&method).unwrap_or(self.defaults);

        let outcome = method
            .classify_with_baseline(&publication.series, params, self.baseline)
            .map(|result| result.for_publication(publication.id.clone()));
        if let Err(e) = &outcome {
            log::warn!("{} failed on publication {}: {}", method, publication.id, e);
        }

        let simulation = match (&outcome, self.significance, self.master_seed) {
            (Ok(_), Some(settings), Some(master)) => {
                let mut monte_carlo = settings.monte_carlo.clone();
                monte_carlo.seed = Some(derive_stream_seed(master, slot_index as u64));
                let summary = MonteCarloRunner::new(monte_carlo).run(
                    &publication.series,
                    method,
                    params,
                    settings.rule,
                    self.baseline,
                );
                if let Err(e) = &summary {
                    log::warn!(
                        "Significance run for {} on publication {} failed: {}",
                        method,
                        publication.id,
                        e
                    );
                }
                Some(summary)
            }
            _ => None,
        };

        BatchSlot {
            publication_id: publication.id.clone(),
            method,
            outcome,
            simulation,
        }
    }
}

#[cfg(feature = "parallel")]
fn process_publications(
    publications: &[Publication],
    job: &BatchJob<'_>,
    parallel: bool,
) -> Vec<Vec<BatchSlot>> {
    use rayon::prelude::*;

    if parallel {
        publications
            .par_iter()
            .enumerate()
            .map(|(i, publication)| job.slots_for(i, publication))
            .collect()
    } else {
        publications
            .iter()
            .enumerate()
            .map(|(i, publication)| job.slots_for(i, publication))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn process_publications(
    publications: &[Publication],
    job: &BatchJob<'_>,
    _parallel: bool,
) -> Vec<Vec<BatchSlot>> {
    publications
        .iter()
        .enumerate()
        .map(|(i, publication)| job.slots_for(i, publication))
        .collect()
}
