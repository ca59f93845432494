//! Field and year cohort baselines for the field-normalized methods.
//!
//! A [`CohortBaseline`] is built once from a corpus of citation series that
//! carry subject codes and a publication year. It records two things:
//!
//! - **Expected citations** per `(subject, calendar year)`: the mean number of
//!   citations received that year by the subject's papers that were cited at
//!   least once in that year. Papers contribute to every calendar year their
//!   history covers. This is the denominator of the dynamically normalized
//!   citation impact (`dnic`).
//! - **Half-life cohorts** per `(subject, publication year)`: the sorted
//!   half-life years (first offset reaching half the final total) of papers
//!   published in that year. The `quartile` method reads cohort quantiles from
//!   these.
//!
//! Series without subjects or publication year are skipped.

use crate::scores::half_life_year;
use crate::series::CitationSeries;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct YearTally {
    citations: u64,
    cited_papers: u64,
}

/// Subject/year cohort statistics derived from a corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortBaseline {
    yearly: BTreeMap<(String, i32), YearTally>,
    half_lives: BTreeMap<(String, i32), Vec<usize>>,
    contributing_series: usize,
}

impl CohortBaseline {
    /// Empty baseline; add series with [`CohortBaseline::add_series`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a baseline from every eligible series in `corpus`.
    pub fn from_series<'a, I>(corpus: I) -> Self
    where
        I: IntoIterator<Item = &'a CitationSeries>,
    {
        let mut baseline = Self::new();
        for series in corpus {
            baseline.add_series(series);
        }
        log::debug!(
            "Built cohort baseline from {} series ({} subject-year cells, {} half-life cohorts)",
            baseline.contributing_series,
            baseline.yearly.len(),
            baseline.half_lives.len()
        );
        baseline
    }

    /// Fold one series into the baseline. Returns false when the series lacks
    /// subjects or publication year and was skipped.
    pub fn add_series(&mut self, series: &CitationSeries) -> bool {
        let (Some(subjects), Some(year)) = (series.subjects(), series.pub_year()) else {
            return false;
        };
        if subjects.is_empty() {
            return false;
        }

        let half_life = half_life_year(series.counts());
        for subject in subjects {
            for (offset, &count) in series.counts().iter().enumerate() {
                let tally = self
                    .yearly
                    .entry((subject.clone(), year + offset as i32))
                    .or_default();
                tally.citations = tally.citations.saturating_add(count);
                if count >= 1 {
                    tally.cited_papers += 1;
                }
            }

            // Cohorts stay sorted so quantile lookups are plain indexing.
            let cohort = self.half_lives.entry((subject.clone(), year)).or_default();
            let position = cohort.partition_point(|&h| h <= half_life);
            cohort.insert(position, half_life);
        }

        self.contributing_series += 1;
        true
    }

    /// Mean citations of cited papers in `subject` during calendar `year`.
    ///
    /// `None` when no paper of the subject was observed in that year or none of
    /// them was cited.
    pub fn expected_citations(&self, subject: &str, year: i32) -> Option<f64> {
        self.yearly
            .get(&(subject.to_string(), year))
            .filter(|tally| tally.cited_papers > 0)
            .map(|tally| tally.citations as f64 / tally.cited_papers as f64)
    }

    /// Half-life year at position `floor(len * rate)` of the sorted cohort of
    /// `subject` papers published in `year`, clamped to the last element.
    pub fn half_life_quantile(&self, subject: &str, year: i32, rate: f64) -> Option<usize> {
        let cohort = self.half_lives.get(&(subject.to_string(), year))?;
        if cohort.is_empty() {
            return None;
        }
        let index = ((cohort.len() as f64 * rate).floor() as usize).min(cohort.len() - 1);
        Some(cohort[index])
    }

    /// Number of papers in the `(subject, publication year)` cohort.
    pub fn cohort_size(&self, subject: &str, year: i32) -> usize {
        self.half_lives
            .get(&(subject.to_string(), year))
            .map_or(0, Vec::len)
    }

    /// Number of series that contributed.
    pub fn contributing_series(&self) -> usize {
        self.contributing_series
    }

    /// Whether no series contributed.
    pub fn is_empty(&self) -> bool {
        self.contributing_series == 0
    }
}
