//! Implementations of the eleven hibernator classifiers.
//!
//! Every function here is pure: it reads the series and already-validated
//! parameters and returns a [`ClassificationResult`] whose metrics record the
//! values behind the decision. Dispatch and parameter validation live in
//! [`crate::registry`].
//!
//! Short histories never panic and never read past the observed years: a
//! method whose windows do not fit classifies the series as not a hibernator
//! and reports the length it would have needed.

use crate::baseline::CohortBaseline;
use crate::errors::{HibernatorError, HibernatorResult};
use crate::parameters::ResolvedParameters;
use crate::registry::ClassificationMethod;
use crate::results::ClassificationResult;
use crate::scores;
use crate::series::CitationSeries;
use std::collections::BTreeSet;

/// Series must be strictly longer than this for the citation angle method
/// (five sleeping years need ten years of history).
const CITATION_ANGLE_MIN_YEARS: usize = 10;

fn too_short(
    method: ClassificationMethod,
    series: &CitationSeries,
    required: usize,
) -> ClassificationResult {
    ClassificationResult::new(method, false)
        .metric("series_length", series.len() as f64)
        .metric("required_length", required as f64)
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// Sleeping window of the first `s` years after publication, every year at or
/// below `cs`, followed by an awakening in year `s`.
///
/// The single-year awakening must reach `ca`; with `cumulative` set, the
/// citations from year `s` to the end of the history must exceed it.
pub(crate) fn naive(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let method = ClassificationMethod::Naive;
    let s = params.integer("s")?;
    let cs = params.real("cs")?;
    let ca = params.real("ca")?;
    let cumulative = params.flag("cumulative")?;

    let counts = series.counts();
    let n = counts.len();
    let required = s.saturating_add(1);
    if n < required {
        return Ok(too_short(method, series, required));
    }

    let window = &counts[..s];
    let sleep_max = window.iter().copied().max().unwrap_or(0);
    let asleep = window.iter().all(|&c| c as f64 <= cs);

    // Bounded by the series total, which is checked at construction.
    let awakening: u64 = if cumulative {
        counts[s..].iter().sum()
    } else {
        counts[s]
    };
    let awake = if cumulative {
        awakening as f64 > ca
    } else {
        awakening as f64 >= ca
    };

    Ok(ClassificationResult::new(method, asleep && awake)
        .metric("series_length", n as f64)
        .metric("sleep_start", 0.0)
        .metric("sleep_end", (s - 1) as f64)
        .metric("sleep_max_citations", sleep_max as f64)
        .metric("awakening_year", s as f64)
        .metric("awakening_citations", awakening as f64))
}

/// Mean citations of years `0..=s` against the mean of the next `a` years.
pub(crate) fn average(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let method = ClassificationMethod::Average;
    let s = params.integer("s")?;
    let cs = params.real("cs")?;
    let a = params.integer("a")?;
    let ca = params.real("ca")?;

    let counts = series.counts();
    let required = s.saturating_add(a).saturating_add(1);
    if counts.len() < required {
        return Ok(too_short(method, series, required));
    }

    let sleep_mean = mean(&counts[..=s]);
    let awake_mean = mean(&counts[s + 1..required]);
    let is_hibernator = sleep_mean <= cs && awake_mean >= ca;

    Ok(ClassificationResult::new(method, is_hibernator)
        .metric("sleep_end", s as f64)
        .metric("awake_end", (required - 1) as f64)
        .metric("sleep_mean", sleep_mean)
        .metric("awake_mean", awake_mean))
}

/// Shared rule of the score-threshold methods.
fn score_threshold(
    method: ClassificationMethod,
    series: &CitationSeries,
    params: &ResolvedParameters,
    threshold_name: &str,
    score: f64,
) -> HibernatorResult<ClassificationResult> {
    let threshold = params.real(threshold_name)?;
    let min_citations = params.real("min_citations")?;
    let total = series.total();
    let (peak_year, peak_citations) = series.peak();

    let is_hibernator = total as f64 >= min_citations && score >= threshold;

    Ok(ClassificationResult::new(method, is_hibernator)
        .metric("score", score)
        .metric("total_citations", total as f64)
        .metric("peak_year", peak_year as f64)
        .metric("peak_citations", peak_citations as f64))
}

pub(crate) fn adjusted_gini(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let score = scores::adjusted_gini(series.counts());
    score_threshold(ClassificationMethod::AdjustedGini, series, params, "min_score", score)
}

pub(crate) fn beauty_coefficient(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let score = scores::beauty_coefficient(series.counts());
    score_threshold(
        ClassificationMethod::BeautyCoefficient,
        series,
        params,
        "min_score",
        score,
    )
}

pub(crate) fn beauty_coefficient_cumulative(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let score = scores::beauty_coefficient_cumulative(series.counts());
    score_threshold(
        ClassificationMethod::BeautyCoefficientCumulative,
        series,
        params,
        "min_score",
        score,
    )
}

pub(crate) fn k_value(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let score = scores::k_value(series.counts());
    score_threshold(ClassificationMethod::KValue, series, params, "min_score", score)
}

/// Delay of cumulative accumulation; the mean early cumulative share must stay
/// strictly below `1 - min_delay`, so a delay equal to `min_delay` does not
/// qualify.
pub(crate) fn citation_delay(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let delay = scores::citation_delay(series.counts());
    let min_delay = params.real("min_delay")?;
    let mut result = score_threshold(
        ClassificationMethod::CitationDelay,
        series,
        params,
        "min_delay",
        delay,
    )?;
    result.is_hibernator = result.is_hibernator && delay > min_delay;
    Ok(result
        .metric("delay", delay)
        .metric("mean_cumulative_share", 1.0 - delay))
}

/// Late, steep second-half peak after a quiet first half.
pub(crate) fn citation_angle(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let method = ClassificationMethod::CitationAngle;
    let c_before_average = params.real("c_before_average")?;
    let c_peak = params.real("c_peak")?;
    let angle_after = params.real("angle_after")?;
    let span = params.real("span")?;

    let counts = series.counts();
    let n = counts.len();
    if n <= CITATION_ANGLE_MIN_YEARS {
        return Ok(too_short(method, series, CITATION_ANGLE_MIN_YEARS + 1));
    }

    let half = n / 2;
    let (first_peak_year, _) = scores::earliest_peak(&counts[..half]);
    let first_half_mean = mean(&counts[..half]);
    let (offset, peak) = scores::earliest_peak(&counts[half..]);
    let peak_year = half + offset;
    let angle = (peak as f64 / peak_year as f64).atan().to_degrees();
    let peak_span = peak_year - first_peak_year;

    let is_hibernator = peak as f64 > c_peak
        && angle > angle_after
        && first_half_mean <= c_before_average
        && peak_span as f64 >= span;

    Ok(ClassificationResult::new(method, is_hibernator)
        .metric("half_length", half as f64)
        .metric("first_half_peak_year", first_peak_year as f64)
        .metric("first_half_mean", first_half_mean)
        .metric("peak_year", peak_year as f64)
        .metric("peak_citations", peak as f64)
        .metric("angle", angle)
        .metric("peak_span", peak_span as f64))
}

/// Peak in the final fifth of the history dominating the rest.
pub(crate) fn exponential_quartile(
    series: &CitationSeries,
    params: &ResolvedParameters,
) -> HibernatorResult<ClassificationResult> {
    let method = ClassificationMethod::ExponentialQuartile;
    let k = params.real("k")?;

    let counts = series.counts();
    let n = counts.len();
    let wake_len = n / 5;
    if wake_len == 0 {
        return Ok(too_short(method, series, 5));
    }

    let sleep_len = n - wake_len;
    let sleep_max = counts[..sleep_len].iter().copied().max().unwrap_or(0);
    let wake_max = counts[sleep_len..].iter().copied().max().unwrap_or(0);
    let wake_threshold = (k * sleep_len as f64).sqrt();

    let is_hibernator =
        wake_max > sleep_max.saturating_mul(4) && wake_max as f64 > wake_threshold;

    Ok(ClassificationResult::new(method, is_hibernator)
        .metric("sleep_end", (sleep_len - 1) as f64)
        .metric("sleep_max_citations", sleep_max as f64)
        .metric("wake_max_citations", wake_max as f64)
        .metric("wake_threshold", wake_threshold))
}

/// Subjects and publication year, or the matching `MissingContext` error.
fn cohort_context<'a>(
    method: ClassificationMethod,
    series: &'a CitationSeries,
    baseline: Option<&'a CohortBaseline>,
) -> HibernatorResult<(&'a BTreeSet<String>, i32, &'a CohortBaseline)> {
    let subjects = series
        .subjects()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HibernatorError::missing_context(method.name(), "series has no subject codes"))?;
    let year = series.pub_year().ok_or_else(|| {
        HibernatorError::missing_context(method.name(), "series has no publication year")
    })?;
    let baseline = baseline.ok_or_else(|| {
        HibernatorError::missing_context(method.name(), "no cohort baseline supplied")
    })?;
    Ok((subjects, year, baseline))
}

/// Dynamically normalized citation impact: yearly citations divided by the
/// subject's expected citations in the same calendar year.
///
/// The peak must fall in the second half of the history and exceed `c_peak`
/// times the subject expectation, while every year before the two-year run-up
/// to the peak stays below `c_before_peak`. One qualifying subject suffices.
/// Pre-peak years without a subject expectation count as zero impact; subjects
/// without an expectation in the peak year are not evaluated.
pub(crate) fn dnic(
    series: &CitationSeries,
    params: &ResolvedParameters,
    baseline: Option<&CohortBaseline>,
) -> HibernatorResult<ClassificationResult> {
    let method = ClassificationMethod::Dnic;
    let (subjects, year, baseline) = cohort_context(method, series, baseline)?;
    let c_peak = params.real("c_peak")?;
    let c_before_peak = params.real("c_before_peak")?;

    let counts = series.counts();
    let half = counts.len() / 2;
    let (peak_year, peak) = series.peak();

    let mut result = ClassificationResult::new(method, false)
        .metric("half_length", half as f64)
        .metric("peak_year", peak_year as f64)
        .metric("peak_calendar_year", (year + peak_year as i32) as f64)
        .metric("peak_citations", peak as f64);
    if peak_year <= half {
        return Ok(result.metric("subjects_evaluated", 0.0));
    }

    let mut evaluated = 0usize;
    let mut best_peak_dnic = f64::NEG_INFINITY;
    for subject in subjects {
        let Some(expected) = baseline
            .expected_citations(subject, year + peak_year as i32)
            .filter(|&e| e > 0.0)
        else {
            continue;
        };
        evaluated += 1;

        let peak_dnic = peak as f64 / expected;
        best_peak_dnic = best_peak_dnic.max(peak_dnic);
        if peak_dnic <= c_peak {
            continue;
        }

        let run_up_start = peak_year.saturating_sub(2);
        if run_up_start == 0 {
            continue;
        }
        let max_pre_peak = counts[..run_up_start]
            .iter()
            .enumerate()
            .map(|(offset, &c)| {
                baseline
                    .expected_citations(subject, year + offset as i32)
                    .filter(|&e| e > 0.0)
                    .map_or(0.0, |e| c as f64 / e)
            })
            .fold(0.0_f64, f64::max);

        if max_pre_peak < c_before_peak {
            result.is_hibernator = true;
            result = result
                .metric("peak_dnic", peak_dnic)
                .metric("max_pre_peak_dnic", max_pre_peak);
            break;
        }
    }

    if !result.is_hibernator && evaluated > 0 {
        result = result.metric("peak_dnic", best_peak_dnic);
    }
    Ok(result.metric("subjects_evaluated", evaluated as f64))
}

/// Half-life year scored against the cohort of same-subject, same-year papers:
/// 1 when faster than the `rate_before` quantile, 3 when slower than the
/// `rate_after` quantile, 2 otherwise. Hibernator when the mean score across
/// the subjects with a cohort reaches `min_score`.
pub(crate) fn quartile(
    series: &CitationSeries,
    params: &ResolvedParameters,
    baseline: Option<&CohortBaseline>,
) -> HibernatorResult<ClassificationResult> {
    let method = ClassificationMethod::Quartile;
    let (subjects, year, baseline) = cohort_context(method, series, baseline)?;
    let rate_before = params.real("rate_before")?;
    let rate_after = params.real("rate_after")?;
    let min_score = params.real("min_score")?;

    let half_life = scores::half_life_year(series.counts());

    let subject_scores: Vec<f64> = subjects
        .iter()
        .filter_map(|subject| {
            let fast = baseline.half_life_quantile(subject, year, rate_before)?;
            let slow = baseline.half_life_quantile(subject, year, rate_after)?;
            Some(if half_life < fast {
                1.0
            } else if half_life > slow {
                3.0
            } else {
                2.0
            })
        })
        .collect();

    if subject_scores.is_empty() {
        return Err(HibernatorError::missing_context(
            method.name(),
            format!("no half-life cohort for any subject published in {}", year),
        ));
    }

    let mean_score = subject_scores.iter().sum::<f64>() / subject_scores.len() as f64;

    Ok(ClassificationResult::new(method, mean_score >= min_score)
        .metric("half_life_year", half_life as f64)
        .metric("mean_score", mean_score)
        .metric("subjects_evaluated", subject_scores.len() as f64))
}
