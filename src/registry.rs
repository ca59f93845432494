//! # Method Registry
//!
//! The eleven hibernator classifiers form a closed set, modeled as the
//! [`ClassificationMethod`] enum. Each variant knows its registry name, its
//! declared parameter schema and how to dispatch to its implementation in
//! [`crate::classifiers`]. [`MethodRegistry`] maps names to methods for callers
//! that select methods from configuration or user input.
//!
//! ## Method families
//!
//! | Name | Family | Context |
//! |------|--------|---------|
//! | `naive` | fixed threshold (sleep window + awakening) | none |
//! | `average` | fixed threshold on window means | none |
//! | `adjusted_gini` | score | none |
//! | `beauty_coefficient` | score | none |
//! | `beauty_coefficient_cumulative` | score | none |
//! | `citation_angle` | peak delay | none |
//! | `citation_delay` | cumulative ratio | none |
//! | `dnic` | field-normalized peak delay | subjects, pub_year, baseline |
//! | `exponential_quartile` | late peak versus sleeping span | none |
//! | `k_value` | score | none |
//! | `quartile` | field-normalized half-life | subjects, pub_year, baseline |

use crate::baseline::CohortBaseline;
use crate::classifiers;
use crate::errors::{HibernatorError, HibernatorResult};
use crate::parameters::{Domain, MethodParameters, ParameterSpec, ResolvedParameters};
use crate::results::ClassificationResult;
use crate::series::CitationSeries;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const MIN_CITATIONS: ParameterSpec = ParameterSpec::real(
    "min_citations",
    Domain::AtLeast(0.0),
    "minimum total citations before a score is considered",
)
.or(1.0);

const NAIVE_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::integer("s", Domain::AtLeast(1.0), "sleep length in years"),
    ParameterSpec::real("cs", Domain::AtLeast(0.0), "maximum yearly citations while asleep"),
    ParameterSpec::real("ca", Domain::AtLeast(0.0), "minimum citations in the awakening year"),
    ParameterSpec::flag(
        "cumulative",
        "compare cumulative citations from the awakening year onward instead of a single year",
    ),
];

const AVERAGE_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::integer("s", Domain::AtLeast(0.0), "last offset of the sleeping window"),
    ParameterSpec::real("cs", Domain::AtLeast(0.0), "maximum mean citations while asleep"),
    ParameterSpec::integer("a", Domain::AtLeast(1.0), "awake window length in years"),
    ParameterSpec::real("ca", Domain::AtLeast(0.0), "minimum mean citations while awake"),
];

const ADJUSTED_GINI_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real("min_score", Domain::Closed(-1.0, 1.0), "minimum adjusted Gini").or(0.5),
    MIN_CITATIONS,
];

const BEAUTY_COEFFICIENT_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real("min_score", Domain::Unbounded, "minimum beauty coefficient").or(100.0),
    MIN_CITATIONS,
];

const BEAUTY_COEFFICIENT_CUMULATIVE_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real(
        "min_score",
        Domain::Unbounded,
        "minimum cumulative-percentage beauty coefficient",
    )
    .or(1.0),
    MIN_CITATIONS,
];

const CITATION_ANGLE_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real(
        "c_before_average",
        Domain::AtLeast(0.0),
        "maximum mean yearly citations in the first half",
    )
    .or(2.0),
    ParameterSpec::real("c_peak", Domain::AtLeast(0.0), "second-half peak must exceed this").or(20.0),
    ParameterSpec::real(
        "angle_after",
        Domain::Closed(0.0, 90.0),
        "citation angle of the second-half peak must exceed this (degrees)",
    )
    .or(5.0),
    ParameterSpec::real(
        "span",
        Domain::AtLeast(0.0),
        "minimum years between first-half and second-half peaks",
    )
    .or(10.0),
];

const CITATION_DELAY_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real("min_delay", Domain::Closed(0.0, 1.0), "minimum citation delay").or(0.7),
    MIN_CITATIONS,
];

const DNIC_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real(
        "c_peak",
        Domain::GreaterThan(0.0),
        "normalized impact at the peak must exceed this",
    )
    .or(2.0),
    ParameterSpec::real(
        "c_before_peak",
        Domain::GreaterThan(0.0),
        "normalized impact before the peak must stay below this",
    )
    .or(0.5),
];

const EXPONENTIAL_QUARTILE_SCHEMA: &[ParameterSpec] = &[ParameterSpec::real(
    "k",
    Domain::GreaterThan(0.0),
    "wake intensity scale; smaller values accept shorter sleeps",
)
.or(4.0)];

const K_VALUE_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real("min_score", Domain::AtLeast(0.0), "minimum K value").or(0.7),
    MIN_CITATIONS,
];

const QUARTILE_SCHEMA: &[ParameterSpec] = &[
    ParameterSpec::real(
        "rate_before",
        Domain::HalfOpen(0.0, 1.0),
        "cohort quantile below which half-life counts as fast",
    )
    .or(0.25),
    ParameterSpec::real(
        "rate_after",
        Domain::HalfOpen(0.0, 1.0),
        "cohort quantile above which half-life counts as slow",
    )
    .or(0.75),
    ParameterSpec::real(
        "min_score",
        Domain::Closed(1.0, 3.0),
        "minimum mean durability score across subjects",
    )
    .or(2.5),
];

/// The eleven hibernator classification methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClassificationMethod {
    /// Cold sleeping window followed immediately by an awakening year
    Naive,
    /// Mean citations of a sleeping window versus the following awake window
    Average,
    /// Late-weighted adjusted Gini coefficient
    AdjustedGini,
    /// Shortfall below the line to the citation peak
    BeautyCoefficient,
    /// Beauty coefficient on cumulative citation shares
    BeautyCoefficientCumulative,
    /// Citation angle of a late peak versus first-half activity
    CitationAngle,
    /// Late accumulation of cumulative citation share
    CitationDelay,
    /// Dynamically normalized citation impact against subject-year baselines
    Dnic,
    /// Peak in the final fifth against the sleeping four-fifths
    ExponentialQuartile,
    /// Root-mean-square citation age over the first two decades
    KValue,
    /// Half-life year against subject-year cohort quantiles
    Quartile,
}

impl ClassificationMethod {
    /// All methods in registry order.
    pub const ALL: [ClassificationMethod; 11] = [
        ClassificationMethod::Naive,
        ClassificationMethod::Average,
        ClassificationMethod::AdjustedGini,
        ClassificationMethod::BeautyCoefficient,
        ClassificationMethod::BeautyCoefficientCumulative,
        ClassificationMethod::CitationAngle,
        ClassificationMethod::CitationDelay,
        ClassificationMethod::Dnic,
        ClassificationMethod::ExponentialQuartile,
        ClassificationMethod::KValue,
        ClassificationMethod::Quartile,
    ];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            ClassificationMethod::Naive => "naive",
            ClassificationMethod::Average => "average",
            ClassificationMethod::AdjustedGini => "adjusted_gini",
            ClassificationMethod::BeautyCoefficient => "beauty_coefficient",
            ClassificationMethod::BeautyCoefficientCumulative => "beauty_coefficient_cumulative",
            ClassificationMethod::CitationAngle => "citation_angle",
            ClassificationMethod::CitationDelay => "citation_delay",
            ClassificationMethod::Dnic => "dnic",
            ClassificationMethod::ExponentialQuartile => "exponential_quartile",
            ClassificationMethod::KValue => "k_value",
            ClassificationMethod::Quartile => "quartile",
        }
    }

    /// Declared parameter schema.
    pub fn schema(&self) -> &'static [ParameterSpec] {
        match self {
            ClassificationMethod::Naive => NAIVE_SCHEMA,
            ClassificationMethod::Average => AVERAGE_SCHEMA,
            ClassificationMethod::AdjustedGini => ADJUSTED_GINI_SCHEMA,
            ClassificationMethod::BeautyCoefficient => BEAUTY_COEFFICIENT_SCHEMA,
            ClassificationMethod::BeautyCoefficientCumulative => {
                BEAUTY_COEFFICIENT_CUMULATIVE_SCHEMA
            }
            ClassificationMethod::CitationAngle => CITATION_ANGLE_SCHEMA,
            ClassificationMethod::CitationDelay => CITATION_DELAY_SCHEMA,
            ClassificationMethod::Dnic => DNIC_SCHEMA,
            ClassificationMethod::ExponentialQuartile => EXPONENTIAL_QUARTILE_SCHEMA,
            ClassificationMethod::KValue => K_VALUE_SCHEMA,
            ClassificationMethod::Quartile => QUARTILE_SCHEMA,
        }
    }

    /// Whether the method needs subjects, publication year and a cohort baseline.
    pub fn is_field_normalized(&self) -> bool {
        matches!(self, ClassificationMethod::Dnic | ClassificationMethod::Quartile)
    }

    /// Validate `params` against this method's schema.
    pub fn resolve(&self, params: &MethodParameters) -> HibernatorResult<ResolvedParameters> {
        let resolved = ResolvedParameters::resolve(self.name(), self.schema(), params)?;
        if *self == ClassificationMethod::Quartile {
            let before = resolved.real("rate_before")?;
            let after = resolved.real("rate_after")?;
            if before > after {
                return Err(HibernatorError::invalid_parameter(
                    self.name(),
                    "rate_before",
                    format!("= {} must not exceed rate_after = {}", before, after),
                ));
            }
        }
        Ok(resolved)
    }

    /// Classify a series with a method that needs no cohort baseline.
    ///
    /// Field-normalized methods fail with [`HibernatorError::MissingContext`];
    /// use [`ClassificationMethod::classify_with_baseline`] for those.
    pub fn classify(
        &self,
        series: &CitationSeries,
        params: &MethodParameters,
    ) -> HibernatorResult<ClassificationResult> {
        self.classify_with_baseline(series, params, None)
    }

    /// Classify a series, validating `params` first.
    pub fn classify_with_baseline(
        &self,
        series: &CitationSeries,
        params: &MethodParameters,
        baseline: Option<&CohortBaseline>,
    ) -> HibernatorResult<ClassificationResult> {
        let resolved = self.resolve(params)?;
        self.classify_resolved(series, &resolved, baseline)
    }

    /// Classify with parameters that were already resolved for this method.
    ///
    /// Used by the Monte Carlo runner to validate once and classify many
    /// surrogates.
    pub fn classify_resolved(
        &self,
        series: &CitationSeries,
        params: &ResolvedParameters,
        baseline: Option<&CohortBaseline>,
    ) -> HibernatorResult<ClassificationResult> {
        if params.method() != self.name() {
            return Err(HibernatorError::invalid_parameter(
                self.name(),
                "parameters",
                format!("were resolved for method '{}'", params.method()),
            ));
        }

        match self {
            ClassificationMethod::Naive => classifiers::naive(series, params),
            ClassificationMethod::Average => classifiers::average(series, params),
            ClassificationMethod::AdjustedGini => classifiers::adjusted_gini(series, params),
            ClassificationMethod::BeautyCoefficient => {
                classifiers::beauty_coefficient(series, params)
            }
            ClassificationMethod::BeautyCoefficientCumulative => {
                classifiers::beauty_coefficient_cumulative(series, params)
            }
            ClassificationMethod::CitationAngle => classifiers::citation_angle(series, params),
            ClassificationMethod::CitationDelay => classifiers::citation_delay(series, params),
            ClassificationMethod::Dnic => classifiers::dnic(series, params, baseline),
            ClassificationMethod::ExponentialQuartile => {
                classifiers::exponential_quartile(series, params)
            }
            ClassificationMethod::KValue => classifiers::k_value(series, params),
            ClassificationMethod::Quartile => classifiers::quartile(series, params, baseline),
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassificationMethod {
    type Err = HibernatorError;

    fn from_str(name: &str) -> HibernatorResult<Self> {
        ClassificationMethod::ALL
            .into_iter()
            .find(|method| method.name() == name)
            .ok_or_else(|| HibernatorError::UnknownMethod {
                name: name.to_string(),
            })
    }
}

/// Name-keyed lookup over a set of classification methods.
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: BTreeMap<&'static str, ClassificationMethod>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MethodRegistry {
    /// Registry containing all eleven methods.
    pub fn standard() -> Self {
        Self::with_methods(ClassificationMethod::ALL)
    }

    /// Registry restricted to the given methods.
    pub fn with_methods<I>(methods: I) -> Self
    where
        I: IntoIterator<Item = ClassificationMethod>,
    {
        Self {
            methods: methods.into_iter().map(|m| (m.name(), m)).collect(),
        }
    }

    /// Resolve a method by name.
    pub fn get(&self, name: &str) -> HibernatorResult<ClassificationMethod> {
        self.methods
            .get(name)
            .copied()
            .ok_or_else(|| HibernatorError::UnknownMethod {
                name: name.to_string(),
            })
    }

    /// Parameter schema of a method by name.
    pub fn schema(&self, name: &str) -> HibernatorResult<&'static [ParameterSpec]> {
        self.get(name).map(|m| m.schema())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.keys().copied()
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Look up a method by name and classify with it.
    pub fn classify(
        &self,
        name: &str,
        series: &CitationSeries,
        params: &MethodParameters,
        baseline: Option<&CohortBaseline>,
    ) -> HibernatorResult<ClassificationResult> {
        self.get(name)?.classify_with_baseline(series, params, baseline)
    }
}
