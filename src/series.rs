//! # Citation Series
//!
//! The normalized input of every classifier: yearly citation counts starting at
//! the publication year, plus the optional subject codes and publication year
//! required by the field-normalized methods.

use crate::errors::{HibernatorError, HibernatorResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Yearly citation history of one publication.
///
/// `counts[0]` is the number of citations received in the publication year,
/// `counts[k]` the number received `k` years later. A series is immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CitationSeries {
    counts: Vec<u64>,
    subjects: Option<BTreeSet<String>>,
    pub_year: Option<i32>,
}

impl CitationSeries {
    /// Build a series from raw yearly counts.
    ///
    /// Fails with [`HibernatorError::InvalidSeries`] when `counts` is empty,
    /// contains a negative value or sums past `u64::MAX`.
    pub fn new(counts: Vec<i64>) -> HibernatorResult<Self> {
        if counts.is_empty() {
            return Err(HibernatorError::InvalidSeries {
                reason: "citation history must cover at least the publication year".to_string(),
            });
        }

        if let Some((offset, &value)) = counts.iter().enumerate().find(|(_, &c)| c < 0) {
            return Err(HibernatorError::InvalidSeries {
                reason: format!("negative citation count {} at offset {}", value, offset),
            });
        }

        let counts: Vec<u64> = counts.into_iter().map(|c| c as u64).collect();
        checked_total(&counts)?;
        Ok(Self {
            counts,
            subjects: None,
            pub_year: None,
        })
    }

    /// Build a series from counts that are non-negative by construction.
    pub fn from_counts(counts: &[u64]) -> HibernatorResult<Self> {
        if counts.is_empty() {
            return Err(HibernatorError::InvalidSeries {
                reason: "citation history must cover at least the publication year".to_string(),
            });
        }
        checked_total(counts)?;
        Ok(Self {
            counts: counts.to_vec(),
            subjects: None,
            pub_year: None,
        })
    }

    /// Attach subject classification codes.
    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    /// Attach the publication year.
    pub fn with_pub_year(mut self, year: i32) -> Self {
        self.pub_year = Some(year);
        self
    }

    /// Same subjects and publication year, different yearly counts.
    ///
    /// Used to derive surrogate histories that remain eligible for the
    /// field-normalized methods.
    pub fn with_counts(&self, counts: Vec<u64>) -> HibernatorResult<Self> {
        if counts.is_empty() {
            return Err(HibernatorError::InvalidSeries {
                reason: "derived citation history is empty".to_string(),
            });
        }
        checked_total(&counts)?;
        Ok(Self {
            counts,
            subjects: self.subjects.clone(),
            pub_year: self.pub_year,
        })
    }

    /// Yearly counts, index 0 = publication year.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Subject codes, if supplied.
    pub fn subjects(&self) -> Option<&BTreeSet<String>> {
        self.subjects.as_ref()
    }

    /// Publication year, if supplied.
    pub fn pub_year(&self) -> Option<i32> {
        self.pub_year
    }

    /// Number of observed years.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Always false for a constructed series; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total citations over the observed history.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Citations received `k` years after publication.
    pub fn count_at(&self, k: usize) -> HibernatorResult<u64> {
        self.counts
            .get(k)
            .copied()
            .ok_or(HibernatorError::IndexOutOfRange {
                index: k,
                len: self.counts.len(),
            })
    }

    /// Citations accumulated from the publication year up to and including offset `k`.
    pub fn cumulative_at(&self, k: usize) -> HibernatorResult<u64> {
        if k >= self.counts.len() {
            return Err(HibernatorError::IndexOutOfRange {
                index: k,
                len: self.counts.len(),
            });
        }
        Ok(self.counts[..=k].iter().sum())
    }

    /// Running totals, one per year.
    pub fn cumulative(&self) -> Vec<u64> {
        self.counts
            .iter()
            .scan(0u64, |acc, &c| {
                *acc += c;
                Some(*acc)
            })
            .collect()
    }

    /// Offset and value of the yearly maximum; the earliest year wins ties.
    pub fn peak(&self) -> (usize, u64) {
        crate::scores::earliest_peak(&self.counts)
    }

    /// Whether both subjects (non-empty) and publication year are present.
    pub fn has_cohort_context(&self) -> bool {
        self.pub_year.is_some() && self.subjects.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Total citations, or `InvalidSeries` when the sum does not fit in a `u64`.
///
/// Every accessor that sums counts relies on this having been checked once.
fn checked_total(counts: &[u64]) -> HibernatorResult<u64> {
    counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or_else(|| HibernatorError::InvalidSeries {
            reason: "total citations exceed the representable range".to_string(),
        })
}

/// A citation series together with the caller's identity for it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Publication {
    /// Opaque identity supplied by the caller (DOI, database key, ...)
    pub id: String,
    /// Validated citation history
    pub series: CitationSeries,
}

impl Publication {
    /// Pair an identity with a series.
    pub fn new(id: impl Into<String>, series: CitationSeries) -> Self {
        Self {
            id: id.into(),
            series,
        }
    }
}

/// Raw bibliographic record as delivered by an external tabular loader.
///
/// Field names follow the loader's column names. Conversion into a
/// [`Publication`] applies the [`CitationSeries`] validation rules.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublicationRecord {
    /// Caller identity
    pub id: String,
    /// Citation counts per year since publication
    pub c_history: Vec<i64>,
    /// Subject codes
    #[cfg_attr(feature = "serde", serde(default))]
    pub subjs: Option<Vec<String>>,
    /// Publication year
    #[cfg_attr(feature = "serde", serde(default))]
    pub year: Option<i32>,
}

impl TryFrom<PublicationRecord> for Publication {
    type Error = HibernatorError;

    fn try_from(record: PublicationRecord) -> HibernatorResult<Self> {
        let mut series = CitationSeries::new(record.c_history).map_err(|e| match e {
            HibernatorError::InvalidSeries { reason } => HibernatorError::InvalidSeries {
                reason: format!("{} (publication {})", reason, record.id),
            },
            other => other,
        })?;
        if let Some(subjects) = record.subjs {
            series = series.with_subjects(subjects);
        }
        if let Some(year) = record.year {
            series = series.with_pub_year(year);
        }
        Ok(Publication::new(record.id, series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_counts() {
        assert!(matches!(
            CitationSeries::new(vec![]),
            Err(HibernatorError::InvalidSeries { .. })
        ));
    }

    #[test]
    fn test_new_rejects_overflowing_total() {
        assert!(matches!(
            CitationSeries::new(vec![i64::MAX; 3]),
            Err(HibernatorError::InvalidSeries { .. })
        ));
        assert!(matches!(
            CitationSeries::from_counts(&[u64::MAX, 1]),
            Err(HibernatorError::InvalidSeries { .. })
        ));

        let big = CitationSeries::new(vec![i64::MAX, i64::MAX]).unwrap();
        assert_eq!(big.total(), 2 * i64::MAX as u64);
        assert!(big.with_counts(vec![u64::MAX, u64::MAX]).is_err());
    }

    #[test]
    fn test_new_rejects_negative_counts() {
        match CitationSeries::new(vec![1, 2, -3, 4]) {
            Err(HibernatorError::InvalidSeries { reason }) => {
                assert!(reason.contains("-3"));
                assert!(reason.contains("offset 2"));
            }
            other => panic!("Expected InvalidSeries, got {:?}", other),
        }
    }

    #[test]
    fn test_totals_and_offsets() {
        let series = CitationSeries::new(vec![0, 2, 5, 1]).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.total(), 8);
        assert_eq!(series.count_at(2).unwrap(), 5);
        assert_eq!(series.cumulative_at(0).unwrap(), 0);
        assert_eq!(series.cumulative_at(2).unwrap(), 7);
        assert_eq!(series.cumulative(), vec![0, 2, 7, 8]);
    }

    #[test]
    fn test_offset_past_end_is_index_out_of_range() {
        let series = CitationSeries::new(vec![3, 1]).unwrap();
        assert_eq!(
            series.count_at(2),
            Err(HibernatorError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(matches!(
            series.cumulative_at(5),
            Err(HibernatorError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_peak_prefers_earliest_year() {
        let series = CitationSeries::new(vec![1, 7, 3, 7]).unwrap();
        assert_eq!(series.peak(), (1, 7));
    }

    #[test]
    fn test_cohort_context() {
        let bare = CitationSeries::new(vec![1]).unwrap();
        assert!(!bare.has_cohort_context());

        let no_subjects = bare.clone().with_pub_year(2001).with_subjects(Vec::<String>::new());
        assert!(!no_subjects.has_cohort_context());

        let full = bare.with_pub_year(2001).with_subjects(["PHYS"]);
        assert!(full.has_cohort_context());
        assert_eq!(full.pub_year(), Some(2001));
    }

    #[test]
    fn test_with_counts_keeps_context() {
        let series = CitationSeries::new(vec![1, 2])
            .unwrap()
            .with_subjects(["BIO", "CHEM"])
            .with_pub_year(1999);
        let derived = series.with_counts(vec![2, 1]).unwrap();
        assert_eq!(derived.subjects(), series.subjects());
        assert_eq!(derived.pub_year(), Some(1999));
        assert!(series.with_counts(vec![]).is_err());
    }

    #[test]
    fn test_record_conversion() {
        let record = PublicationRecord {
            id: "doi:10.1/x".to_string(),
            c_history: vec![0, 0, 4],
            subjs: Some(vec!["MATH".to_string()]),
            year: Some(1990),
        };
        let publication = Publication::try_from(record).unwrap();
        assert_eq!(publication.id, "doi:10.1/x");
        assert!(publication.series.has_cohort_context());

        let bad = PublicationRecord {
            id: "broken".to_string(),
            c_history: vec![-1],
            subjs: None,
            year: None,
        };
        match Publication::try_from(bad) {
            Err(HibernatorError::InvalidSeries { reason }) => assert!(reason.contains("broken")),
            other => panic!("Expected InvalidSeries, got {:?}", other),
        }
    }
}
