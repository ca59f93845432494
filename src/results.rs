//! # Classification Results
//!
//! The immutable record produced for every (publication, method, parameter set)
//! combination.

use crate::registry::ClassificationMethod;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of applying one classification method to one citation series.
///
/// `metrics` holds the method-specific values that justify the decision, such
/// as the detected sleeping window, the peak year or the score compared
/// against its threshold. Offsets are years since publication.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassificationResult {
    /// Caller-supplied identity; `None` when classified outside a batch
    pub publication_id: Option<String>,
    /// Method that produced the result
    pub method: ClassificationMethod,
    /// Whether the publication is classified as a hibernator
    pub is_hibernator: bool,
    /// Audit metrics, keyed by name (deterministic ordering)
    pub metrics: BTreeMap<String, f64>,
}

impl ClassificationResult {
    pub(crate) fn new(method: ClassificationMethod, is_hibernator: bool) -> Self {
        Self {
            publication_id: None,
            method,
            is_hibernator,
            metrics: BTreeMap::new(),
        }
    }

    pub(crate) fn metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    /// Attach the caller's publication identity.
    pub fn for_publication(mut self, id: impl Into<String>) -> Self {
        self.publication_id = Some(id.into());
        self
    }

    /// Look up an audit metric.
    pub fn get_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}
