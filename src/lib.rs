//! # Hibernator
//!
//! Detection of "hibernators" (delayed-recognition papers, also called sleeping
//! beauties) from yearly citation histories.
//!
//! A hibernator is a publication that receives little attention for years and
//! is then abruptly cited. Eleven published classification methods are
//! provided behind one interface, together with a Monte Carlo null model that
//! tells whether a classification reflects the temporal shape of the history
//! or merely its volume and length.
//!
//! ## Key Features
//!
//! - **Eleven Classifiers**: fixed-threshold, score, peak-delay, cumulative-ratio
//!   and field-normalized families, each with a declared parameter schema
//! - **Audit Metrics**: every decision carries the values that justify it
//! - **Cohort Baselines**: subject/year baselines for the field-normalized methods
//! - **Surrogate Testing**: permutation, multinomial and block-shuffle null models
//!   with reproducible ChaCha20 seeding
//! - **Batch Extraction**: many methods over a corpus with per-slot failure
//!   isolation and optional parallelism
//!
//! ## Quick Start
//!
//! ```rust
//! use hibernator::{CitationSeries, ClassificationMethod, MethodParameters};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let series = CitationSeries::new(vec![0, 0, 0, 0, 0, 150])?;
//!     let params = MethodParameters::new()
//!         .with("s", 5.0)
//!         .with("cs", 2.0)
//!         .with("ca", 100.0);
//!
//!     let result = ClassificationMethod::Naive.classify(&series, &params)?;
//!     assert!(result.is_hibernator);
//!     assert_eq!(result.get_metric("awakening_year"), Some(5.0));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! [`CitationSeries`] is the validated input. [`ClassificationMethod`] is the
//! closed set of classifiers and [`MethodRegistry`] looks them up by name.
//! [`MonteCarloRunner`] repeats a classification over surrogate histories and
//! [`BatchExtractor`] drives both across a corpus of [`Publication`]s.
//!
//! The library installs no logger; progress is reported through the `log`
//! facade.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod baseline;
pub mod config;
pub mod errors;
pub mod parameters;
pub mod results;
pub mod scores;
pub mod secure_rng;
pub mod series;

// Classification and testing
pub mod batch_extraction;
mod classifiers;
pub mod monte_carlo;
pub mod registry;
pub mod surrogates;

// Re-exports for convenience - main public API
pub use baseline::CohortBaseline;
pub use batch_extraction::{extract_all, hibernator_counts, hibernators, BatchExtractor, BatchSlot};
pub use config::{ExtractionConfig, SignificanceSettings};
pub use errors::{HibernatorError, HibernatorResult};
pub use monte_carlo::{MonteCarloConfig, MonteCarloRunner, SimulationSummary};
pub use parameters::{Domain, MethodParameters, ParameterKind, ParameterSpec, ResolvedParameters};
pub use registry::{ClassificationMethod, MethodRegistry};
pub use results::ClassificationResult;
pub use secure_rng::SecureRng;
pub use series::{CitationSeries, Publication, PublicationRecord};
pub use surrogates::{generate_surrogate, SurrogateRule};
