//! Error types and validation functions for hibernator classification.
//!
//! Every fallible operation in the crate returns [`HibernatorResult`]. Errors carry
//! the method and parameter names involved so a failure can be acted on without
//! inspecting internals.

use thiserror::Error;

/// Error types for citation-series classification and simulation.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum HibernatorError {
    /// Malformed citation series (empty, negative counts).
    #[error("Invalid citation series: {reason}")]
    InvalidSeries {
        /// What is wrong with the series
        reason: String,
    },

    /// Missing, unrecognized, non-numeric or out-of-domain method parameter.
    #[error("Invalid parameters for method '{method}': {parameter} {reason}")]
    InvalidParameters {
        /// Method (or harness component) the parameter belongs to
        method: String,
        /// Parameter name
        parameter: String,
        /// Violated constraint, including the offending value when present
        reason: String,
    },

    /// Field-normalized method invoked without the context it needs.
    #[error("Missing context for method '{method}': {missing}")]
    MissingContext {
        /// Method that required the context
        method: String,
        /// Description of the missing input (subjects, pub_year, baseline)
        missing: String,
    },

    /// Offset outside the observed citation history.
    #[error("Index out of range: offset {index} in series of length {len}")]
    IndexOutOfRange {
        /// Requested offset
        index: usize,
        /// Series length
        len: usize,
    },

    /// Registry lookup for a method name that does not exist.
    #[error("Unknown classification method: {name}")]
    UnknownMethod {
        /// Name that failed to resolve
        name: String,
    },
}

/// Result type for classification operations.
pub type HibernatorResult<T> = Result<T, HibernatorError>;

impl HibernatorError {
    /// Shorthand for an [`HibernatorError::InvalidParameters`] error.
    pub fn invalid_parameter(
        method: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameters {
            method: method.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`HibernatorError::MissingContext`] error.
    pub fn missing_context(method: impl Into<String>, missing: impl Into<String>) -> Self {
        Self::MissingContext {
            method: method.into(),
            missing: missing.into(),
        }
    }
}

/// Validates that a parameter value is finite and lies in `[min, max]`.
///
/// # Example
/// ```rust
/// use hibernator::errors::validate_parameter;
///
/// assert!(validate_parameter(0.05, 0.0, 1.0, "significance_level", "monte_carlo").is_ok());
/// assert!(validate_parameter(1.5, 0.0, 1.0, "significance_level", "monte_carlo").is_err());
/// ```
pub fn validate_parameter(
    value: f64,
    min: f64,
    max: f64,
    name: &str,
    method: &str,
) -> HibernatorResult<()> {
    if !value.is_finite() {
        return Err(HibernatorError::invalid_parameter(
            method,
            name,
            format!("= {} must be a finite number", value),
        ));
    }

    if value < min || value > max {
        Err(HibernatorError::invalid_parameter(
            method,
            name,
            format!("= {} outside [{}, {}]", value, min, max),
        ))
    } else {
        Ok(())
    }
}

/// Validates that a count-like parameter is at least `min`.
pub fn validate_min_count(value: usize, min: usize, name: &str, method: &str) -> HibernatorResult<()> {
    if value < min {
        return Err(HibernatorError::invalid_parameter(
            method,
            name,
            format!("= {} must be at least {}", value, min),
        ));
    }
    Ok(())
}
