//! # Method Parameters
//!
//! Parameter records supplied by callers and the per-method schemas they are
//! validated against. Schemas are declared as data ([`ParameterSpec`]) so every
//! method rejects bad input the same way: unrecognized names, missing values
//! without a default, non-finite numbers, non-integral counts and out-of-domain
//! values all fail with [`HibernatorError::InvalidParameters`].

use crate::errors::{HibernatorError, HibernatorResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric parameters for one classification method, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodParameters {
    values: BTreeMap<String, f64>,
}

impl MethodParameters {
    /// Empty parameter set; every parameter falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Set or replace a value.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Raw value as supplied, before validation.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Supplied `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of supplied values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for MethodParameters {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// How a parameter value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Whole number of years (or similar count)
    Integer,
    /// Any real number inside the domain
    Real,
    /// 0 = off, 1 = on
    Flag,
}

/// Valid value range of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// `lo <= x`
    AtLeast(f64),
    /// `lo < x`
    GreaterThan(f64),
    /// `lo <= x <= hi`
    Closed(f64, f64),
    /// `lo <= x < hi`
    HalfOpen(f64, f64),
    /// Any finite value
    Unbounded,
}

impl Domain {
    /// Whether `value` lies inside the domain.
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Domain::AtLeast(lo) => value >= lo,
            Domain::GreaterThan(lo) => value > lo,
            Domain::Closed(lo, hi) => value >= lo && value <= hi,
            Domain::HalfOpen(lo, hi) => value >= lo && value < hi,
            Domain::Unbounded => true,
        }
    }

    fn describe(&self) -> String {
        match *self {
            Domain::AtLeast(lo) => format!(">= {}", lo),
            Domain::GreaterThan(lo) => format!("> {}", lo),
            Domain::Closed(lo, hi) => format!("in [{}, {}]", lo, hi),
            Domain::HalfOpen(lo, hi) => format!("in [{}, {})", lo, hi),
            Domain::Unbounded => "finite".to_string(),
        }
    }
}

/// Declared schema entry for one method parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Parameter name as used in [`MethodParameters`]
    pub name: &'static str,
    /// Interpretation of the value
    pub kind: ParameterKind,
    /// Valid range
    pub domain: Domain,
    /// Value used when the caller omits the parameter; `None` means required
    pub default: Option<f64>,
    /// One-line meaning
    pub description: &'static str,
}

impl ParameterSpec {
    /// Required integer parameter.
    pub const fn integer(name: &'static str, domain: Domain, description: &'static str) -> Self {
        Self {
            name,
            kind: ParameterKind::Integer,
            domain,
            default: None,
            description,
        }
    }

    /// Required real parameter.
    pub const fn real(name: &'static str, domain: Domain, description: &'static str) -> Self {
        Self {
            name,
            kind: ParameterKind::Real,
            domain,
            default: None,
            description,
        }
    }

    /// On/off switch, off unless stated otherwise.
    pub const fn flag(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParameterKind::Flag,
            domain: Domain::Closed(0.0, 1.0),
            default: Some(0.0),
            description,
        }
    }

    /// Same spec with a default value.
    pub const fn or(mut self, default: f64) -> Self {
        self.default = Some(default);
        self
    }

    fn check(&self, method: &str, value: f64) -> HibernatorResult<f64> {
        if !value.is_finite() {
            return Err(HibernatorError::invalid_parameter(
                method,
                self.name,
                format!("= {} is not a finite number", value),
            ));
        }
        if matches!(self.kind, ParameterKind::Integer | ParameterKind::Flag) && value.fract() != 0.0
        {
            return Err(HibernatorError::invalid_parameter(
                method,
                self.name,
                format!("= {} must be a whole number", value),
            ));
        }
        // usize::MAX rounds up to 2^64 as f64, so the bound is exclusive.
        if self.kind == ParameterKind::Integer && value >= usize::MAX as f64 {
            return Err(HibernatorError::invalid_parameter(
                method,
                self.name,
                format!("= {} is too large for a year count", value),
            ));
        }
        if !self.domain.contains(value) {
            return Err(HibernatorError::invalid_parameter(
                method,
                self.name,
                format!("= {} must be {}", value, self.domain.describe()),
            ));
        }
        Ok(value)
    }
}

/// Parameters validated against a schema, with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    method: &'static str,
    values: BTreeMap<&'static str, f64>,
}

impl ResolvedParameters {
    /// Validate `params` against `schema` on behalf of `method`.
    pub fn resolve(
        method: &'static str,
        schema: &[ParameterSpec],
        params: &MethodParameters,
    ) -> HibernatorResult<Self> {
        if let Some((name, value)) = params
            .iter()
            .find(|(name, _)| !schema.iter().any(|spec| spec.name == *name))
        {
            return Err(HibernatorError::invalid_parameter(
                method,
                name,
                format!("= {} is not recognized", value),
            ));
        }

        let mut values = BTreeMap::new();
        for spec in schema {
            let raw = params.get(spec.name).or(spec.default).ok_or_else(|| {
                HibernatorError::invalid_parameter(method, spec.name, "is required but missing")
            })?;
            values.insert(spec.name, spec.check(method, raw)?);
        }

        Ok(Self { method, values })
    }

    /// Method these parameters were resolved for.
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Real value of a declared parameter.
    pub fn real(&self, name: &str) -> HibernatorResult<f64> {
        self.values.get(name).copied().ok_or_else(|| {
            HibernatorError::invalid_parameter(self.method, name, "is not declared by this method")
        })
    }

    /// Integer value of a declared parameter.
    pub fn integer(&self, name: &str) -> HibernatorResult<usize> {
        self.real(name).map(|v| v as usize)
    }

    /// Flag value of a declared parameter.
    pub fn flag(&self, name: &str) -> HibernatorResult<bool> {
        self.real(name).map(|v| v != 0.0)
    }

    /// All resolved values in name order, for reporting.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }
}
