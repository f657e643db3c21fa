//! Errors for the change-point stack (series validation, parameter checks,
//! estimator consistency faults, event-window configuration).
//!
//! This module defines the model error type, [`ChangePointError`], used across
//! the core Rust API and the optional Python bindings. It implements
//! `Display`/`Error` and converts to `PyErr` when the `python-bindings`
//! feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** and count positions in the modeled series.
//! - Input-validation variants (empty series, non-monotonic dates, invalid
//!   parameters) are raised synchronously by constructors and by
//!   [`log_likelihood`](crate::changepoint::models::switch::log_likelihood).
//! - [`ChangePointError::IndexOutOfRange`] is an internal-consistency fault of
//!   the estimator and is never clamped away.
//! - Sampler failures are wrapped via [`ChangePointError::Sampling`]; a
//!   convergence warning is *not* an error and never appears here.
use chrono::NaiveDate;
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};
use statrs::distribution::{DiscreteUniformError, NormalError};

use crate::sampling::errors::SamplerError;

/// Crate-wide result alias for change-point operations.
pub type ChangePointResult<T> = Result<T, ChangePointError>;

/// Unified error type for change-point modeling, estimation and event
/// correlation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangePointError {
    // ---- Input/data validation ----
    /// Series is empty.
    EmptySeries,

    /// A value is NaN/±inf.
    NonFiniteValue { index: usize, value: f64 },

    /// Timestamps must be strictly increasing.
    NonMonotonicTimestamps { index: usize, previous: NaiveDate, current: NaiveDate },

    /// Log transform requires strictly positive prices.
    NonPositiveForLog { index: usize, value: f64 },

    /// Requested sub-window is empty or exceeds the series.
    InvalidWindowRange { start: usize, end: usize, len: usize },

    // ---- Parameters / priors ----
    /// Break index must lie in `[0, len - 1]`.
    BreakIndexOutOfRange { index: usize, len: usize },

    /// Noise scale must be finite and strictly positive.
    InvalidSigma { value: f64 },

    /// Segment means must be finite.
    InvalidMean { value: f64, which: &'static str },

    /// Prior scale hyperparameters must be finite and strictly positive.
    InvalidPriorScale { value: f64, which: &'static str },

    /// statrs rejected a distribution parameterization.
    Distribution { reason: String },

    // ---- Estimator ----
    /// Posterior sample set holds no draws.
    EmptySampleSet,

    /// Sample set parameters do not match the model layout.
    SampleSetMismatch { expected: usize, actual: usize },

    /// Credible mass must lie strictly between 0 and 1.
    InvalidCredibleMass { value: f64 },

    /// Reduced break index falls outside the series.
    IndexOutOfRange { index: usize, len: usize },

    // ---- Event correlation ----
    /// Correlation window must be non-negative.
    InvalidWindow { days: i64 },

    // ---- Sampler ----
    /// Posterior sampling failed or was cancelled.
    Sampling(SamplerError),
}

impl std::error::Error for ChangePointError {}

impl std::fmt::Display for ChangePointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input/data validation ----
            ChangePointError::EmptySeries => {
                write!(f, "Input series is empty.")
            }
            ChangePointError::NonFiniteValue { index, value } => {
                write!(f, "Value at index {index} is non-finite: {value}")
            }
            ChangePointError::NonMonotonicTimestamps { index, previous, current } => {
                write!(
                    f,
                    "Timestamps must be strictly increasing; index {index} has {current} after {previous}"
                )
            }
            ChangePointError::NonPositiveForLog { index, value } => {
                write!(f, "Log transform requires positive values; index {index} has {value}")
            }
            ChangePointError::InvalidWindowRange { start, end, len } => {
                write!(f, "Window {start}..{end} is empty or exceeds series length {len}")
            }
            // ---- Parameters / priors ----
            ChangePointError::BreakIndexOutOfRange { index, len } => {
                write!(f, "Break index {index} outside valid range [0, {}]", len.saturating_sub(1))
            }
            ChangePointError::InvalidSigma { value } => {
                write!(f, "Noise scale sigma must be finite and > 0; got: {value}")
            }
            ChangePointError::InvalidMean { value, which } => {
                write!(f, "Segment mean {which} must be finite; got: {value}")
            }
            ChangePointError::InvalidPriorScale { value, which } => {
                write!(f, "Prior scale {which} must be finite and > 0; got: {value}")
            }
            ChangePointError::Distribution { reason } => {
                write!(f, "Invalid distribution parameters: {reason}")
            }
            // ---- Estimator ----
            ChangePointError::EmptySampleSet => {
                write!(f, "Posterior sample set is empty.")
            }
            ChangePointError::SampleSetMismatch { expected, actual } => {
                write!(
                    f,
                    "Sample set has {actual} continuous parameters; change-point model expects {expected}"
                )
            }
            ChangePointError::InvalidCredibleMass { value } => {
                write!(f, "Credible mass must lie in (0, 1); got: {value}")
            }
            ChangePointError::IndexOutOfRange { index, len } => {
                write!(f, "Estimated break index {index} is outside the series (length {len})")
            }
            // ---- Event correlation ----
            ChangePointError::InvalidWindow { days } => {
                write!(f, "Correlation window must be non-negative; got: {days} days")
            }
            // ---- Sampler ----
            ChangePointError::Sampling(err) => {
                write!(f, "Posterior sampling failed: {err}")
            }
        }
    }
}

impl From<SamplerError> for ChangePointError {
    fn from(err: SamplerError) -> Self {
        ChangePointError::Sampling(err)
    }
}

impl From<NormalError> for ChangePointError {
    fn from(err: NormalError) -> Self {
        ChangePointError::Distribution { reason: err.to_string() }
    }
}

impl From<DiscreteUniformError> for ChangePointError {
    fn from(err: DiscreteUniformError) -> Self {
        ChangePointError::Distribution { reason: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ChangePointError> for PyErr {
    fn from(err: ChangePointError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - `Display` output for representative variants.
    // - Conversions from `SamplerError` and statrs errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Messages carry the offending index and value.
    fn display_reports_index_and_value() {
        let err = ChangePointError::NonFiniteValue { index: 3, value: f64::NAN };
        assert_eq!(err.to_string(), "Value at index 3 is non-finite: NaN");

        let err = ChangePointError::BreakIndexOutOfRange { index: 10, len: 10 };
        assert_eq!(err.to_string(), "Break index 10 outside valid range [0, 9]");
    }

    #[test]
    // Purpose
    // -------
    // Sampler errors are wrapped rather than flattened.
    fn sampler_error_is_wrapped() {
        let err: ChangePointError = SamplerError::InvalidChains { chains: 0 }.into();
        assert_eq!(err, ChangePointError::Sampling(SamplerError::InvalidChains { chains: 0 }));
    }

    #[test]
    // Purpose
    // -------
    // statrs construction errors map into `Distribution`.
    fn statrs_error_maps_to_distribution() {
        let err: ChangePointError = statrs::distribution::Normal::new(0.0, -1.0).unwrap_err().into();
        assert!(matches!(err, ChangePointError::Distribution { .. }));
    }
}
