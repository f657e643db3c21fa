//! Change-point parameters and their unconstrained sampler representation.
//!
//! Purpose
//! -------
//! Hold one assignment of the four model parameters
//! `(break_index, mean1, mean2, sigma)` with validated invariants, and map the
//! continuous block to and from the unconstrained vector
//! `θ = (mean1, mean2, θσ)` that the sampler and warm-start optimizer move in.
//!
//! Conventions
//! -----------
//! - `θ` layout: `[MEAN1, MEAN2, SIGMA]` (see the index constants).
//! - `σ = SIGMA_FLOOR + softplus(θσ)`; the means are unconstrained.
use ndarray::{Array1, array};

use crate::changepoint::{
    core::transforms::{sigma_from_unconstrained, sigma_to_unconstrained},
    errors::{ChangePointError, ChangePointResult},
};

/// Position of `mean1` in the continuous block.
pub const MEAN1: usize = 0;
/// Position of `mean2` in the continuous block.
pub const MEAN2: usize = 1;
/// Position of `sigma` in the continuous block.
pub const SIGMA: usize = 2;
/// Number of continuous parameters.
pub const CONTINUOUS_DIM: usize = 3;

/// Parameter names in sampler order, discrete first.
pub const PARAMETER_NAMES: [&str; 4] = ["break_index", "mean1", "mean2", "sigma"];

/// `ChangePointParams` — one assignment of the change-point model parameters.
///
/// Invariants
/// ----------
/// - `mean1`, `mean2` finite.
/// - `sigma` finite and `> 0`.
/// - `break_index` is range-checked against a series by
///   [`ChangePointParams::check_against`], not at construction, since a
///   parameter set is meaningful independently of any one series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangePointParams {
    pub break_index: usize,
    pub mean1: f64,
    pub mean2: f64,
    pub sigma: f64,
}

impl ChangePointParams {
    /// Construct validated parameters.
    ///
    /// Errors
    /// ------
    /// - `ChangePointError::InvalidMean` for a non-finite mean.
    /// - `ChangePointError::InvalidSigma` unless `sigma` is finite and `> 0`.
    pub fn new(
        break_index: usize, mean1: f64, mean2: f64, sigma: f64,
    ) -> ChangePointResult<Self> {
        let params = ChangePointParams { break_index, mean1, mean2, sigma };
        params.validate()?;
        Ok(params)
    }

    /// Check the continuous fields; needed because the fields are public and
    /// a value may be built without [`ChangePointParams::new`].
    ///
    /// Errors
    /// ------
    /// - `ChangePointError::InvalidMean` for a non-finite mean.
    /// - `ChangePointError::InvalidSigma` unless `sigma` is finite and `> 0`.
    pub fn validate(&self) -> ChangePointResult<()> {
        if !self.mean1.is_finite() {
            return Err(ChangePointError::InvalidMean { value: self.mean1, which: "mean1" });
        }
        if !self.mean2.is_finite() {
            return Err(ChangePointError::InvalidMean { value: self.mean2, which: "mean2" });
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(ChangePointError::InvalidSigma { value: self.sigma });
        }
        Ok(())
    }

    /// Build parameters from a break index and an unconstrained `θ`.
    pub fn from_theta(break_index: usize, theta: &Array1<f64>) -> ChangePointResult<Self> {
        if theta.len() != CONTINUOUS_DIM {
            return Err(ChangePointError::SampleSetMismatch {
                expected: CONTINUOUS_DIM,
                actual: theta.len(),
            });
        }
        Self::new(break_index, theta[MEAN1], theta[MEAN2], sigma_from_unconstrained(theta[SIGMA]))
    }

    /// Build parameters from a constrained continuous draw `(mean1, mean2, sigma)`.
    pub fn from_constrained(break_index: usize, values: &Array1<f64>) -> ChangePointResult<Self> {
        if values.len() != CONTINUOUS_DIM {
            return Err(ChangePointError::SampleSetMismatch {
                expected: CONTINUOUS_DIM,
                actual: values.len(),
            });
        }
        Self::new(break_index, values[MEAN1], values[MEAN2], values[SIGMA])
    }

    /// Unconstrained continuous block `θ`.
    pub fn to_theta(&self) -> Array1<f64> {
        array![self.mean1, self.mean2, sigma_to_unconstrained(self.sigma)]
    }

    /// Constrained continuous block `(mean1, mean2, sigma)`.
    pub fn continuous(&self) -> Array1<f64> {
        array![self.mean1, self.mean2, self.sigma]
    }

    /// Segment mean that applies at position `i`.
    #[inline]
    pub fn mean_at(&self, i: usize) -> f64 {
        if i < self.break_index { self.mean1 } else { self.mean2 }
    }

    /// Ensure the parameters are valid ([`ChangePointParams::validate`]) and
    /// `break_index` addresses a position of a series of length `len`.
    pub fn check_against(&self, len: usize) -> ChangePointResult<()> {
        self.validate()?;
        if len == 0 {
            return Err(ChangePointError::EmptySeries);
        }
        if self.break_index >= len {
            return Err(ChangePointError::BreakIndexOutOfRange { index: self.break_index, len });
        }
        Ok(())
    }
}
