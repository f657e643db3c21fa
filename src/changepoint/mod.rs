//! changepoint — single mean-switch model for a price series.
//!
//! Purpose
//! -------
//! Provide the probabilistic model at the heart of the crate: a series of
//! prices (raw or log) is assumed to be Normal around one mean before an
//! unknown break index and around a second mean from the break onward, with
//! a shared noise scale. This module owns the data container, parameters,
//! priors, the likelihood, and the error surface for all of them.
//!
//! Key behaviors
//! -------------
//! - [`core`] validates series (finite values, strictly increasing dates,
//!   positive values before a log transform) and defines parameters and
//!   priors.
//! - [`models`] evaluates the log-likelihood directly ([`log_likelihood`])
//!   and through O(1) prefix sums ([`ChangePointModel`]), and implements the
//!   sampler's [`MixedTarget`](crate::sampling::MixedTarget) trait.
//! - [`errors`] centralizes [`ChangePointError`] and the
//!   [`ChangePointResult`] alias.
//!
//! Invariants & assumptions
//! ------------------------
//! - The switch is hard: position `i` uses `mean1` iff `i < break_index`.
//! - `break_index ∈ [0, n − 1]`; a break at 0 means the whole series follows
//!   `mean2`.
//! - Noise scale `sigma > 0`, bounded below by [`core::SIGMA_FLOOR`] inside
//!   the sampler.
//!
//! Downstream usage
//! ----------------
//! - Build a [`TimeSeries`], optionally `transform(PriceTransform::Log)` it,
//!   then construct a [`ChangePointModel`] with a [`PriorConfig`] and hand it
//!   to [`crate::sampling::sample`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover series validation, θ mappings, prior densities, the
//!   agreement of fast and direct likelihoods, and the analytic gradient
//!   against finite differences.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    ChangePointParams, Observation, PriceTransform, PriorConfig, Priors, TimeSeries,
};

pub use self::errors::{ChangePointError, ChangePointResult};

pub use self::models::{ChangePointModel, log_likelihood};

pub mod prelude {
    pub use super::{
        ChangePointError, ChangePointModel, ChangePointParams, ChangePointResult, Observation,
        PriceTransform, PriorConfig, TimeSeries, log_likelihood,
    };
}
