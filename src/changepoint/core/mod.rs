//! core — series container, parameters, priors, and transforms.
//!
//! Purpose
//! -------
//! Collect the building blocks of the single change-point model: the
//! validated price series ([`TimeSeries`]), one parameter assignment
//! ([`ChangePointParams`]), prior hyperparameters and densities
//! ([`PriorConfig`], [`Priors`]), and the numerically stable transforms used
//! to move the noise scale into an unconstrained coordinate.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; observation `i` is the `i`-th element of the series
//!   in timestamp order.
//! - Unconstrained sampler vectors have layout `θ = (mean1, mean2, θσ)`.
//! - This module performs no I/O and no logging.

pub mod data;
pub mod params;
pub mod priors;
pub mod transforms;

pub use self::data::{Observation, PriceTransform, TimeSeries};
pub use self::params::{CONTINUOUS_DIM, ChangePointParams, PARAMETER_NAMES};
pub use self::priors::{PriorConfig, Priors};
pub use self::transforms::SIGMA_FLOOR;
