//! Prior hyperparameters and prior densities for the change-point model.
//!
//! Purpose
//! -------
//! Describe the weakly informative priors of the model and evaluate their
//! log densities:
//! - `break_index ~ DiscreteUniform(0, n − 1)`,
//! - `mean1, mean2 ~ Normal(center, mean_scale)` with `center` the empirical
//!   mean of the modeled series,
//! - `sigma ~ HalfNormal(sigma_scale)`.
//!
//! Key behaviors
//! -------------
//! - [`PriorConfig`] carries the two user-facing spread hyperparameters and
//!   validates them; [`PriorConfig::for_transform`] returns the reference
//!   defaults for raw prices (10, 10) and log prices (1, 1).
//! - [`Priors`] is the config resolved against one series (center and
//!   support length known) and holds the statrs distributions used for
//!   evaluation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Both scales are finite and strictly positive.
//! - The support length is at least one.
use statrs::distribution::{Continuous, Discrete, DiscreteUniform, Normal};

use crate::changepoint::{
    core::{data::PriceTransform, params::ChangePointParams},
    errors::{ChangePointError, ChangePointResult},
};

/// User-facing prior hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriorConfig {
    /// Standard deviation of the Normal priors on both segment means.
    pub mean_scale: f64,
    /// Scale of the half-Normal prior on the noise scale.
    pub sigma_scale: f64,
}

impl PriorConfig {
    /// Construct validated hyperparameters.
    ///
    /// Errors
    /// ------
    /// - `ChangePointError::InvalidPriorScale` if either scale is non-finite
    ///   or `<= 0`.
    pub fn new(mean_scale: f64, sigma_scale: f64) -> ChangePointResult<Self> {
        validate_scale(mean_scale, "mean_scale")?;
        validate_scale(sigma_scale, "sigma_scale")?;
        Ok(PriorConfig { mean_scale, sigma_scale })
    }

    /// Reference hyperparameters for a modeling scale.
    ///
    /// Raw prices use spreads of 10 (price units); log prices use 1.
    pub fn for_transform(transform: PriceTransform) -> Self {
        match transform {
            PriceTransform::Raw => PriorConfig { mean_scale: 10.0, sigma_scale: 10.0 },
            PriceTransform::Log => PriorConfig { mean_scale: 1.0, sigma_scale: 1.0 },
        }
    }

    /// Resolve against a series with empirical mean `center` and `len` points.
    pub fn resolve(&self, center: f64, len: usize) -> ChangePointResult<Priors> {
        Priors::new(*self, center, len)
    }
}

impl Default for PriorConfig {
    fn default() -> Self {
        PriorConfig::for_transform(PriceTransform::Raw)
    }
}

/// Priors resolved against one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Priors {
    pub config: PriorConfig,
    /// Prior center of both segment means.
    pub center: f64,
    /// Number of admissible break positions.
    pub support_len: usize,
    mean_prior: Normal,
    sigma_prior: Normal,
    break_prior: DiscreteUniform,
}

impl Priors {
    pub fn new(config: PriorConfig, center: f64, support_len: usize) -> ChangePointResult<Self> {
        validate_scale(config.mean_scale, "mean_scale")?;
        validate_scale(config.sigma_scale, "sigma_scale")?;
        if !center.is_finite() {
            return Err(ChangePointError::InvalidMean { value: center, which: "prior center" });
        }
        if support_len == 0 {
            return Err(ChangePointError::EmptySeries);
        }
        let mean_prior = Normal::new(center, config.mean_scale)?;
        let sigma_prior = Normal::new(0.0, config.sigma_scale)?;
        let break_prior = DiscreteUniform::new(0, support_len as i64 - 1)?;
        Ok(Priors { config, center, support_len, mean_prior, sigma_prior, break_prior })
    }

    /// `log p(break_index)`; `-inf` outside the support.
    pub fn ln_break(&self, break_index: usize) -> f64 {
        self.break_prior.ln_pmf(break_index as i64)
    }

    /// `log p(mean)` for either segment mean.
    pub fn ln_mean(&self, mean: f64) -> f64 {
        self.mean_prior.ln_pdf(mean)
    }

    /// `∂/∂mean log p(mean)`.
    pub fn d_ln_mean(&self, mean: f64) -> f64 {
        -(mean - self.center) / (self.config.mean_scale * self.config.mean_scale)
    }

    /// Half-Normal `log p(sigma)`; `-inf` for `sigma < 0`.
    pub fn ln_sigma(&self, sigma: f64) -> f64 {
        if sigma < 0.0 {
            return f64::NEG_INFINITY;
        }
        std::f64::consts::LN_2 + self.sigma_prior.ln_pdf(sigma)
    }

    /// `∂/∂sigma log p(sigma)` on `sigma >= 0`.
    pub fn d_ln_sigma(&self, sigma: f64) -> f64 {
        -sigma / (self.config.sigma_scale * self.config.sigma_scale)
    }

    /// Joint log prior of a parameter assignment.
    pub fn ln_prior(&self, params: &ChangePointParams) -> f64 {
        self.ln_break(params.break_index)
            + self.ln_mean(params.mean1)
            + self.ln_mean(params.mean2)
            + self.ln_sigma(params.sigma)
    }
}

fn validate_scale(value: f64, which: &'static str) -> ChangePointResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ChangePointError::InvalidPriorScale { value, which });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Non-positive scales are rejected; reference defaults depend on the
    // transform.
    fn config_validates_and_provides_reference_defaults() {
        assert_eq!(
            PriorConfig::new(0.0, 1.0).unwrap_err(),
            ChangePointError::InvalidPriorScale { value: 0.0, which: "mean_scale" }
        );
        assert!(PriorConfig::new(1.0, f64::NAN).is_err());
        assert_eq!(PriorConfig::default().mean_scale, 10.0);
        assert_eq!(PriorConfig::for_transform(PriceTransform::Log).sigma_scale, 1.0);
    }

    #[test]
    // Purpose
    // -------
    // The break prior is flat over the support and zero outside it.
    fn break_prior_is_uniform_over_support() {
        let priors = PriorConfig::default().resolve(0.0, 4).unwrap();
        for k in 0..4 {
            assert_relative_eq!(priors.ln_break(k), (0.25_f64).ln(), epsilon = 1e-12);
        }
        assert_eq!(priors.ln_break(4), f64::NEG_INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Half-Normal density integrates the Normal mass on one side, and the
    // analytic derivatives agree with finite differences.
    fn half_normal_and_mean_prior_derivatives() {
        let priors = PriorConfig::new(2.0, 3.0).unwrap().resolve(5.0, 10).unwrap();
        let normal = Normal::new(0.0, 3.0).unwrap();

        assert_relative_eq!(priors.ln_sigma(1.0), 2.0_f64.ln() + normal.ln_pdf(1.0));
        assert_eq!(priors.ln_sigma(-0.1), f64::NEG_INFINITY);

        let h = 1e-6;
        let fd_sigma = (priors.ln_sigma(1.3 + h) - priors.ln_sigma(1.3 - h)) / (2.0 * h);
        assert_relative_eq!(priors.d_ln_sigma(1.3), fd_sigma, epsilon = 1e-6);
        let fd_mean = (priors.ln_mean(4.0 + h) - priors.ln_mean(4.0 - h)) / (2.0 * h);
        assert_relative_eq!(priors.d_ln_mean(4.0), fd_mean, epsilon = 1e-6);
    }
}
