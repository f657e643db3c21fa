//! Target interface for mixed discrete/continuous posteriors.
//!
//! A [`MixedTarget`] exposes one bounded integer parameter (updated by
//! Metropolis moves) and a block of unconstrained real parameters (updated
//! by Hamiltonian Monte Carlo). Implementors return the *unnormalized* log
//! posterior, including any Jacobian terms of their own reparameterization.
//!
//! Conventions
//! -----------
//! - `log_density` returns `Ok(-inf)` for states of zero density (for example a
//!   discrete value outside the support) and `Err` for states where the
//!   density cannot be evaluated at all (`NaN`, wrong dimension).
//! - `grad` returns the gradient of `log_density` in `θ`. If not implemented,
//!   the sampler falls back to finite differences.
//! - Implementations must be `Sync`; chains evaluate the same target from
//!   several threads.
use crate::sampling::{
    errors::{SamplerError, SamplerResult},
    types::{ChainRng, Grad, Theta},
};

/// Support of one model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterKind {
    /// Integer parameter on `[lower, upper]` (inclusive).
    Discrete { lower: usize, upper: usize },
    /// Unconstrained real parameter.
    Real,
    /// Strictly positive real parameter, sampled through a transform.
    Positive,
}

/// Name, support and prior description of one model parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    /// Human-readable prior, e.g. `"HalfNormal(10)"`.
    pub prior: String,
}

impl ParameterSpec {
    pub fn new(name: &str, kind: ParameterKind, prior: String) -> Self {
        ParameterSpec { name: name.to_string(), kind, prior }
    }
}

/// Mixed discrete/continuous log posterior.
///
/// Required:
/// - `parameters`: metadata in sampler order, discrete parameter first.
/// - `discrete_support`: inclusive bounds of the discrete parameter.
/// - `continuous_dim`: length of `θ`.
/// - `log_density(τ, θ)`: unnormalized log posterior.
/// - `warm_start_hint`: a plausible `(τ, θ)` from which the optimizer starts.
/// - `prior_draw`: a draw of `(τ, θ)` from the prior.
///
/// Optional:
/// - `grad(τ, θ)`: analytic gradient in `θ`; defaults to
///   `SamplerError::GradientNotImplemented`.
/// - `constrain(θ)`: map `θ` to the reported parameter scale; defaults to the
///   identity.
pub trait MixedTarget: Sync {
    fn parameters(&self) -> Vec<ParameterSpec>;
    fn discrete_support(&self) -> (usize, usize);
    fn continuous_dim(&self) -> usize;
    fn log_density(&self, discrete: usize, theta: &Theta) -> SamplerResult<f64>;
    fn warm_start_hint(&self) -> (usize, Theta);
    fn prior_draw(&self, rng: &mut ChainRng) -> (usize, Theta);

    fn grad(&self, _discrete: usize, _theta: &Theta) -> SamplerResult<Grad> {
        Err(SamplerError::GradientNotImplemented)
    }

    fn constrain(&self, theta: &Theta) -> Theta {
        theta.clone()
    }
}
