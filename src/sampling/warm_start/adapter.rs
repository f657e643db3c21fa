//! Adapter that exposes a [`MixedTarget`] at a fixed discrete value as an
//! `argmin` minimization problem.
//!
//! The warm start *maximizes* `log π(τ, θ)` over `θ` by minimizing the cost
//! `c(θ) = −log π(τ, θ)`. Gradients come from [`target_grad`], which already
//! falls back to finite differences, and are negated to match the cost.
use argmin::core::{CostFunction, Error, Gradient};

use crate::sampling::{
    errors::SamplerError,
    gradient::target_grad,
    traits::MixedTarget,
    types::{Cost, Grad, Theta},
};

/// Bridges a [`MixedTarget`] conditioned on `discrete` to `argmin`.
#[derive(Debug, Clone)]
pub struct ConditionalMode<'a, T: MixedTarget + ?Sized> {
    pub target: &'a T,
    pub discrete: usize,
}

impl<'a, T: MixedTarget + ?Sized> ConditionalMode<'a, T> {
    pub fn new(target: &'a T, discrete: usize) -> Self {
        Self { target, discrete }
    }
}

impl<T: MixedTarget + ?Sized> CostFunction for ConditionalMode<'_, T> {
    type Param = Theta;
    type Output = Cost;

    /// `c(θ) = −log π(τ, θ)`; non-finite values are errors.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.target.log_density(self.discrete, theta)?;
        if !value.is_finite() {
            return Err(SamplerError::NonFiniteLogDensity { value }.into());
        }
        Ok(-value)
    }
}

impl<T: MixedTarget + ?Sized> Gradient for ConditionalMode<'_, T> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(-target_grad(self.target, self.discrete, theta)?)
    }
}
