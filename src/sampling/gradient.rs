//! Gradient evaluation for the continuous block, with finite-difference
//! fallback when a target does not implement an analytic gradient.
//!
//! The finite-difference closures from `finitediff` must return `f64`, so a
//! target error raised inside them is captured in a `RefCell` slot, the
//! closure returns `NaN`, and the captured error is surfaced once the
//! difference routine returns. Central differences are tried first; on a
//! captured error or a non-finite result the gradient is retried once with
//! forward differences.
use std::cell::RefCell;

use finitediff::FiniteDiff;

use crate::sampling::{
    errors::{SamplerError, SamplerResult},
    traits::MixedTarget,
    types::{Grad, Theta},
};

/// Check gradient length and finiteness.
pub fn validate_grad(grad: &Grad, dim: usize) -> SamplerResult<()> {
    if grad.len() != dim {
        return Err(SamplerError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(SamplerError::InvalidGradient { index, value });
        }
    }
    Ok(())
}

/// `∇_θ log π(τ, θ)`, analytic when available, otherwise finite differences.
///
/// Errors
/// ------
/// - Any target error other than `GradientNotImplemented`.
/// - `GradientDimMismatch` / `InvalidGradient` if the result fails validation.
pub fn target_grad<T: MixedTarget + ?Sized>(
    target: &T, discrete: usize, theta: &Theta,
) -> SamplerResult<Grad> {
    let dim = theta.len();
    match target.grad(discrete, theta) {
        Ok(g) => {
            validate_grad(&g, dim)?;
            Ok(g)
        }
        Err(SamplerError::GradientNotImplemented) => fd_grad(target, discrete, theta),
        Err(e) => Err(e),
    }
}

fn fd_grad<T: MixedTarget + ?Sized>(
    target: &T, discrete: usize, theta: &Theta,
) -> SamplerResult<Grad> {
    let dim = theta.len();
    let closure_err: RefCell<Option<SamplerError>> = RefCell::new(None);
    let log_density = |theta: &Theta| -> f64 {
        match target.log_density(discrete, theta) {
            Ok(val) => val,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let grad = theta.central_diff(&log_density);
    if closure_err.borrow().is_none() && validate_grad(&grad, dim).is_ok() {
        return Ok(grad);
    }
    closure_err.replace(None);
    let grad = theta.forward_diff(&log_density);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&grad, dim)?;
    Ok(grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{
        traits::{ParameterKind, ParameterSpec},
        types::ChainRng,
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Isotropic Gaussian in θ with a discrete shift and no analytic gradient.
    struct ShiftedGaussian;

    impl MixedTarget for ShiftedGaussian {
        fn parameters(&self) -> Vec<ParameterSpec> {
            vec![
                ParameterSpec::new("k", ParameterKind::Discrete { lower: 0, upper: 3 }, "U".into()),
                ParameterSpec::new("x", ParameterKind::Real, "N".into()),
            ]
        }
        fn discrete_support(&self) -> (usize, usize) {
            (0, 3)
        }
        fn continuous_dim(&self) -> usize {
            1
        }
        fn log_density(&self, discrete: usize, theta: &Theta) -> SamplerResult<f64> {
            let d = theta[0] - discrete as f64;
            Ok(-0.5 * d * d)
        }
        fn warm_start_hint(&self) -> (usize, Theta) {
            (0, array![0.0])
        }
        fn prior_draw(&self, _rng: &mut ChainRng) -> (usize, Theta) {
            (0, array![0.0])
        }
    }

    #[test]
    // Purpose
    // -------
    // Targets without an analytic gradient get a finite-difference one.
    //
    // Expect
    // ------
    // - ∂/∂x of `-(x − k)²/2` is `k − x`.
    fn falls_back_to_finite_differences() {
        let g = target_grad(&ShiftedGaussian, 2, &array![0.5]).unwrap();
        assert_relative_eq!(g[0], 1.5, epsilon = 1e-6);
    }

    #[test]
    fn validate_grad_rejects_bad_gradients() {
        assert_eq!(
            validate_grad(&array![1.0, 2.0], 3).unwrap_err(),
            SamplerError::GradientDimMismatch { expected: 3, found: 2 }
        );
        assert!(matches!(
            validate_grad(&array![1.0, f64::NAN], 2).unwrap_err(),
            SamplerError::InvalidGradient { index: 1, .. }
        ));
    }
}
