//! Numerically stable transforms for the noise-scale parameterization.
//!
//! The sampler moves in an unconstrained space; the noise scale is recovered
//! as `σ = SIGMA_FLOOR + softplus(θσ)`. The helpers here evaluate softplus,
//! its inverse, the logistic function (softplus' derivative) and the log of
//! the logistic (log-Jacobian of the map) without overflow, using the same
//! guarded cutoffs (`|x| > 20`) as common ML libraries.

/// Lower bound added to the noise scale.
///
/// Keeps the likelihood finite on noise-free segments, where the posterior
/// of σ would otherwise concentrate on zero.
pub const SIGMA_FLOOR: f64 = 1e-8;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: `t = ln(exp(x) - 1)`.
///
/// For tiny `x`, `expm1(x) ≈ x`, so the result tends to `ln(x)`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Logistic function `1 / (1 + exp(-x))`, the derivative of softplus.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(logistic(x)) = -softplus(-x)`.
pub fn log_logistic(x: f64) -> f64 {
    -safe_softplus(-x)
}

/// Map an unconstrained coordinate to a noise scale.
pub fn sigma_from_unconstrained(theta: f64) -> f64 {
    SIGMA_FLOOR + safe_softplus(theta)
}

/// Inverse of [`sigma_from_unconstrained`]; `sigma` must exceed the floor.
pub fn sigma_to_unconstrained(sigma: f64) -> f64 {
    safe_softplus_inv((sigma - SIGMA_FLOOR).max(f64::MIN_POSITIVE))
}
