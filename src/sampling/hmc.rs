//! Hamiltonian Monte Carlo transition for the continuous block at fixed `τ`.
//!
//! Purpose
//! -------
//! Advance `θ` with a leapfrog trajectory under a diagonal mass matrix and a
//! Metropolis correction, and report the acceptance statistic used by step
//! size adaptation.
//!
//! Key behaviors
//! -------------
//! - Momentum `p ~ N(0, M)` with `M = diag(1 / inv_mass)`.
//! - Kinetic energy `½ Σ inv_mass_i p_i²`; Hamiltonian `H = −log π + K`.
//! - A trajectory is *divergent* when the log density becomes non-finite or
//!   the energy error exceeds [`DIVERGENCE_THRESHOLD`]; divergent
//!   trajectories are rejected.
//! - Target errors other than `NonFiniteLogDensity` propagate.
//!
//! Invariants & assumptions
//! ------------------------
//! - `inv_mass` is strictly positive with the same length as `θ`.
//! - The starting state has a finite log density.
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::sampling::{
    errors::{SamplerError, SamplerResult},
    gradient::target_grad,
    traits::MixedTarget,
    types::{ChainRng, Grad, Theta},
};

/// Energy error beyond which a trajectory counts as divergent.
pub const DIVERGENCE_THRESHOLD: f64 = 1000.0;

/// Current point of the continuous block with cached density and gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct HmcState {
    pub theta: Theta,
    pub log_density: f64,
    pub grad: Grad,
}

impl HmcState {
    /// Evaluate density and gradient at `(discrete, theta)`.
    pub fn at<T: MixedTarget + ?Sized>(
        target: &T, discrete: usize, theta: Theta,
    ) -> SamplerResult<Self> {
        let log_density = target.log_density(discrete, &theta)?;
        if !log_density.is_finite() {
            return Err(SamplerError::InvalidInitialState {
                reason: format!("log density {log_density} at break index {discrete}"),
            });
        }
        let grad = target_grad(target, discrete, &theta)?;
        Ok(HmcState { theta, log_density, grad })
    }
}

/// Result of one HMC transition.
#[derive(Debug, Clone, PartialEq)]
pub struct HmcTransition {
    pub state: HmcState,
    /// `min(1, exp(H0 − H1))`; zero for divergent trajectories.
    pub accept_stat: f64,
    pub accepted: bool,
    pub divergent: bool,
}

/// Run one leapfrog trajectory of `n_steps` steps and apply the Metropolis
/// correction.
pub fn transition<T: MixedTarget + ?Sized>(
    target: &T, discrete: usize, start: &HmcState, step_size: f64, n_steps: usize,
    inv_mass: &Array1<f64>, rng: &mut ChainRng,
) -> SamplerResult<HmcTransition> {
    let mut p: Array1<f64> = inv_mass.mapv(|m| {
        let z: f64 = StandardNormal.sample(&mut *rng);
        z / m.sqrt()
    });
    let kinetic = |p: &Array1<f64>| 0.5 * (p * p * inv_mass).sum();
    let h0 = -start.log_density + kinetic(&p);

    let mut theta = start.theta.clone();
    let mut grad = start.grad.clone();
    let mut log_density = start.log_density;
    let mut divergent = false;

    for _ in 0..n_steps {
        p.scaled_add(0.5 * step_size, &grad);
        theta.scaled_add(step_size, &(&p * inv_mass));
        log_density = match target.log_density(discrete, &theta) {
            Ok(v) => v,
            Err(SamplerError::NonFiniteLogDensity { .. }) => f64::NAN,
            Err(e) => return Err(e),
        };
        if !log_density.is_finite() {
            divergent = true;
            break;
        }
        grad = match target_grad(target, discrete, &theta) {
            Ok(g) => g,
            Err(SamplerError::InvalidGradient { .. }) => {
                divergent = true;
                break;
            }
            Err(e) => return Err(e),
        };
        p.scaled_add(0.5 * step_size, &grad);
    }

    let reject = |divergent| HmcTransition {
        state: start.clone(),
        accept_stat: 0.0,
        accepted: false,
        divergent,
    };
    if divergent {
        return Ok(reject(true));
    }
    let h1 = -log_density + kinetic(&p);
    let energy_error = h1 - h0;
    if !energy_error.is_finite() || energy_error > DIVERGENCE_THRESHOLD {
        return Ok(reject(true));
    }
    let accept_stat = (-energy_error).exp().min(1.0);
    let u: f64 = rng.random();
    if u < accept_stat {
        Ok(HmcTransition {
            state: HmcState { theta, log_density, grad },
            accept_stat,
            accepted: true,
            divergent: false,
        })
    } else {
        Ok(HmcTransition { accept_stat, ..reject(false) })
    }
}

/// Heuristic initial step size: double or halve `ε` until a single leapfrog
/// step's acceptance crosses one half.
pub fn find_reasonable_step_size<T: MixedTarget + ?Sized>(
    target: &T, discrete: usize, start: &HmcState, inv_mass: &Array1<f64>, rng: &mut ChainRng,
) -> SamplerResult<f64> {
    let mut step = 1.0;
    let accept = |step: f64, rng: &mut ChainRng| -> SamplerResult<f64> {
        Ok(transition(target, discrete, start, step, 1, inv_mass, rng)?.accept_stat)
    };
    let first = accept(step, rng)?;
    let direction = if first > 0.5 { 1.0 } else { -1.0 };
    for _ in 0..50 {
        let a = accept(step, rng)?;
        if (direction > 0.0 && a <= 0.5) || (direction < 0.0 && a > 0.5) {
            break;
        }
        step *= 2f64.powf(direction);
    }
    Ok(step.clamp(1e-8, 1e3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::traits::{ParameterKind, ParameterSpec};
    use ndarray::array;
    use rand::SeedableRng;

    /// Standard bivariate Normal in θ, independent of the discrete value.
    struct StdNormal2;

    impl MixedTarget for StdNormal2 {
        fn parameters(&self) -> Vec<ParameterSpec> {
            vec![
                ParameterSpec::new("k", ParameterKind::Discrete { lower: 0, upper: 0 }, "".into()),
                ParameterSpec::new("x", ParameterKind::Real, "".into()),
                ParameterSpec::new("y", ParameterKind::Real, "".into()),
            ]
        }
        fn discrete_support(&self) -> (usize, usize) {
            (0, 0)
        }
        fn continuous_dim(&self) -> usize {
            2
        }
        fn log_density(&self, _d: usize, theta: &Theta) -> SamplerResult<f64> {
            Ok(-0.5 * theta.dot(theta))
        }
        fn grad(&self, _d: usize, theta: &Theta) -> SamplerResult<Grad> {
            Ok(-theta)
        }
        fn warm_start_hint(&self) -> (usize, Theta) {
            (0, array![0.0, 0.0])
        }
        fn prior_draw(&self, _rng: &mut ChainRng) -> (usize, Theta) {
            (0, array![0.0, 0.0])
        }
    }

    #[test]
    // Purpose
    // -------
    // Small steps conserve energy, so nearly every proposal is accepted.
    fn small_steps_are_almost_always_accepted() {
        let mut rng = ChainRng::seed_from_u64(3);
        let inv_mass = array![1.0, 1.0];
        let mut state = HmcState::at(&StdNormal2, 0, array![0.3, -0.2]).unwrap();
        let mut total = 0.0;
        for _ in 0..100 {
            let t = transition(&StdNormal2, 0, &state, 0.05, 10, &inv_mass, &mut rng).unwrap();
            total += t.accept_stat;
            state = t.state;
        }
        assert!(total / 100.0 > 0.95);
    }

    #[test]
    // Purpose
    // -------
    // Huge steps blow up the energy and are flagged as divergent.
    fn huge_steps_diverge() {
        let mut rng = ChainRng::seed_from_u64(9);
        let state = HmcState::at(&StdNormal2, 0, array![1.0, 1.0]).unwrap();
        let t = transition(&StdNormal2, 0, &state, 1e4, 5, &array![1.0, 1.0], &mut rng).unwrap();
        assert!(t.divergent);
        assert!(!t.accepted);
        assert_eq!(t.state, state);
    }

    #[test]
    fn reasonable_step_size_is_finite() {
        let mut rng = ChainRng::seed_from_u64(1);
        let state = HmcState::at(&StdNormal2, 0, array![0.5, 0.5]).unwrap();
        let step =
            find_reasonable_step_size(&StdNormal2, 0, &state, &array![1.0, 1.0], &mut rng).unwrap();
        assert!(step.is_finite() && step > 0.0);
    }
}
