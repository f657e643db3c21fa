//! Metropolis update of the discrete parameter at fixed `θ`.
//!
//! Both proposals in [`DiscreteProposal`] are symmetric, so a move from `τ`
//! to `τ'` is accepted with probability `min(1, π(τ', θ) / π(τ, θ))`.
//! Random-walk proposals that leave the support are rejected outright,
//! which keeps the proposal symmetric on the support.
use rand::Rng;

use crate::sampling::{
    errors::SamplerResult,
    options::DiscreteProposal,
    traits::MixedTarget,
    types::{ChainRng, Theta},
};

/// Outcome of one discrete Metropolis step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscreteStep {
    pub value: usize,
    pub log_density: f64,
    pub accepted: bool,
}

/// Propose a new discrete value under `proposal`; `None` if it leaves the
/// support.
pub fn propose(
    proposal: DiscreteProposal, current: usize, support: (usize, usize), rng: &mut ChainRng,
) -> Option<usize> {
    let (lower, upper) = support;
    match proposal {
        DiscreteProposal::Uniform => Some(rng.random_range(lower..=upper)),
        DiscreteProposal::RandomWalk { max_step } => {
            let step = rng.random_range(1..=max_step);
            if rng.random::<bool>() {
                current.checked_add(step).filter(|&v| v <= upper)
            } else {
                current.checked_sub(step).filter(|&v| v >= lower)
            }
        }
    }
}

/// One Metropolis step for the discrete parameter.
///
/// `current_log_density` must equal `target.log_density(current, theta)`.
pub fn metropolis_step<T: MixedTarget + ?Sized>(
    target: &T, proposal: DiscreteProposal, current: usize, current_log_density: f64,
    theta: &Theta, rng: &mut ChainRng,
) -> SamplerResult<DiscreteStep> {
    let stay = DiscreteStep { value: current, log_density: current_log_density, accepted: false };
    let Some(candidate) = propose(proposal, current, target.discrete_support(), rng) else {
        return Ok(stay);
    };
    if candidate == current {
        return Ok(DiscreteStep { accepted: true, ..stay });
    }
    let candidate_log_density = target.log_density(candidate, theta)?;
    if candidate_log_density == f64::NEG_INFINITY {
        return Ok(stay);
    }
    let log_ratio = candidate_log_density - current_log_density;
    let u: f64 = rng.random();
    if log_ratio >= 0.0 || u.ln() < log_ratio {
        Ok(DiscreteStep { value: candidate, log_density: candidate_log_density, accepted: true })
    } else {
        Ok(stay)
    }
}
