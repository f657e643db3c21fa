//! Warm start: locate a high-density `(τ, θ)` before sampling.
//!
//! Starting from the target's [`warm_start_hint`](MixedTarget::warm_start_hint),
//! alternate two moves until the discrete value stops changing (at most
//! [`MAX_ROUNDS`] rounds):
//! 1. maximize `log π(τ, θ)` over `θ` with L-BFGS (More–Thuente line search),
//! 2. set `τ` to the best discrete value for the new `θ` by scanning the
//!    support.
//!
//! With the `obs_slog` feature and `verbose = true`, a terminal slog observer
//! is attached to each L-BFGS run.
use argmin::core::{Executor, State};
use tracing::debug;

use crate::sampling::{
    errors::{SamplerError, SamplerResult},
    traits::MixedTarget,
    types::{DEFAULT_LBFGS_MEM, LbfgsMoreThuente, MoreThuenteLS, Theta},
    warm_start::adapter::ConditionalMode,
};

/// Upper bound on optimize/scan rounds.
pub const MAX_ROUNDS: usize = 3;
/// L-BFGS iterations per round.
pub const MAX_LBFGS_ITERS: u64 = 200;
const TOL_GRAD: f64 = 1e-6;

/// Result of the warm-start search.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmStart {
    pub discrete: usize,
    pub theta: Theta,
    pub log_density: f64,
    pub rounds: usize,
}

/// Find a joint mode candidate of `target`.
///
/// Errors
/// ------
/// - `WarmStartFailed` for solver failures or a missing best parameter.
/// - Target errors raised while scanning the discrete support.
pub fn find_mode<T: MixedTarget + ?Sized>(target: &T, verbose: bool) -> SamplerResult<WarmStart> {
    let (mut discrete, mut theta) = target.warm_start_hint();
    let mut log_density = target.log_density(discrete, &theta)?;
    let mut rounds = 0;

    while rounds < MAX_ROUNDS {
        rounds += 1;
        let (theta_hat, value) = optimize_continuous(target, discrete, theta.clone(), verbose)?;
        if value > log_density || !log_density.is_finite() {
            theta = theta_hat;
            log_density = value;
        }
        let (best, best_value) = best_discrete(target, &theta)?;
        debug!(round = rounds, discrete, best, log_density, best_value, "warm start round");
        if best == discrete || best_value <= log_density {
            break;
        }
        discrete = best;
        log_density = best_value;
    }

    if !log_density.is_finite() {
        return Err(SamplerError::WarmStartFailed {
            reason: format!("log density {log_density} at warm start"),
        });
    }
    Ok(WarmStart { discrete, theta, log_density, rounds })
}

/// Maximize `log π(discrete, ·)` from `theta0`; returns `(θ̂, log π(θ̂))`.
pub fn optimize_continuous<T: MixedTarget + ?Sized>(
    target: &T, discrete: usize, theta0: Theta, verbose: bool,
) -> SamplerResult<(Theta, f64)> {
    let problem = ConditionalMode::new(target, discrete);
    let solver = LbfgsMoreThuente::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM)
        .with_tolerance_grad(TOL_GRAD)?;

    let mut executor = Executor::new(problem, solver);
    executor = executor.configure(|state| state.param(theta0).max_iters(MAX_LBFGS_ITERS));
    #[cfg(feature = "obs_slog")]
    if verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor =
            executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    #[cfg(not(feature = "obs_slog"))]
    let _ = verbose;

    let mut state = executor.run()?.state().clone();
    let best = state.take_best_param().ok_or_else(|| SamplerError::WarmStartFailed {
        reason: "solver returned no parameter".to_string(),
    })?;
    let value = -state.get_best_cost();
    debug!(
        discrete,
        iterations = state.get_iter(),
        status = ?state.get_termination_status(),
        log_density = value,
        "L-BFGS warm start finished"
    );
    Ok((best, value))
}

/// Discrete value maximizing `log π(·, θ)`; ties go to the smallest value.
pub fn best_discrete<T: MixedTarget + ?Sized>(
    target: &T, theta: &Theta,
) -> SamplerResult<(usize, f64)> {
    let (lower, upper) = target.discrete_support();
    let mut best = (lower, f64::NEG_INFINITY);
    for k in lower..=upper {
        let value = target.log_density(k, theta)?;
        if value > best.1 {
            best = (k, value);
        }
    }
    Ok(best)
}
