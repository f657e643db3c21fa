//! One Markov chain: warm-up with adaptation, then retained draws.
//!
//! Each iteration performs `discrete_updates` Metropolis moves of the
//! discrete parameter at the current `θ`, followed by one HMC transition of
//! `θ` at the new discrete value. During warm-up the step size follows dual
//! averaging and `θ` draws inside the [`WarmupSchedule`] window feed the
//! diagonal mass-matrix estimate. The cancellation token is polled before
//! every iteration; a cancelled chain returns the draws it retained so far.
use ndarray::Array1;
use rand::Rng;
use tracing::debug;

use crate::sampling::{
    adaptation::{DualAveraging, WarmupSchedule, Welford},
    cancel::CancelToken,
    discrete::metropolis_step,
    errors::SamplerResult,
    hmc::{HmcState, find_reasonable_step_size, transition},
    options::SamplerOptions,
    samples::{ChainStats, Draw},
    traits::MixedTarget,
    types::{ChainRng, Theta},
};

/// What a chain hands back to the runner.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRun {
    pub draws: Vec<Draw>,
    pub stats: ChainStats,
    pub cancelled: bool,
}

/// Run chain `chain` from `(discrete, theta)`.
///
/// Errors
/// ------
/// - `InvalidInitialState` if the starting point has non-finite density.
/// - Any target error raised during an update.
pub fn run_chain<T: MixedTarget + ?Sized>(
    target: &T, options: &SamplerOptions, chain: usize, init: (usize, Theta),
    mut rng: ChainRng, cancel: &CancelToken,
) -> SamplerResult<ChainRun> {
    let (mut discrete, theta) = init;
    let dim = theta.len();
    let mut state = HmcState::at(target, discrete, theta)?;
    let mut inv_mass: Array1<f64> = Array1::ones(dim);

    let initial_step = find_reasonable_step_size(target, discrete, &state, &inv_mass, &mut rng)?;
    let mut step_adapt = DualAveraging::new(initial_step, options.target_accept);
    let schedule = WarmupSchedule::new(options.warmup);
    let mut variance = Welford::new(dim);
    let mut step_size = initial_step;

    let max_leapfrog = options.leapfrog_steps;
    let min_leapfrog = max_leapfrog.div_ceil(2);

    let mut draws = Vec::with_capacity(options.draws);
    let (mut discrete_moves, mut discrete_accepts) = (0usize, 0usize);
    let mut accept_stat_sum = 0.0;
    let mut divergences = 0usize;
    let mut cancelled = false;

    for iteration in 0..options.total_iterations() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let sampling = iteration >= options.warmup;

        for _ in 0..options.discrete_updates {
            let step = metropolis_step(
                target,
                options.discrete_proposal,
                discrete,
                state.log_density,
                &state.theta,
                &mut rng,
            )?;
            if sampling {
                discrete_moves += 1;
                discrete_accepts += step.accepted as usize;
            }
            if step.value != discrete {
                discrete = step.value;
                state = HmcState::at(target, discrete, state.theta)?;
            }
        }

        if !sampling {
            step_size = step_adapt.current_step_size();
        }
        let n_steps = rng.random_range(min_leapfrog..=max_leapfrog);
        let t = transition(target, discrete, &state, step_size, n_steps, &inv_mass, &mut rng)?;
        state = t.state;

        if sampling {
            accept_stat_sum += t.accept_stat;
            divergences += t.divergent as usize;
            draws.push(Draw { discrete, continuous: target.constrain(&state.theta) });
            continue;
        }

        step_adapt.update(t.accept_stat);
        if schedule.in_window(iteration) {
            variance.push(&state.theta);
        }
        if schedule.is_window_end(iteration) {
            if let Some(var) = variance.regularized_variance() {
                inv_mass = var;
                let restart = find_reasonable_step_size(
                    target, discrete, &state, &inv_mass, &mut rng,
                )?;
                step_adapt.restart(restart);
            }
            variance.reset();
        }
        if iteration + 1 == options.warmup {
            step_size = step_adapt.final_step_size();
        }
    }

    let retained = draws.len().max(1) as f64;
    let stats = ChainStats {
        chain,
        discrete_accept_rate: if discrete_moves == 0 {
            0.0
        } else {
            discrete_accepts as f64 / discrete_moves as f64
        },
        mean_accept_stat: accept_stat_sum / retained,
        step_size,
        divergences,
        inv_mass: inv_mass.to_vec(),
    };
    debug!(
        chain,
        draws = draws.len(),
        step_size = stats.step_size,
        discrete_accept_rate = stats.discrete_accept_rate,
        mean_accept_stat = stats.mean_accept_stat,
        divergences,
        cancelled,
        "chain finished"
    );
    Ok(ChainRun { draws, stats, cancelled })
}
