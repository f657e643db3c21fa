//! Multi-chain entry point of the sampler.
//!
//! Purpose
//! -------
//! Orchestrate a full sampling run over a [`MixedTarget`]: validate options,
//! derive per-chain random streams, pick starting points, run the chains in
//! parallel on rayon's pool, and assemble the [`SamplingOutcome`].
//!
//! Key behaviors
//! -------------
//! - Seeding: one `Xoshiro256PlusPlus` is seeded from `options.seed` (or OS
//!   entropy); chain `c` uses that stream advanced by `c` calls to `jump()`,
//!   so draws are reproducible regardless of thread scheduling.
//! - Initialization: [`InitStrategy::WarmStart`] runs one L-BFGS search
//!   ([`find_mode`]) and jitters its result per chain; if the search fails
//!   the target's hint is used instead. [`InitStrategy::PriorDraw`] draws
//!   each chain's start from the prior, retrying until the density is finite.
//! - Pooling: draws are only assembled into a [`PosteriorSampleSet`] after
//!   every chain reports its full quota. A cancelled run returns
//!   `SamplerError::Cancelled` with each chain's partial draws.
//! - Diagnostics: split-R̂ and bulk ESS per parameter; threshold violations
//!   or divergences produce a [`ConvergenceWarning`] in the outcome and a
//!   `tracing::warn!` event.
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::sampling::{
    cancel::CancelToken,
    chain::{ChainRun, run_chain},
    diagnostics::{ConvergenceWarning, diagnose},
    errors::{SamplerError, SamplerResult},
    options::{InitStrategy, SamplerOptions},
    samples::{PartialSamples, PosteriorSampleSet, SamplingOutcome},
    traits::MixedTarget,
    types::{ChainRng, Theta},
    warm_start::find_mode,
};

/// Standard deviation of the per-chain jitter around the warm start.
pub const INIT_JITTER: f64 = 0.1;
const MAX_INIT_ATTEMPTS: usize = 100;

/// Draw posterior samples from `target`.
///
/// Errors
/// ------
/// - Option validation errors from [`SamplerOptions::validate`].
/// - `EmptyDiscreteSupport` if the target's support is empty.
/// - `InvalidInitialState` if no chain can start at a finite density.
/// - `Cancelled(PartialSamples)` if `cancel` fired before all chains
///   finished.
/// - `IncompleteChain` if a chain returns short without cancellation.
/// - Any target error raised during sampling.
pub fn sample<T: MixedTarget>(
    target: &T, options: &SamplerOptions, cancel: &CancelToken,
) -> SamplerResult<SamplingOutcome> {
    options.validate()?;
    let (lower, upper) = target.discrete_support();
    if lower > upper {
        return Err(SamplerError::EmptyDiscreteSupport { lower, upper });
    }
    let parameter_names: Vec<String> = target.parameters().into_iter().map(|p| p.name).collect();

    let seed = options.seed.unwrap_or_else(rand::random::<u64>);
    let mut rngs = chain_rngs(seed, options.chains);
    let inits = initial_states(target, options, &mut rngs)?;

    let runs: Vec<SamplerResult<ChainRun>> = rngs
        .into_par_iter()
        .zip(inits.into_par_iter())
        .enumerate()
        .map(|(chain, (rng, init))| run_chain(target, options, chain, init, rng, cancel))
        .collect();
    let runs = runs.into_iter().collect::<SamplerResult<Vec<ChainRun>>>()?;

    if runs.iter().any(|r| r.cancelled) {
        let partial = PartialSamples {
            parameter_names,
            chains: runs.into_iter().map(|r| r.draws).collect(),
            requested: options.draws,
        };
        warn!(retained = partial.total_draws(), "sampling cancelled");
        return Err(SamplerError::Cancelled(partial));
    }

    let (chains, chain_stats): (Vec<_>, Vec<_>) =
        runs.into_iter().map(|r| (r.draws, r.stats)).unzip();
    let samples = PosteriorSampleSet::from_chains(parameter_names, chains, options.draws)?;
    let diagnostics = diagnose(&samples);
    let warning = ConvergenceWarning::check(&diagnostics, &chain_stats, options.thresholds);
    if let Some(w) = &warning {
        warn!(%w, "convergence diagnostics flagged the run");
    }
    info!(
        seed,
        chains = samples.num_chains(),
        draws_per_chain = samples.draws_per_chain(),
        "sampling finished"
    );
    Ok(SamplingOutcome { samples, chain_stats, diagnostics, warning, seed })
}

/// One jump-separated stream per chain.
pub fn chain_rngs(seed: u64, chains: usize) -> Vec<ChainRng> {
    let mut base = ChainRng::seed_from_u64(seed);
    (0..chains)
        .map(|_| {
            let rng = base.clone();
            base.jump();
            rng
        })
        .collect()
}

fn initial_states<T: MixedTarget>(
    target: &T, options: &SamplerOptions, rngs: &mut [ChainRng],
) -> SamplerResult<Vec<(usize, Theta)>> {
    match options.init {
        InitStrategy::WarmStart => {
            let (discrete, theta) = match find_mode(target, options.verbose) {
                Ok(mode) => (mode.discrete, mode.theta),
                Err(e) => {
                    warn!(error = %e, "warm start failed; starting from the target's hint");
                    target.warm_start_hint()
                }
            };
            rngs.iter_mut().map(|rng| jitter(target, discrete, &theta, rng)).collect()
        }
        InitStrategy::PriorDraw => rngs.iter_mut().map(|rng| prior_start(target, rng)).collect(),
    }
}

fn jitter<T: MixedTarget>(
    target: &T, discrete: usize, theta: &Theta, rng: &mut ChainRng,
) -> SamplerResult<(usize, Theta)> {
    let jittered = theta.mapv(|t| {
        let z: f64 = StandardNormal.sample(&mut *rng);
        t + INIT_JITTER * z
    });
    if target.log_density(discrete, &jittered)?.is_finite() {
        return Ok((discrete, jittered));
    }
    if target.log_density(discrete, theta)?.is_finite() {
        return Ok((discrete, theta.clone()));
    }
    Err(SamplerError::InvalidInitialState {
        reason: format!("warm start at break index {discrete} has zero density"),
    })
}

fn prior_start<T: MixedTarget>(target: &T, rng: &mut ChainRng) -> SamplerResult<(usize, Theta)> {
    for _ in 0..MAX_INIT_ATTEMPTS {
        let (discrete, theta) = target.prior_draw(rng);
        if target.log_density(discrete, &theta)?.is_finite() {
            return Ok((discrete, theta));
        }
    }
    Err(SamplerError::InvalidInitialState {
        reason: format!("no finite-density prior draw in {MAX_INIT_ATTEMPTS} attempts"),
    })
}
