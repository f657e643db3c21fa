//! Sampler configuration: iteration counts, adaptation targets, proposals,
//! initialization, seeding and convergence thresholds.
//!
//! All option structs follow the same pattern: a validating `new(...)` that
//! returns [`SamplerResult`] and a `Default` with reference values
//! (1000 warm-up iterations, 2000 retained draws, 4 chains, δ = 0.8).
use std::str::FromStr;

use crate::sampling::errors::{SamplerError, SamplerResult};

/// Proposal for the discrete Metropolis update.
///
/// Both proposals are symmetric, so the acceptance ratio reduces to the
/// ratio of target densities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiscreteProposal {
    /// Independent draw uniform over the whole support.
    #[default]
    Uniform,
    /// `current ± U{1..=max_step}`; proposals outside the support are rejected.
    RandomWalk { max_step: usize },
}

/// How each chain picks its starting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitStrategy {
    /// Profile break index plus an L-BFGS MAP of the continuous block,
    /// jittered per chain.
    #[default]
    WarmStart,
    /// Independent draw from the prior per chain.
    PriorDraw,
}

impl FromStr for InitStrategy {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warmstart" | "warm_start" => Ok(InitStrategy::WarmStart),
            "priordraw" | "prior_draw" | "prior" => Ok(InitStrategy::PriorDraw),
            _ => Err(SamplerError::InvalidInitialState {
                reason: format!(
                    "unknown initialization '{s}'; valid options are 'warm_start' or 'prior_draw'"
                ),
            }),
        }
    }
}

/// Thresholds above/below which a run is flagged as not converged.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceThresholds {
    /// Largest acceptable split-R̂.
    pub max_r_hat: f64,
    /// Smallest acceptable bulk effective sample size.
    pub min_ess: f64,
}

impl ConvergenceThresholds {
    /// Validated thresholds.
    ///
    /// Errors
    /// ------
    /// - `SamplerError::InvalidThreshold` unless `max_r_hat` is finite and
    ///   `>= 1`, and `min_ess` is finite and `>= 0`.
    pub fn new(max_r_hat: f64, min_ess: f64) -> SamplerResult<Self> {
        if !max_r_hat.is_finite() || max_r_hat < 1.0 {
            return Err(SamplerError::InvalidThreshold {
                value: max_r_hat,
                reason: "max R-hat must be finite and at least 1.",
            });
        }
        if !min_ess.is_finite() || min_ess < 0.0 {
            return Err(SamplerError::InvalidThreshold {
                value: min_ess,
                reason: "min ESS must be finite and non-negative.",
            });
        }
        Ok(Self { max_r_hat, min_ess })
    }
}

impl Default for ConvergenceThresholds {
    fn default() -> Self {
        Self { max_r_hat: 1.05, min_ess: 100.0 }
    }
}

/// Sampler configuration.
///
/// Fields
/// ------
/// - `warmup`: adaptation iterations per chain; discarded.
/// - `draws`: retained draws per chain (`> 0`).
/// - `chains`: independent chains (`> 0`).
/// - `target_accept`: dual-averaging target δ ∈ (0, 1); higher δ gives
///   smaller leapfrog steps.
/// - `leapfrog_steps`: nominal trajectory length; each iteration draws the
///   actual count uniformly from `[⌈L/2⌉, L]`.
/// - `discrete_proposal`, `discrete_updates`: Metropolis moves of the discrete
///   parameter per iteration.
/// - `init`: [`InitStrategy`].
/// - `seed`: `Some` for reproducible runs, `None` for OS entropy.
/// - `thresholds`: [`ConvergenceThresholds`].
/// - `verbose`: attach the slog observer to the warm-start optimizer
///   (feature `obs_slog`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerOptions {
    pub warmup: usize,
    pub draws: usize,
    pub chains: usize,
    pub target_accept: f64,
    pub leapfrog_steps: usize,
    pub discrete_proposal: DiscreteProposal,
    pub discrete_updates: usize,
    pub init: InitStrategy,
    pub seed: Option<u64>,
    pub thresholds: ConvergenceThresholds,
    pub verbose: bool,
}

impl SamplerOptions {
    /// Construct validated options; proposal, init, seed and thresholds take
    /// their defaults and can be overridden with the `with_*` builders.
    ///
    /// Errors
    /// ------
    /// - `InvalidDraws`, `InvalidChains`, `InvalidTargetAccept`,
    ///   `InvalidLeapfrogSteps` for out-of-range values.
    pub fn new(
        warmup: usize, draws: usize, chains: usize, target_accept: f64, leapfrog_steps: usize,
    ) -> SamplerResult<Self> {
        let opts = Self { warmup, draws, chains, target_accept, leapfrog_steps, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the discrete proposal and updates per iteration.
    pub fn with_discrete(
        mut self, proposal: DiscreteProposal, updates: usize,
    ) -> SamplerResult<Self> {
        self.discrete_proposal = proposal;
        self.discrete_updates = updates;
        self.validate()?;
        Ok(self)
    }

    pub fn with_thresholds(mut self, thresholds: ConvergenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Total iterations per chain.
    pub fn total_iterations(&self) -> usize {
        self.warmup + self.draws
    }

    /// Re-check every field; used on entry to the sampler since fields are
    /// public.
    pub fn validate(&self) -> SamplerResult<()> {
        if self.draws == 0 {
            return Err(SamplerError::InvalidDraws { draws: self.draws });
        }
        if self.chains == 0 {
            return Err(SamplerError::InvalidChains { chains: self.chains });
        }
        if !self.target_accept.is_finite()
            || self.target_accept <= 0.0
            || self.target_accept >= 1.0
        {
            return Err(SamplerError::InvalidTargetAccept { value: self.target_accept });
        }
        if self.leapfrog_steps == 0 {
            return Err(SamplerError::InvalidLeapfrogSteps { steps: self.leapfrog_steps });
        }
        if self.discrete_updates == 0 {
            return Err(SamplerError::InvalidDiscreteUpdates { updates: self.discrete_updates });
        }
        if let DiscreteProposal::RandomWalk { max_step: 0 } = self.discrete_proposal {
            return Err(SamplerError::InvalidRandomWalkStep { max_step: 0 });
        }
        ConvergenceThresholds::new(self.thresholds.max_r_hat, self.thresholds.min_ess)?;
        Ok(())
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            warmup: 1000,
            draws: 2000,
            chains: 4,
            target_accept: 0.8,
            leapfrog_steps: 16,
            discrete_proposal: DiscreteProposal::Uniform,
            discrete_updates: 4,
            init: InitStrategy::WarmStart,
            seed: None,
            thresholds: ConvergenceThresholds::default(),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Defaults carry the reference configuration and validate.
    fn defaults_are_reference_values() {
        let opts = SamplerOptions::default();
        assert_eq!((opts.warmup, opts.draws, opts.chains), (1000, 2000, 4));
        assert_eq!(opts.target_accept, 0.8);
        assert_eq!(opts.init, InitStrategy::WarmStart);
        assert!(opts.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Each invalid field maps to its own error variant.
    fn new_rejects_invalid_fields() {
        assert_eq!(
            SamplerOptions::new(10, 0, 1, 0.8, 8).unwrap_err(),
            SamplerError::InvalidDraws { draws: 0 }
        );
        assert_eq!(
            SamplerOptions::new(10, 10, 0, 0.8, 8).unwrap_err(),
            SamplerError::InvalidChains { chains: 0 }
        );
        assert_eq!(
            SamplerOptions::new(10, 10, 1, 1.0, 8).unwrap_err(),
            SamplerError::InvalidTargetAccept { value: 1.0 }
        );
        assert_eq!(
            SamplerOptions::new(10, 10, 1, 0.8, 0).unwrap_err(),
            SamplerError::InvalidLeapfrogSteps { steps: 0 }
        );
        assert_eq!(
            SamplerOptions::default()
                .with_discrete(DiscreteProposal::RandomWalk { max_step: 0 }, 1)
                .unwrap_err(),
            SamplerError::InvalidRandomWalkStep { max_step: 0 }
        );
        assert_eq!(
            SamplerOptions::default().with_discrete(DiscreteProposal::Uniform, 0).unwrap_err(),
            SamplerError::InvalidDiscreteUpdates { updates: 0 }
        );
    }

    #[test]
    fn thresholds_and_init_parsing() {
        assert!(ConvergenceThresholds::new(0.99, 100.0).is_err());
        assert!(ConvergenceThresholds::new(1.01, -1.0).is_err());
        assert_eq!("Prior_Draw".parse::<InitStrategy>().unwrap(), InitStrategy::PriorDraw);
        assert!("sideways".parse::<InitStrategy>().is_err());
    }
}
