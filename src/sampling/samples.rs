//! Posterior draws, per-chain statistics and the sampler's outcome type.
//!
//! Purpose
//! -------
//! Hold what a sampling run produces: the retained draws of every chain (in
//! constrained model space), chain-level adaptation statistics, convergence
//! diagnostics, and an optional non-fatal [`ConvergenceWarning`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`PosteriorSampleSet`] only exists once every chain has produced
//!   exactly the configured number of retained draws; pooling across chains
//!   happens through its accessors, never before that check.
//! - Column `0` of a set is the discrete parameter, columns `1..` the
//!   continuous block, in the order of `parameter_names`.
//! - Draws are post-warm-up only.
use crate::sampling::{
    diagnostics::{ConvergenceWarning, ParameterDiagnostics},
    errors::{SamplerError, SamplerResult},
};
use ndarray::Array1;

/// One retained draw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Draw {
    pub discrete: usize,
    /// Continuous block in constrained space.
    pub continuous: Array1<f64>,
}

impl Draw {
    /// Value of parameter column `j` as `f64`.
    pub fn value(&self, j: usize) -> Option<f64> {
        if j == 0 { Some(self.discrete as f64) } else { self.continuous.get(j - 1).copied() }
    }
}

/// Draws from a run that stopped early; each chain keeps what it retained.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSamples {
    pub parameter_names: Vec<String>,
    pub chains: Vec<Vec<Draw>>,
    /// Retained draws each chain was asked for.
    pub requested: usize,
}

impl PartialSamples {
    pub fn total_draws(&self) -> usize {
        self.chains.iter().map(Vec::len).sum()
    }
}

/// Complete posterior sample: every chain holds its full quota.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PosteriorSampleSet {
    parameter_names: Vec<String>,
    chains: Vec<Vec<Draw>>,
    draws_per_chain: usize,
}

impl PosteriorSampleSet {
    /// Assemble a sample set from per-chain draws.
    ///
    /// Errors
    /// ------
    /// - `SamplerError::IncompleteChain` if any chain's length differs from
    ///   `draws_per_chain`.
    pub fn from_chains(
        parameter_names: Vec<String>, chains: Vec<Vec<Draw>>, draws_per_chain: usize,
    ) -> SamplerResult<Self> {
        for (chain, draws) in chains.iter().enumerate() {
            if draws.len() != draws_per_chain {
                return Err(SamplerError::IncompleteChain {
                    chain,
                    expected: draws_per_chain,
                    actual: draws.len(),
                });
            }
        }
        Ok(PosteriorSampleSet { parameter_names, chains, draws_per_chain })
    }

    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Column of `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.parameter_names.iter().position(|n| n == name)
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn draws_per_chain(&self) -> usize {
        self.draws_per_chain
    }

    pub fn total_draws(&self) -> usize {
        self.chains.len() * self.draws_per_chain
    }

    pub fn is_empty(&self) -> bool {
        self.total_draws() == 0
    }

    pub fn chains(&self) -> &[Vec<Draw>] {
        &self.chains
    }

    /// Pooled discrete values, chain by chain.
    pub fn discrete_values(&self) -> Vec<usize> {
        self.chains.iter().flatten().map(|d| d.discrete).collect()
    }

    /// Pooled values of parameter column `j`; `None` if `j` is out of range
    /// for any draw.
    pub fn parameter_values(&self, j: usize) -> Option<Vec<f64>> {
        self.chains.iter().flatten().map(|d| d.value(j)).collect()
    }

    /// Values of parameter column `j`, one vector per chain.
    pub fn parameter_by_chain(&self, j: usize) -> Option<Vec<Vec<f64>>> {
        self.chains.iter().map(|c| c.iter().map(|d| d.value(j)).collect()).collect()
    }
}

/// Adaptation and acceptance statistics of one chain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainStats {
    pub chain: usize,
    /// Fraction of accepted discrete Metropolis moves after warm-up.
    pub discrete_accept_rate: f64,
    /// Mean HMC acceptance statistic after warm-up.
    pub mean_accept_stat: f64,
    /// Step size used after warm-up.
    pub step_size: f64,
    /// Divergent transitions after warm-up.
    pub divergences: usize,
    /// Adapted diagonal inverse mass matrix.
    pub inv_mass: Vec<f64>,
}

/// Everything a completed sampling run returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOutcome {
    pub samples: PosteriorSampleSet,
    pub chain_stats: Vec<ChainStats>,
    pub diagnostics: Vec<ParameterDiagnostics>,
    pub warning: Option<ConvergenceWarning>,
    /// Seed the run used; reuse it to reproduce the draws.
    pub seed: u64,
}

impl SamplingOutcome {
    pub fn total_divergences(&self) -> usize {
        self.chain_stats.iter().map(|s| s.divergences).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names() -> Vec<String> {
        ["k", "a"].iter().map(|s| s.to_string()).collect()
    }

    fn draw(k: usize, a: f64) -> Draw {
        Draw { discrete: k, continuous: array![a] }
    }

    #[test]
    // Purpose
    // -------
    // A chain short of its quota blocks pooling.
    fn incomplete_chain_is_rejected() {
        let err = PosteriorSampleSet::from_chains(
            names(),
            vec![vec![draw(1, 0.0), draw(2, 0.0)], vec![draw(1, 0.0)]],
            2,
        )
        .unwrap_err();
        assert_eq!(err, SamplerError::IncompleteChain { chain: 1, expected: 2, actual: 1 });
    }

    #[test]
    // Purpose
    // -------
    // Pooled accessors visit chains in order and map columns correctly.
    fn pooled_columns() {
        let set = PosteriorSampleSet::from_chains(
            names(),
            vec![vec![draw(1, 0.5), draw(2, 1.5)], vec![draw(3, 2.5), draw(4, 3.5)]],
            2,
        )
        .unwrap();
        assert_eq!(set.discrete_values(), vec![1, 2, 3, 4]);
        assert_eq!(set.parameter_values(1).unwrap(), vec![0.5, 1.5, 2.5, 3.5]);
        assert_eq!(set.parameter_by_chain(0).unwrap()[1], vec![3.0, 4.0]);
        assert!(set.parameter_values(2).is_none());
        assert_eq!(set.index_of("a"), Some(1));
        assert_eq!(set.total_draws(), 4);
    }

    #[test]
    fn partial_samples_count_draws() {
        let partial = PartialSamples {
            parameter_names: names(),
            chains: vec![vec![draw(0, 0.0)], vec![], vec![draw(0, 0.0), draw(0, 0.0)]],
            requested: 5,
        };
        assert_eq!(partial.total_draws(), 3);
    }
}
