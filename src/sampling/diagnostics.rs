//! Convergence diagnostics: rank-normalized split-R̂ and bulk ESS.
//!
//! Purpose
//! -------
//! Compare chains with each other and with themselves to decide whether the
//! pooled draws can be trusted, following Vehtari et al. (2021):
//! - every chain is split in half (odd middle draw dropped),
//! - draws are replaced by normal scores of their pooled ranks
//!   (`Φ⁻¹((r − 3/8) / (S + 1/4))`, ties get their average rank),
//! - R̂ compares between- and within-chain variance of the scores,
//! - ESS uses Geyer's initial monotone sequence on the multi-chain
//!   autocorrelation estimate.
//!
//! Key behaviors
//! -------------
//! - Rank normalization makes both statistics meaningful for the discrete
//!   break index and for heavy-tailed continuous draws.
//! - Degenerate inputs have fixed answers instead of `NaN`: if every draw
//!   is identical, R̂ = 1 and ESS = number of draws; if each chain is
//!   constant but chains disagree, R̂ = ∞.
//! - Chains shorter than four draws yield `NaN` for both statistics; such
//!   values never trigger a warning on their own.
//!
//! Downstream usage
//! ----------------
//! - [`diagnose`] runs both statistics on every column of a
//!   [`PosteriorSampleSet`]; [`ConvergenceWarning::check`] turns the result
//!   plus divergence counts into an optional warning.
use statrs::distribution::{ContinuousCDF, Normal};

use crate::sampling::{
    options::ConvergenceThresholds,
    samples::{ChainStats, PosteriorSampleSet},
};

/// Split-R̂ and bulk ESS of one parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterDiagnostics {
    pub name: String,
    pub r_hat: f64,
    pub ess: f64,
}

/// Non-fatal signal that the sampler may not have converged.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceWarning {
    /// Parameters whose R̂ exceeds the threshold.
    pub high_r_hat: Vec<String>,
    /// Parameters whose ESS falls below the threshold.
    pub low_ess: Vec<String>,
    pub divergences: usize,
    pub thresholds: ConvergenceThresholds,
}

impl ConvergenceWarning {
    /// `Some` if any parameter breaks a threshold or any chain diverged.
    pub fn check(
        diagnostics: &[ParameterDiagnostics], chain_stats: &[ChainStats],
        thresholds: ConvergenceThresholds,
    ) -> Option<Self> {
        let high_r_hat: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.r_hat > thresholds.max_r_hat)
            .map(|d| d.name.clone())
            .collect();
        let low_ess: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.ess < thresholds.min_ess)
            .map(|d| d.name.clone())
            .collect();
        let divergences = chain_stats.iter().map(|s| s.divergences).sum();
        if high_r_hat.is_empty() && low_ess.is_empty() && divergences == 0 {
            return None;
        }
        Some(ConvergenceWarning { high_r_hat, low_ess, divergences, thresholds })
    }
}

impl std::fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if !self.high_r_hat.is_empty() {
            parts.push(format!(
                "R-hat > {} for [{}]",
                self.thresholds.max_r_hat,
                self.high_r_hat.join(", ")
            ));
        }
        if !self.low_ess.is_empty() {
            parts.push(format!(
                "ESS < {} for [{}]",
                self.thresholds.min_ess,
                self.low_ess.join(", ")
            ));
        }
        if self.divergences > 0 {
            parts.push(format!("{} divergent transitions", self.divergences));
        }
        write!(f, "Sampler may not have converged: {}", parts.join("; "))
    }
}

/// Diagnostics for every parameter column of `samples`.
pub fn diagnose(samples: &PosteriorSampleSet) -> Vec<ParameterDiagnostics> {
    samples
        .parameter_names()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let (r_hat, ess) = match samples.parameter_by_chain(j) {
                Some(chains) => (bulk_r_hat(&chains), bulk_ess(&chains)),
                None => (f64::NAN, f64::NAN),
            };
            ParameterDiagnostics { name: name.clone(), r_hat, ess }
        })
        .collect()
}

/// Rank-normalized split-R̂.
pub fn bulk_r_hat(chains: &[Vec<f64>]) -> f64 {
    match split_chains(chains) {
        Some(split) => r_hat(&rank_normalize(&split)),
        None => f64::NAN,
    }
}

/// Rank-normalized split bulk ESS.
pub fn bulk_ess(chains: &[Vec<f64>]) -> f64 {
    match split_chains(chains) {
        Some(split) => ess(&rank_normalize(&split)),
        None => f64::NAN,
    }
}

/// Split-R̂ on the raw values.
pub fn split_r_hat(chains: &[Vec<f64>]) -> f64 {
    match split_chains(chains) {
        Some(split) => r_hat(&split),
        None => f64::NAN,
    }
}

/// Halve every chain; `None` if chains are ragged, empty or shorter than 4.
fn split_chains(chains: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = chains.first()?.len();
    if n < 4 || chains.iter().any(|c| c.len() != n) {
        return None;
    }
    let half = n / 2;
    let mut out = Vec::with_capacity(2 * chains.len());
    for chain in chains {
        out.push(chain[..half].to_vec());
        out.push(chain[n - half..].to_vec());
    }
    Some(out)
}

/// Replace values with normal scores of their pooled (average) ranks.
fn rank_normalize(chains: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut flat: Vec<(f64, usize)> =
        chains.iter().flatten().copied().enumerate().map(|(i, v)| (v, i)).collect();
    let total = flat.len();
    flat.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranks = vec![0.0; total];
    let mut i = 0;
    while i < total {
        let mut j = i;
        while j + 1 < total && flat[j + 1].0 == flat[i].0 {
            j += 1;
        }
        // 1-based average rank of the tie block [i, j].
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for item in &flat[i..=j] {
            ranks[item.1] = avg;
        }
        i = j + 1;
    }

    let std_normal = Normal::standard();
    let s = total as f64;
    let mut scores = ranks.into_iter().map(|r| std_normal.inverse_cdf((r - 0.375) / (s + 0.25)));
    chains.iter().map(|c| scores.by_ref().take(c.len()).collect()).collect()
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn sample_variance(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (xs.len() as f64 - 1.0)
}

/// Gelman–Rubin R̂ on equal-length chains (at least two, length ≥ 2).
fn r_hat(chains: &[Vec<f64>]) -> f64 {
    let n = chains[0].len() as f64;
    let means: Vec<f64> = chains.iter().map(|c| mean(c)).collect();
    let w = mean(&chains.iter().map(|c| sample_variance(c)).collect::<Vec<_>>());
    let b = n * sample_variance(&means);
    if w == 0.0 {
        return if b == 0.0 { 1.0 } else { f64::INFINITY };
    }
    let var_plus = (n - 1.0) / n * w + b / n;
    (var_plus / w).sqrt()
}

/// Biased autocovariance of `xs` at `lag`.
fn autocovariance(xs: &[f64], m: f64, lag: usize) -> f64 {
    let n = xs.len();
    xs[..n - lag].iter().zip(&xs[lag..]).map(|(a, b)| (a - m) * (b - m)).sum::<f64>() / n as f64
}

/// Multi-chain ESS with Geyer's initial monotone sequence.
fn ess(chains: &[Vec<f64>]) -> f64 {
    let m = chains.len();
    let n = chains[0].len();
    let total = (m * n) as f64;
    let means: Vec<f64> = chains.iter().map(|c| mean(c)).collect();
    let mean_acov = |lag: usize| -> f64 {
        chains.iter().zip(&means).map(|(c, &mu)| autocovariance(c, mu, lag)).sum::<f64>()
            / m as f64
    };

    let nf = n as f64;
    let mean_var = mean_acov(0) * nf / (nf - 1.0);
    let mut var_plus = mean_var * (nf - 1.0) / nf;
    if m > 1 {
        var_plus += sample_variance(&means);
    }
    if var_plus <= 0.0 {
        return total;
    }

    let rho = |lag: usize| 1.0 - (mean_var - mean_acov(lag)) / var_plus;
    let mut rho_hat = vec![0.0; n];
    rho_hat[0] = 1.0;
    let mut rho_even = 1.0;
    let mut rho_odd = rho(1);
    rho_hat[1] = rho_odd;

    let mut t = 1;
    while t + 3 < n && rho_even + rho_odd > 0.0 {
        rho_even = rho(t + 1);
        rho_odd = rho(t + 2);
        if rho_even + rho_odd >= 0.0 {
            rho_hat[t + 1] = rho_even;
            rho_hat[t + 2] = rho_odd;
        }
        t += 2;
    }
    let max_t = t.saturating_sub(2).max(1);
    if rho_even > 0.0 && max_t + 1 < n {
        rho_hat[max_t + 1] = rho_even;
    }

    let mut t = 1;
    while t + 2 <= max_t {
        let prev = rho_hat[t - 1] + rho_hat[t];
        if rho_hat[t + 1] + rho_hat[t + 2] > prev {
            rho_hat[t + 1] = prev / 2.0;
            rho_hat[t + 2] = rho_hat[t + 1];
        }
        t += 2;
    }

    let head: f64 = rho_hat[..=max_t].iter().sum();
    let tail = rho_hat.get(max_t + 1).copied().unwrap_or(0.0);
    let tau = (-1.0 + 2.0 * head + tail).max(1.0 / total.log10());
    total / tau
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::types::ChainRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, StandardNormal};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - R̂ near one for well-mixed chains, large for disagreeing chains.
    // - ESS near the draw count for independent draws, much smaller for
    //   strongly autocorrelated ones.
    // - Degenerate inputs (constant chains, short chains).
    // -------------------------------------------------------------------------

    fn iid_chains(seed: u64, m: usize, n: usize, shift: impl Fn(usize) -> f64) -> Vec<Vec<f64>> {
        let mut rng = ChainRng::seed_from_u64(seed);
        (0..m)
            .map(|c| {
                (0..n)
                    .map(|_| {
                        let z: f64 = StandardNormal.sample(&mut rng);
                        z + shift(c)
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // Independent standard-normal chains look converged.
    fn iid_chains_have_r_hat_near_one_and_high_ess() {
        let chains = iid_chains(42, 4, 500, |_| 0.0);
        let r = bulk_r_hat(&chains);
        let e = bulk_ess(&chains);
        assert!((r - 1.0).abs() < 0.02, "r_hat = {r}");
        assert!(e > 1200.0, "ess = {e}");
        assert!((split_r_hat(&chains) - 1.0).abs() < 0.02);
    }

    #[test]
    // Purpose
    // -------
    // Chains centered at different locations are flagged.
    fn separated_chains_have_large_r_hat() {
        let chains = iid_chains(7, 4, 300, |c| 5.0 * c as f64);
        assert!(bulk_r_hat(&chains) > 1.5);
    }

    #[test]
    // Purpose
    // -------
    // A strongly autocorrelated AR(1) chain has a small ESS.
    fn autocorrelated_chain_has_low_ess() {
        let mut rng = ChainRng::seed_from_u64(3);
        let chains: Vec<Vec<f64>> = (0..2)
            .map(|_| {
                let mut x = 0.0;
                (0..1000)
                    .map(|_| {
                        let z: f64 = StandardNormal.sample(&mut rng);
                        x = 0.98 * x + z;
                        x
                    })
                    .collect()
            })
            .collect();
        assert!(bulk_ess(&chains) < 200.0);
    }

    #[test]
    // Purpose
    // -------
    // Constant draws give R̂ = 1 and full ESS; constant but different chains
    // give R̂ = ∞; too-short chains give NaN.
    fn degenerate_inputs() {
        let same = vec![vec![3.0; 10], vec![3.0; 10]];
        assert_eq!(bulk_r_hat(&same), 1.0);
        assert_eq!(bulk_ess(&same), 20.0);

        let stuck = vec![vec![1.0; 10], vec![2.0; 10]];
        assert_eq!(split_r_hat(&stuck), f64::INFINITY);

        assert!(bulk_r_hat(&[vec![1.0, 2.0, 3.0]]).is_nan());
    }

    #[test]
    fn warning_lists_offending_parameters() {
        let diags = vec![
            ParameterDiagnostics { name: "a".into(), r_hat: 1.2, ess: 500.0 },
            ParameterDiagnostics { name: "b".into(), r_hat: 1.0, ess: 20.0 },
            ParameterDiagnostics { name: "c".into(), r_hat: f64::NAN, ess: f64::NAN },
        ];
        let warning =
            ConvergenceWarning::check(&diags, &[], ConvergenceThresholds::default()).unwrap();
        assert_eq!(warning.high_r_hat, vec!["a".to_string()]);
        assert_eq!(warning.low_ess, vec!["b".to_string()]);
        assert!(warning.to_string().contains("R-hat > 1.05 for [a]"));

        let fine = vec![ParameterDiagnostics { name: "a".into(), r_hat: 1.0, ess: 500.0 }];
        assert!(ConvergenceWarning::check(&fine, &[], ConvergenceThresholds::default()).is_none());
    }
}
