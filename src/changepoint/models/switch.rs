//! Single change-point model: hard mean switch with a shared noise scale.
//!
//! This module wires the generative model
//!
//! ```text
//! τ            ~ DiscreteUniform(0, n − 1)
//! μ1, μ2       ~ Normal(x̄, s_μ)
//! σ            ~ HalfNormal(s_σ)
//! x_i | τ,μ,σ  ~ Normal(μ1 if i < τ else μ2, σ)
//! ```
//!
//! to the sampler's [`MixedTarget`] trait.
//!
//! Key ideas:
//! - [`log_likelihood`] is the direct per-observation definition (statrs
//!   `Normal::ln_pdf` summed over the series); it validates its inputs and is
//!   the reference the fast path is tested against.
//! - [`ChangePointModel`] precomputes centered prefix sums once, so the
//!   likelihood of any `(τ, μ1, μ2, σ)` is O(1). Centering on `x̄` keeps the
//!   `Σx² − 2μΣx + nμ²` expansion well conditioned for price-level data.
//! - The continuous block lives in `θ = (μ1, μ2, θσ)` with
//!   `σ = SIGMA_FLOOR + softplus(θσ)`; the log density includes the log
//!   Jacobian and has an analytic gradient.
//! - The model is immutable after construction and therefore `Sync`; chains
//!   share it by reference.
use ndarray::array;
use rand::Rng;
use rand_distr::{Distribution, Normal as NormalSampler, StandardNormal};
use statrs::distribution::{Continuous, Normal};

use crate::{
    changepoint::{
        core::{
            data::TimeSeries,
            params::{CONTINUOUS_DIM, ChangePointParams, MEAN1, MEAN2, PARAMETER_NAMES, SIGMA},
            priors::{PriorConfig, Priors},
            transforms::{
                SIGMA_FLOOR, log_logistic, safe_logistic, sigma_from_unconstrained,
                sigma_to_unconstrained,
            },
        },
        errors::ChangePointResult,
    },
    sampling::{
        errors::{SamplerError, SamplerResult},
        traits::{MixedTarget, ParameterKind, ParameterSpec},
        types::{ChainRng, Grad, Theta},
    },
};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Log-likelihood of `series` under `params`, evaluated point by point.
///
/// For each position `i`, the mean is `mean1` when `i < break_index` and
/// `mean2` otherwise; the Normal log density with shared `sigma` is summed.
///
/// Errors
/// ------
/// - `ChangePointError::EmptySeries` / `BreakIndexOutOfRange` when
///   `break_index ∉ [0, n − 1]`.
/// - `ChangePointError::InvalidMean` / `InvalidSigma` for non-finite means
///   or a scale that is not finite and positive.
/// - `ChangePointError::Distribution` if statrs rejects the scale.
pub fn log_likelihood(series: &TimeSeries, params: &ChangePointParams) -> ChangePointResult<f64> {
    params.check_against(series.len())?;
    let before = Normal::new(params.mean1, params.sigma)?;
    let after = Normal::new(params.mean2, params.sigma)?;
    Ok(series
        .observations()
        .iter()
        .map(|obs| {
            if obs.index < params.break_index {
                before.ln_pdf(obs.value)
            } else {
                after.ln_pdf(obs.value)
            }
        })
        .sum())
}

/// Centered prefix sums of a series.
///
/// `sum[k] = Σ_{i<k} (x_i − c)`, `sum_sq[k] = Σ_{i<k} (x_i − c)²` for
/// `k = 0..=n`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStats {
    pub center: f64,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

/// Sufficient statistics of one segment, centered on [`SegmentStats::center`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub count: usize,
    pub sum: f64,
    pub sum_sq: f64,
}

impl Segment {
    /// `Σ (x_i − c − d)²` for a centered mean offset `d`.
    #[inline]
    pub fn rss(&self, d: f64) -> f64 {
        (self.sum_sq - 2.0 * d * self.sum + self.count as f64 * d * d).max(0.0)
    }

    /// Residual sum of squares around the segment's own mean.
    #[inline]
    pub fn rss_at_mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_sq - self.sum * self.sum / self.count as f64).max(0.0)
    }
}

impl SegmentStats {
    pub fn new(values: &[f64], center: f64) -> Self {
        let mut sum = Vec::with_capacity(values.len() + 1);
        let mut sum_sq = Vec::with_capacity(values.len() + 1);
        let (mut s, mut q) = (0.0, 0.0);
        sum.push(s);
        sum_sq.push(q);
        for &x in values {
            let d = x - center;
            s += d;
            q += d * d;
            sum.push(s);
            sum_sq.push(q);
        }
        SegmentStats { center, sum, sum_sq }
    }

    pub fn len(&self) -> usize {
        self.sum.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split at `k`: positions `[0, k)` and `[k, n)`.
    #[inline]
    pub fn split(&self, k: usize) -> (Segment, Segment) {
        let n = self.len();
        let before = Segment { count: k, sum: self.sum[k], sum_sq: self.sum_sq[k] };
        let after = Segment {
            count: n - k,
            sum: self.sum[n] - self.sum[k],
            sum_sq: self.sum_sq[n] - self.sum_sq[k],
        };
        (before, after)
    }
}

/// Result of the profile-likelihood scan over break positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileFit {
    pub break_index: usize,
    pub mean1: f64,
    pub mean2: f64,
    pub sigma: f64,
}

/// `ChangePointModel` — the single change-point model bound to one series.
///
/// Fields
/// ------
/// - `series`: the modeled series (already on its transform scale).
/// - `priors`: priors resolved against the series.
/// - `stats`: centered prefix sums for O(1) likelihood evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePointModel {
    pub series: TimeSeries,
    pub priors: Priors,
    stats: SegmentStats,
}

impl ChangePointModel {
    /// Build the model for `series` with hyperparameters `config`.
    ///
    /// The prior center of both means is the empirical mean of `series`.
    pub fn new(series: &TimeSeries, config: PriorConfig) -> ChangePointResult<Self> {
        let center = series.mean();
        let priors = config.resolve(center, series.len())?;
        let values: Vec<f64> = series.observations().iter().map(|obs| obs.value).collect();
        let stats = SegmentStats::new(&values, center);
        Ok(ChangePointModel { series: series.clone(), priors, stats })
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn stats(&self) -> &SegmentStats {
        &self.stats
    }

    /// O(1) log-likelihood; callers guarantee `k < n` and `sigma > 0`.
    #[inline]
    fn fast_log_likelihood(&self, k: usize, mean1: f64, mean2: f64, sigma: f64) -> f64 {
        let n = self.len() as f64;
        let c = self.stats.center;
        let (before, after) = self.stats.split(k);
        let rss = before.rss(mean1 - c) + after.rss(mean2 - c);
        -0.5 * n * LN_2PI - n * sigma.ln() - rss / (2.0 * sigma * sigma)
    }

    /// Log-likelihood of the bound series under `params`.
    ///
    /// Rejects the same inputs as the free [`log_likelihood`].
    pub fn log_likelihood(&self, params: &ChangePointParams) -> ChangePointResult<f64> {
        params.check_against(self.len())?;
        Ok(self.fast_log_likelihood(params.break_index, params.mean1, params.mean2, params.sigma))
    }

    /// Unnormalized log posterior `log p(params) + log L(params)`.
    pub fn log_posterior(&self, params: &ChangePointParams) -> ChangePointResult<f64> {
        Ok(self.priors.ln_prior(params) + self.log_likelihood(params)?)
    }

    /// Scan all break positions with segment means and a pooled sigma at
    /// their conditional maximum-likelihood values.
    ///
    /// Ties resolve to the smallest index. An empty first segment (`k = 0`)
    /// reports the prior center as its mean.
    pub fn profile_fit(&self) -> ProfileFit {
        let n = self.len();
        let mut best = (0, f64::INFINITY);
        for k in 0..n {
            let (before, after) = self.stats.split(k);
            let rss = before.rss_at_mean() + after.rss_at_mean();
            if rss < best.1 {
                best = (k, rss);
            }
        }
        let (k, rss) = best;
        let (before, after) = self.stats.split(k);
        let c = self.stats.center;
        let seg_mean =
            |s: &Segment| if s.count == 0 { c } else { c + s.sum / s.count as f64 };
        let scale_hint = 1e-6 * (1.0 + c.abs());
        ProfileFit {
            break_index: k,
            mean1: seg_mean(&before),
            mean2: seg_mean(&after),
            sigma: (rss / n as f64).sqrt().max(scale_hint).max(2.0 * SIGMA_FLOOR),
        }
    }
}

impl MixedTarget for ChangePointModel {
    fn parameters(&self) -> Vec<ParameterSpec> {
        let s_mu = self.priors.config.mean_scale;
        let s_sigma = self.priors.config.sigma_scale;
        let c = self.priors.center;
        vec![
            ParameterSpec::new(
                PARAMETER_NAMES[0],
                ParameterKind::Discrete { lower: 0, upper: self.len() - 1 },
                format!("DiscreteUniform(0, {})", self.len() - 1),
            ),
            ParameterSpec::new(
                PARAMETER_NAMES[1],
                ParameterKind::Real,
                format!("Normal({c:.4}, {s_mu})"),
            ),
            ParameterSpec::new(
                PARAMETER_NAMES[2],
                ParameterKind::Real,
                format!("Normal({c:.4}, {s_mu})"),
            ),
            ParameterSpec::new(
                PARAMETER_NAMES[3],
                ParameterKind::Positive,
                format!("HalfNormal({s_sigma})"),
            ),
        ]
    }

    fn discrete_support(&self) -> (usize, usize) {
        (0, self.len() - 1)
    }

    fn continuous_dim(&self) -> usize {
        CONTINUOUS_DIM
    }

    /// Log posterior in `(τ, θ)`, including `log |dσ/dθσ|`.
    ///
    /// Returns `-inf` for `τ` outside the support; errors on a wrong-length θ.
    fn log_density(&self, discrete: usize, theta: &Theta) -> SamplerResult<f64> {
        if theta.len() != CONTINUOUS_DIM {
            return Err(SamplerError::GradientDimMismatch {
                expected: CONTINUOUS_DIM,
                found: theta.len(),
            });
        }
        if discrete >= self.len() {
            return Ok(f64::NEG_INFINITY);
        }
        let (m1, m2, t) = (theta[MEAN1], theta[MEAN2], theta[SIGMA]);
        let sigma = sigma_from_unconstrained(t);
        let value = self.priors.ln_break(discrete)
            + self.priors.ln_mean(m1)
            + self.priors.ln_mean(m2)
            + self.priors.ln_sigma(sigma)
            + self.fast_log_likelihood(discrete, m1, m2, sigma)
            + log_logistic(t);
        if value.is_nan() || value == f64::INFINITY {
            return Err(SamplerError::NonFiniteLogDensity { value });
        }
        Ok(value)
    }

    /// Analytic gradient with respect to `θ` at fixed `τ`.
    fn grad(&self, discrete: usize, theta: &Theta) -> SamplerResult<Grad> {
        if discrete >= self.len() {
            return Err(SamplerError::InvalidInitialState {
                reason: format!("break index {discrete} outside support"),
            });
        }
        let (m1, m2, t) = (theta[MEAN1], theta[MEAN2], theta[SIGMA]);
        let c = self.stats.center;
        let sigma = sigma_from_unconstrained(t);
        let var = sigma * sigma;
        let (before, after) = self.stats.split(discrete);
        let (d1, d2) = (m1 - c, m2 - c);

        let g1 = (before.sum - before.count as f64 * d1) / var + self.priors.d_ln_mean(m1);
        let g2 = (after.sum - after.count as f64 * d2) / var + self.priors.d_ln_mean(m2);

        let rss = before.rss(d1) + after.rss(d2);
        let d_sigma = -(self.len() as f64) / sigma + rss / (var * sigma)
            + self.priors.d_ln_sigma(sigma);
        let g3 = d_sigma * safe_logistic(t) + safe_logistic(-t);

        Ok(array![g1, g2, g3])
    }

    /// Map `θ` to `(mean1, mean2, sigma)`.
    fn constrain(&self, theta: &Theta) -> Theta {
        array![theta[MEAN1], theta[MEAN2], sigma_from_unconstrained(theta[SIGMA])]
    }

    /// Profile-likelihood break index with conditional MLE continuous values.
    fn warm_start_hint(&self) -> (usize, Theta) {
        let fit = self.profile_fit();
        (fit.break_index, array![fit.mean1, fit.mean2, sigma_to_unconstrained(fit.sigma)])
    }

    /// Draw `(τ, θ)` from the prior.
    fn prior_draw(&self, rng: &mut ChainRng) -> (usize, Theta) {
        let k = rng.random_range(0..self.len());
        let s_mu = self.priors.config.mean_scale;
        let mean = |rng: &mut ChainRng| {
            let z: f64 = StandardNormal.sample(rng);
            self.priors.center + s_mu * z
        };
        let m1 = mean(rng);
        let m2 = mean(rng);
        let half = NormalSampler::new(0.0, self.priors.config.sigma_scale)
            .map(|d| d.sample(rng).abs())
            .unwrap_or(self.priors.config.sigma_scale);
        let sigma = half.max(2.0 * SIGMA_FLOOR);
        (k, array![m1, m2, sigma_to_unconstrained(sigma)])
    }
}
