//! Per-parameter posterior summaries.
//!
//! One row per sampled parameter (break index first), holding the posterior
//! mean, standard deviation, an optional equal-tailed credible interval and
//! the convergence statistics of the column. `Display` renders the rows as
//! a fixed-width table.
use crate::{
    changepoint::errors::{ChangePointError, ChangePointResult},
    inference::quantile::{CredibleInterval, mean, std_dev},
    sampling::{
        diagnostics::{bulk_ess, bulk_r_hat},
        samples::PosteriorSampleSet,
    },
};

/// Posterior summary of one parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSummary {
    pub name: String,
    pub mean: f64,
    pub sd: f64,
    pub interval: Option<CredibleInterval<f64>>,
    pub r_hat: f64,
    pub ess: f64,
}

/// Summaries of every parameter column of `samples`.
///
/// Errors
/// ------
/// - `EmptySampleSet` if there are no draws.
/// - `SampleSetMismatch` if a draw lacks a named column.
/// - `InvalidCredibleMass` for an invalid `mass`.
pub fn summarize(
    samples: &PosteriorSampleSet, mass: Option<f64>,
) -> ChangePointResult<Vec<ParameterSummary>> {
    if samples.is_empty() {
        return Err(ChangePointError::EmptySampleSet);
    }
    let expected = samples.parameter_names().len();
    samples
        .parameter_names()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let by_chain = samples
                .parameter_by_chain(j)
                .ok_or(ChangePointError::SampleSetMismatch { expected, actual: j })?;
            let pooled: Vec<f64> = by_chain.iter().flatten().copied().collect();
            let interval =
                mass.map(|m| CredibleInterval::equal_tailed(&pooled, m)).transpose()?;
            Ok(ParameterSummary {
                name: name.clone(),
                mean: mean(&pooled)?,
                sd: std_dev(&pooled)?,
                interval,
                r_hat: bulk_r_hat(&by_chain),
                ess: bulk_ess(&by_chain),
            })
        })
        .collect()
}

/// Fixed-width table of summaries.
pub struct SummaryTable<'a>(pub &'a [ParameterSummary]);

impl std::fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mass = self.0.iter().find_map(|s| s.interval.map(|ci| ci.mass));
        let (lo, hi) = match mass {
            Some(m) => (
                format!("{:.1}%", 50.0 * (1.0 - m)),
                format!("{:.1}%", 100.0 - 50.0 * (1.0 - m)),
            ),
            None => ("lower".to_string(), "upper".to_string()),
        };
        writeln!(
            f,
            "{:<12} {:>12} {:>10} {:>12} {:>12} {:>7} {:>9}",
            "", "mean", "sd", lo, hi, "r_hat", "ess_bulk"
        )?;
        for s in self.0 {
            let (l, u) = s.interval.map_or((f64::NAN, f64::NAN), |ci| (ci.lower, ci.upper));
            writeln!(
                f,
                "{:<12} {:>12.3} {:>10.3} {:>12.3} {:>12.3} {:>7.3} {:>9.0}",
                s.name, s.mean, s.sd, l, u, s.r_hat, s.ess
            )?;
        }
        Ok(())
    }
}
