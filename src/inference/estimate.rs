//! Point estimate of the change point from posterior draws.
//!
//! Purpose
//! -------
//! Reduce the break-index draws to one index, map it to a date of the
//! modeled series, and attach the uncertainty a reader needs to judge it.
//!
//! Key behaviors
//! -------------
//! - The central statistic is the median (default) or the mean of the pooled
//!   break-index draws, truncated toward zero to an integer index.
//! - The index is looked up positionally in the series; an index outside
//!   `[0, n − 1]` is a fatal `IndexOutOfRange` fault, never clamped.
//! - Optional equal-tailed credible interval for the break index (and, via
//!   [`summarize`], for every parameter).
//! - The modal index, its posterior probability and the full histogram
//!   indicate how diffuse the posterior is.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column 0 of the sample set holds the break index.
//! - The estimate is a deterministic function of the sample set, the series
//!   and the options.
use std::{collections::BTreeMap, str::FromStr};

use chrono::NaiveDate;
use tracing::info;

use crate::{
    changepoint::{
        core::data::TimeSeries,
        errors::{ChangePointError, ChangePointResult},
    },
    inference::{
        quantile::{CredibleInterval, DEFAULT_CREDIBLE_MASS, mean, median, validate_mass},
        summary::{ParameterSummary, summarize},
    },
    sampling::samples::PosteriorSampleSet,
};

/// Statistic used to reduce the break-index draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CentralTendency {
    #[default]
    Median,
    Mean,
}

impl FromStr for CentralTendency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "median" => Ok(CentralTendency::Median),
            "mean" => Ok(CentralTendency::Mean),
            _ => Err(format!("unknown central tendency '{s}'; use 'median' or 'mean'")),
        }
    }
}

/// Estimator configuration.
///
/// - `central_tendency`: [`CentralTendency`], median by default.
/// - `credible_mass`: `Some(mass)` adds equal-tailed intervals; default 0.90.
/// - `summarize`: add per-parameter [`ParameterSummary`] rows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimatorOptions {
    pub central_tendency: CentralTendency,
    pub credible_mass: Option<f64>,
    pub summarize: bool,
}

impl EstimatorOptions {
    /// Errors
    /// ------
    /// - `InvalidCredibleMass` unless `credible_mass` is `None` or in `(0, 1)`.
    pub fn new(
        central_tendency: CentralTendency, credible_mass: Option<f64>, summarize: bool,
    ) -> ChangePointResult<Self> {
        if let Some(mass) = credible_mass {
            validate_mass(mass)?;
        }
        Ok(Self { central_tendency, credible_mass, summarize })
    }
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            central_tendency: CentralTendency::Median,
            credible_mass: Some(DEFAULT_CREDIBLE_MASS),
            summarize: true,
        }
    }
}

/// Point estimate of the change point with its uncertainty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangePointEstimate {
    pub break_index: usize,
    pub break_date: NaiveDate,
    /// Untruncated median or mean of the break-index draws.
    pub statistic: f64,
    pub central_tendency: CentralTendency,
    pub break_interval: Option<CredibleInterval<usize>>,
    /// Most frequent break index (smallest on ties).
    pub break_index_mode: usize,
    /// Posterior probability of the modal index.
    pub mode_probability: f64,
    /// Break index → number of draws.
    pub histogram: BTreeMap<usize, usize>,
    pub parameters: Option<Vec<ParameterSummary>>,
}

impl ChangePointEstimate {
    /// Dates bounding the break-index interval, if both fall in `series`.
    pub fn interval_dates(&self, series: &TimeSeries) -> Option<(NaiveDate, NaiveDate)> {
        let ci = self.break_interval?;
        Some((series.get(ci.lower)?.timestamp, series.get(ci.upper)?.timestamp))
    }

    /// Summary row of `name`, if summaries were computed.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSummary> {
        self.parameters.as_ref()?.iter().find(|p| p.name == name)
    }
}

/// Reduce `samples` to a [`ChangePointEstimate`] on `series`.
///
/// Errors
/// ------
/// - `EmptySampleSet` if there are no draws.
/// - `IndexOutOfRange` if the reduced index is not a position of `series`.
/// - `InvalidCredibleMass` / `SampleSetMismatch` from interval and summary
///   computation.
pub fn estimate(
    samples: &PosteriorSampleSet, series: &TimeSeries, options: &EstimatorOptions,
) -> ChangePointResult<ChangePointEstimate> {
    let draws = samples.discrete_values();
    if draws.is_empty() {
        return Err(ChangePointError::EmptySampleSet);
    }
    let real: Vec<f64> = draws.iter().map(|&k| k as f64).collect();
    let statistic = match options.central_tendency {
        CentralTendency::Median => median(&real)?,
        CentralTendency::Mean => mean(&real)?,
    };
    let break_index = statistic.trunc() as usize;
    let break_date = series
        .get(break_index)
        .map(|obs| obs.timestamp)
        .ok_or(ChangePointError::IndexOutOfRange { index: break_index, len: series.len() })?;

    let mut histogram = BTreeMap::new();
    for &k in &draws {
        *histogram.entry(k).or_insert(0usize) += 1;
    }
    let (break_index_mode, mode_count) =
        histogram.iter().fold((0, 0), |best, (&k, &c)| if c > best.1 { (k, c) } else { best });
    let mode_probability = mode_count as f64 / draws.len() as f64;

    let break_interval = options
        .credible_mass
        .map(|mass| CredibleInterval::equal_tailed_discrete(&draws, mass))
        .transpose()?;
    let parameters =
        if options.summarize { Some(summarize(samples, options.credible_mass)?) } else { None };

    info!(
        break_index,
        %break_date,
        statistic,
        break_index_mode,
        mode_probability,
        "change point estimated"
    );
    Ok(ChangePointEstimate {
        break_index,
        break_date,
        statistic,
        central_tendency: options.central_tendency,
        break_interval,
        break_index_mode,
        mode_probability,
        histogram,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::samples::Draw;
    use chrono::Duration;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Median vs mean reduction and truncation toward zero.
    // - Date lookup and the `IndexOutOfRange` fault.
    // - Mode, histogram and interval bookkeeping.
    // -------------------------------------------------------------------------

    fn series(n: usize) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        TimeSeries::new((0..n).map(|i| (start + Duration::days(i as i64), 50.0)).collect())
            .unwrap()
    }

    fn set_from(ks: &[usize]) -> PosteriorSampleSet {
        let draws: Vec<Draw> =
            ks.iter().map(|&k| Draw { discrete: k, continuous: array![1.0, 2.0, 0.5] }).collect();
        let n = draws.len();
        PosteriorSampleSet::from_chains(
            ["break_index", "mean1", "mean2", "sigma"].iter().map(|s| s.to_string()).collect(),
            vec![draws],
            n,
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Median of an even count is the midpoint and is truncated, not rounded.
    //
    // Given
    // -----
    // - Draws `[3, 4, 4, 5]` → median 4.0; `[3, 4]` → median 3.5.
    //
    // Expect
    // ------
    // - Indices 4 and 3 with their dates.
    fn median_is_truncated_toward_zero() {
        let s = series(10);
        let opts = EstimatorOptions::default();

        let est = estimate(&set_from(&[3, 4, 4, 5]), &s, &opts).unwrap();
        assert_eq!(est.break_index, 4);
        assert_eq!(est.break_date, NaiveDate::from_ymd_opt(2021, 3, 5).unwrap());

        let est = estimate(&set_from(&[3, 4]), &s, &opts).unwrap();
        assert_eq!(est.statistic, 3.5);
        assert_eq!(est.break_index, 3);
    }

    #[test]
    // Purpose
    // -------
    // Mean reduction differs from the median on skewed draws.
    fn mean_reduction_is_configurable() {
        let s = series(20);
        let opts = EstimatorOptions::new(CentralTendency::Mean, None, false).unwrap();
        let est = estimate(&set_from(&[2, 2, 2, 14]), &s, &opts).unwrap();
        assert_eq!(est.statistic, 5.0);
        assert_eq!(est.break_index, 5);
        assert!(est.break_interval.is_none());
        assert!(est.parameters.is_none());
    }

    #[test]
    // Purpose
    // -------
    // An index past the series end is a fault, not a clamp.
    fn index_beyond_series_is_an_error() {
        let err = estimate(&set_from(&[7, 7, 7]), &series(5), &EstimatorOptions::default())
            .unwrap_err();
        assert_eq!(err, ChangePointError::IndexOutOfRange { index: 7, len: 5 });
    }

    #[test]
    // Purpose
    // -------
    // Mode, histogram, interval and summaries are filled in.
    fn mode_histogram_and_interval() {
        let s = series(30);
        let est =
            estimate(&set_from(&[10, 11, 11, 11, 12, 20]), &s, &EstimatorOptions::default())
                .unwrap();
        assert_eq!(est.break_index_mode, 11);
        assert!((est.mode_probability - 0.5).abs() < 1e-12);
        assert_eq!(est.histogram.get(&11), Some(&3));
        let ci = est.break_interval.unwrap();
        assert!(ci.lower <= 11 && ci.upper >= 11);
        assert_eq!(est.parameter("sigma").unwrap().mean, 0.5);
        let (lo, hi) = est.interval_dates(&s).unwrap();
        assert!(lo <= est.break_date && est.break_date <= hi);
    }

    #[test]
    fn invalid_mass_and_unknown_statistic() {
        assert!(EstimatorOptions::new(CentralTendency::Median, Some(0.0), true).is_err());
        assert_eq!("MEAN".parse::<CentralTendency>().unwrap(), CentralTendency::Mean);
        assert!("mode".parse::<CentralTendency>().is_err());
    }
}
