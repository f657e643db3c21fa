//! Analysis pipeline and its report.
//!
//! Purpose
//! -------
//! Chain the crate's stages for one series: select and transform the data,
//! build the change-point model, sample the posterior, reduce it to a
//! dated estimate, and match that date against an event catalog.
//!
//! Key behaviors
//! -------------
//! - Every stage error surfaces as a [`ChangePointError`]; sampler failures
//!   (including cancellation with partial draws) arrive wrapped in
//!   `ChangePointError::Sampling`.
//! - A [`ConvergenceWarning`] is carried in the report, never raised.
//! - Segment levels are reported in price units: posterior means of
//!   `mean1`/`mean2` are passed through [`PriceTransform::invert`].
//! - `Display` renders the plain-text summary: the estimated date followed by
//!   the nearby events, or a line stating that none fall in the window.
use std::fmt;

use tracing::{info, warn};

use crate::{
    analysis::config::AnalysisConfig,
    changepoint::{
        core::{
            data::{PriceTransform, TimeSeries},
            params::{MEAN1, MEAN2},
        },
        errors::{ChangePointError, ChangePointResult},
        models::switch::ChangePointModel,
    },
    events::{
        catalog::Event,
        correlate::{CorrelationResult, correlate},
    },
    inference::{
        estimate::{ChangePointEstimate, estimate},
        quantile::mean,
    },
    sampling::{
        cancel::CancelToken, diagnostics::ConvergenceWarning, run::sample,
        samples::{ChainStats, PosteriorSampleSet},
    },
};

/// Posterior-mean level on each side of the break, in price units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentShift {
    pub before: f64,
    pub after: f64,
    /// `(after − before) / before`.
    pub relative_change: f64,
}

impl SegmentShift {
    /// Errors
    /// ------
    /// - `EmptySampleSet` if `samples` has no draws.
    /// - `SampleSetMismatch` if the mean columns are missing.
    pub fn from_samples(
        samples: &PosteriorSampleSet, transform: PriceTransform,
    ) -> ChangePointResult<Self> {
        let column = |j: usize| {
            samples.parameter_values(j + 1).ok_or(ChangePointError::SampleSetMismatch {
                expected: MEAN2 + 1,
                actual: samples.parameter_names().len().saturating_sub(1),
            })
        };
        let before = transform.invert(mean(&column(MEAN1)?)?);
        let after = transform.invert(mean(&column(MEAN2)?)?);
        Ok(SegmentShift { before, after, relative_change: (after - before) / before })
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnalysisReport {
    pub estimate: ChangePointEstimate,
    pub correlation: CorrelationResult,
    pub convergence_warning: Option<ConvergenceWarning>,
    pub chain_stats: Vec<ChainStats>,
    pub segment_shift: SegmentShift,
    /// Seed of the sampling run.
    pub seed: u64,
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Estimated Change Point: {}", self.estimate.break_date)?;
        if self.correlation.is_empty() {
            writeln!(
                f,
                "No events within ±{} days of detected change point.",
                self.correlation.window.as_days()
            )
        } else {
            writeln!(f, "Nearby Events:")?;
            for event in &self.correlation.events {
                writeln!(f, "  {event}")?;
            }
            Ok(())
        }
    }
}

/// Configured change-point analysis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangePointAnalysis {
    config: AnalysisConfig,
}

impl ChangePointAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        ChangePointAnalysis { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the pipeline on `series` and match the result against `events`.
    ///
    /// Errors
    /// ------
    /// - `InvalidWindowRange` if the configured range does not fit `series`.
    /// - `NonPositiveForLog` under the log transform.
    /// - `Sampling(..)` for sampler failures, including cancellation.
    /// - Estimator faults such as `IndexOutOfRange`.
    pub fn run(
        &self, series: &TimeSeries, events: &[Event], cancel: &CancelToken,
    ) -> ChangePointResult<AnalysisReport> {
        let cfg = &self.config;
        let selected = match &cfg.range {
            Some(range) => series.window(range.clone())?,
            None => series.clone(),
        };
        let modeled = selected.transform(cfg.transform)?;
        let model = ChangePointModel::new(&modeled, cfg.resolved_priors())?;

        let outcome = sample(&model, &cfg.sampler, cancel)?;
        let estimate = estimate(&outcome.samples, &modeled, &cfg.estimator)?;
        let segment_shift = SegmentShift::from_samples(&outcome.samples, cfg.transform)?;
        let correlation = correlate(estimate.break_date, events, cfg.window)?;

        if outcome.warning.is_some() {
            warn!(break_date = %estimate.break_date, "estimate rests on a flagged sampling run");
        }
        info!(
            break_date = %estimate.break_date,
            matched_events = correlation.len(),
            window_days = cfg.window.as_days(),
            "analysis finished"
        );
        Ok(AnalysisReport {
            estimate,
            correlation,
            convergence_warning: outcome.warning,
            chain_stats: outcome.chain_stats,
            segment_shift,
            seed: outcome.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::correlate::CorrelationWindow,
        sampling::{errors::SamplerError, options::SamplerOptions, samples::Draw},
    };
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Segment levels in price units for both transforms.
    // - End-to-end run on a short synthetic series, sub-range selection.
    // - Summary text with and without nearby events.
    // - Cancellation surfaces as a wrapped sampler error.
    // -------------------------------------------------------------------------

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    /// Deterministic step with a small alternating wiggle.
    fn step_series(n: usize, k: usize) -> TimeSeries {
        TimeSeries::new(
            (0..n)
                .map(|i| {
                    let base = if i < k { 60.0 } else { 70.0 };
                    let wiggle = if i % 2 == 0 { 0.5 } else { -0.5 };
                    (start() + Duration::days(i as i64), base + wiggle)
                })
                .collect(),
        )
        .unwrap()
    }

    fn quick_config() -> AnalysisConfig {
        let sampler = SamplerOptions::new(200, 200, 2, 0.8, 10).unwrap();
        AnalysisConfig { sampler, ..AnalysisConfig::default() }.with_seed(Some(11))
    }

    #[test]
    // Purpose
    // -------
    // Log-scale means are exponentiated before the relative change.
    fn segment_shift_back_transforms_log_means() {
        let draws = vec![
            Draw { discrete: 3, continuous: array![0.0, 2f64.ln(), 0.1] },
            Draw { discrete: 3, continuous: array![0.0, 2f64.ln(), 0.1] },
        ];
        let names = ["break_index", "mean1", "mean2", "sigma"].map(String::from).to_vec();
        let set = PosteriorSampleSet::from_chains(names, vec![draws], 2).unwrap();

        let shift = SegmentShift::from_samples(&set, PriceTransform::Log).unwrap();
        assert_relative_eq!(shift.before, 1.0, epsilon = 1e-12);
        assert_relative_eq!(shift.after, 2.0, epsilon = 1e-12);
        assert_relative_eq!(shift.relative_change, 1.0, epsilon = 1e-12);

        let raw = SegmentShift::from_samples(&set, PriceTransform::Raw).unwrap();
        assert_relative_eq!(raw.after, 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The pipeline finds a clear break and names the event on that day.
    //
    // Given
    // -----
    // - 100 points, step 60 → 70 at index 40; event on the break date and
    //   another one far away.
    //
    // Expect
    // ------
    // - Break date within one day of the truth; only the close event matched.
    // - Summary lists it under "Nearby Events:".
    fn run_finds_break_and_nearby_event() {
        let series = step_series(100, 40);
        let truth = start() + Duration::days(40);
        let events = vec![
            Event::new(truth, "Supply shock", "Output cut announced"),
            Event::new(truth + Duration::days(200), "Unrelated", ""),
        ];
        let report = ChangePointAnalysis::new(quick_config())
            .run(&series, &events, &CancelToken::new())
            .unwrap();

        assert!((report.estimate.break_date - truth).num_days().abs() <= 1);
        assert_eq!(report.correlation.len(), 1);
        assert_eq!(report.chain_stats.len(), 2);
        assert_eq!(report.seed, 11);
        assert!(report.segment_shift.after > report.segment_shift.before);

        let text = report.to_string();
        let header = format!("Estimated Change Point: {}\n", report.estimate.break_date);
        assert!(text.starts_with(&header));
        assert!(text.contains("Nearby Events:\n"));
        assert!(text.contains("Supply shock"));
    }

    #[test]
    // Purpose
    // -------
    // A sub-range and log transform are applied before modeling, and an empty
    // match renders the "No events" line with the window width.
    fn run_on_sub_range_with_log_and_no_events() {
        let series = step_series(150, 70);
        let mut cfg = quick_config().with_range(20..120);
        cfg.transform = PriceTransform::Log;
        cfg.window = CorrelationWindow::days(0).unwrap();
        let report = ChangePointAnalysis::new(cfg).run(&series, &[], &CancelToken::new()).unwrap();

        let truth = start() + Duration::days(70);
        assert!((report.estimate.break_date - truth).num_days().abs() <= 1);
        assert_relative_eq!(report.segment_shift.before, 60.0, epsilon = 0.5);
        assert_relative_eq!(report.segment_shift.after, 70.0, epsilon = 0.5);
        let text = report.to_string();
        assert!(text.ends_with("No events within ±0 days of detected change point.\n"));
    }

    #[test]
    fn range_outside_series_is_rejected() {
        let cfg = quick_config().with_range(10..500);
        let err = ChangePointAnalysis::new(cfg)
            .run(&step_series(50, 20), &[], &CancelToken::new())
            .unwrap_err();
        assert_eq!(err, ChangePointError::InvalidWindowRange { start: 10, end: 500, len: 50 });
    }

    #[test]
    // Purpose
    // -------
    // Cancellation reaches the caller as a wrapped sampler error.
    fn cancelled_run_is_wrapped() {
        let token = CancelToken::new();
        token.cancel();
        let err = ChangePointAnalysis::new(quick_config())
            .run(&step_series(50, 20), &[], &token)
            .unwrap_err();
        assert!(matches!(err, ChangePointError::Sampling(SamplerError::Cancelled(_))));
    }
}
