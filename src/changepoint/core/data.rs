//! Series containers for change-point models.
//!
//! Purpose
//! -------
//! Provide a small, validated container for the dated price series that the
//! change-point model is fitted to, plus the explicit choice of modeling
//! scale (raw price or log price). This module centralizes input validation so
//! that the model, sampler and estimator can assume clean, ordered data.
//!
//! Key behaviors
//! -------------
//! - [`TimeSeries`] enforces non-emptiness, finite values and strictly
//!   increasing timestamps at construction time.
//! - [`TimeSeries::transform`] returns the series on the chosen
//!   [`PriceTransform`] scale; the log scale additionally requires strictly
//!   positive values.
//! - [`TimeSeries::window`] extracts a re-indexed contiguous sub-series, used
//!   when a long series is fitted one adjacent segment pair at a time.
//!
//! Invariants & assumptions
//! ------------------------
//! - `len() > 0`.
//! - `timestamps[i] < timestamps[i + 1]` for all `i`.
//! - All values are finite.
//! - `observation.index == position` for every stored observation.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; the break index of the model is expressed in these
//!   positions.
//! - Gaps between dates (weekends, holidays) are allowed; only ordering is
//!   required.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction failures (empty, non-finite,
//!   non-monotonic), the log transform and window re-indexing.
use std::ops::Range;

use chrono::NaiveDate;
use ndarray::Array1;

use crate::changepoint::errors::{ChangePointError, ChangePointResult};

/// Scale on which the series is modeled.
///
/// `Raw` fits segment means to prices directly; `Log` fits them to
/// `ln(price)`, which turns level shifts into relative shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PriceTransform {
    #[default]
    Raw,
    Log,
}

impl PriceTransform {
    /// Map a modeled value back to price units.
    pub fn invert(&self, value: f64) -> f64 {
        match self {
            PriceTransform::Raw => value,
            PriceTransform::Log => value.exp(),
        }
    }
}

impl std::str::FromStr for PriceTransform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" | "price" => Ok(PriceTransform::Raw),
            "log" | "log_price" => Ok(PriceTransform::Log),
            _ => Err(format!("unknown price transform '{s}'; expected 'raw' or 'log'")),
        }
    }
}

/// A single dated observation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// 0-based position in the series.
    pub index: usize,
    pub timestamp: NaiveDate,
    pub value: f64,
}

/// `TimeSeries` — validated, chronologically ordered dated series.
///
/// Purpose
/// -------
/// Represent the univariate series a single change point is inferred on.
///
/// Fields
/// ------
/// - `observations`: `Vec<Observation>`
///   Ordered observations; `observations[i].index == i`.
/// - `transform`: [`PriceTransform`]
///   Scale the stored values are expressed on.
///
/// Invariants
/// ----------
/// - Non-empty, finite values, strictly increasing timestamps.
///
/// Performance
/// -----------
/// - Construction is a single O(n) scan; accessors are O(1) or O(n) copies.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    observations: Vec<Observation>,
    transform: PriceTransform,
}

impl TimeSeries {
    /// Construct a validated [`TimeSeries`] from `(date, value)` pairs on the
    /// raw price scale.
    ///
    /// Errors
    /// ------
    /// - `ChangePointError::EmptySeries` when `points` is empty.
    /// - `ChangePointError::NonFiniteValue` for the first NaN/±∞ value.
    /// - `ChangePointError::NonMonotonicTimestamps` for the first date that
    ///   does not strictly follow its predecessor.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use chrono::NaiveDate;
    /// # use bayes_changepoint::changepoint::core::data::TimeSeries;
    /// let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
    /// let series = TimeSeries::new(vec![(d(1), 60.0), (d(2), 61.0), (d(3), 59.5)]).unwrap();
    /// assert_eq!(series.len(), 3);
    /// assert_eq!(series.get(2).unwrap().index, 2);
    /// ```
    pub fn new(points: Vec<(NaiveDate, f64)>) -> ChangePointResult<Self> {
        Self::with_transform(points, PriceTransform::Raw)
    }

    fn with_transform(
        points: Vec<(NaiveDate, f64)>, transform: PriceTransform,
    ) -> ChangePointResult<Self> {
        if points.is_empty() {
            return Err(ChangePointError::EmptySeries);
        }

        let mut observations = Vec::with_capacity(points.len());
        let mut previous: Option<NaiveDate> = None;
        for (index, (timestamp, value)) in points.into_iter().enumerate() {
            if !value.is_finite() {
                return Err(ChangePointError::NonFiniteValue { index, value });
            }
            if let Some(prev) = previous {
                if timestamp <= prev {
                    return Err(ChangePointError::NonMonotonicTimestamps {
                        index,
                        previous: prev,
                        current: timestamp,
                    });
                }
            }
            previous = Some(timestamp);
            observations.push(Observation { index, timestamp, value });
        }

        Ok(TimeSeries { observations, transform })
    }

    /// Return the series on the requested modeling scale.
    ///
    /// Transforms are applied relative to raw prices; transforming an already
    /// log-scaled series to `Log` again is a no-op, and `Raw` undoes `Log`.
    ///
    /// Errors
    /// ------
    /// - `ChangePointError::NonPositiveForLog` if a raw value is ≤ 0 and
    ///   `transform == Log`.
    pub fn transform(&self, transform: PriceTransform) -> ChangePointResult<TimeSeries> {
        if transform == self.transform {
            return Ok(self.clone());
        }
        let mut points = Vec::with_capacity(self.len());
        for obs in &self.observations {
            let raw = self.transform.invert(obs.value);
            let value = match transform {
                PriceTransform::Raw => raw,
                PriceTransform::Log => {
                    if raw <= 0.0 {
                        return Err(ChangePointError::NonPositiveForLog {
                            index: obs.index,
                            value: raw,
                        });
                    }
                    raw.ln()
                }
            };
            points.push((obs.timestamp, value));
        }
        Self::with_transform(points, transform)
    }

    /// Contiguous sub-series `range`, re-indexed from zero.
    pub fn window(&self, range: Range<usize>) -> ChangePointResult<TimeSeries> {
        if range.start >= range.end || range.end > self.len() {
            return Err(ChangePointError::InvalidWindowRange {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        let points = self.observations[range].iter().map(|o| (o.timestamp, o.value)).collect();
        Self::with_transform(points, self.transform)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn price_transform(&self) -> PriceTransform {
        self.transform
    }

    /// Values as an owned `ndarray` vector.
    pub fn values(&self) -> Array1<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    /// Empirical mean of the stored values.
    pub fn mean(&self) -> f64 {
        self.observations.iter().map(|o| o.value).sum::<f64>() / self.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - `TimeSeries::new` invariants (non-empty, finite, strictly increasing).
    // - Log transform round-trip and non-positive rejection.
    // - Window extraction and re-indexing.
    // -------------------------------------------------------------------------

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Valid input is indexed by position and keeps its values.
    //
    // Given
    // -----
    // - Three increasing dates with finite values.
    //
    // Expect
    // ------
    // - `index` equals position, `mean` is the arithmetic mean.
    fn new_indexes_observations_by_position() {
        let series = TimeSeries::new(vec![(day(1), 1.0), (day(2), 2.0), (day(5), 6.0)]).unwrap();

        assert_eq!(series.len(), 3);
        for (i, obs) in series.observations().iter().enumerate() {
            assert_eq!(obs.index, i);
        }
        assert_eq!(series.mean(), 3.0);
        assert_eq!(series.price_transform(), PriceTransform::Raw);
    }

    #[test]
    fn new_rejects_empty_series() {
        assert_eq!(TimeSeries::new(vec![]).unwrap_err(), ChangePointError::EmptySeries);
    }

    #[test]
    // Purpose
    // -------
    // The first non-finite value is reported with its index.
    fn new_rejects_non_finite_values() {
        let err = TimeSeries::new(vec![(day(1), 1.0), (day(2), f64::INFINITY)]).unwrap_err();
        assert_eq!(err, ChangePointError::NonFiniteValue { index: 1, value: f64::INFINITY });
    }

    #[test]
    // Purpose
    // -------
    // Duplicate and decreasing dates are both rejected.
    fn new_rejects_non_monotonic_timestamps() {
        let err = TimeSeries::new(vec![(day(1), 1.0), (day(1), 2.0)]).unwrap_err();
        assert_eq!(
            err,
            ChangePointError::NonMonotonicTimestamps { index: 1, previous: day(1), current: day(1) }
        );

        let err =
            TimeSeries::new(vec![(day(1), 1.0), (day(3), 2.0), (day(2), 3.0)]).unwrap_err();
        assert!(matches!(err, ChangePointError::NonMonotonicTimestamps { index: 2, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Log transform maps values through `ln` and can be undone.
    fn log_transform_round_trips() {
        let series = TimeSeries::new(vec![(day(1), 1.0), (day(2), std::f64::consts::E)]).unwrap();
        let logged = series.transform(PriceTransform::Log).unwrap();

        assert_eq!(logged.price_transform(), PriceTransform::Log);
        assert_eq!(logged.get(0).unwrap().value, 0.0);
        assert!((logged.get(1).unwrap().value - 1.0).abs() < 1e-12);

        let back = logged.transform(PriceTransform::Raw).unwrap();
        assert!((back.get(1).unwrap().value - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn log_transform_rejects_non_positive_prices() {
        let series = TimeSeries::new(vec![(day(1), 1.0), (day(2), -0.5)]).unwrap();
        let err = series.transform(PriceTransform::Log).unwrap_err();
        assert_eq!(err, ChangePointError::NonPositiveForLog { index: 1, value: -0.5 });
    }

    #[test]
    // Purpose
    // -------
    // Windows are re-indexed from zero and keep dates.
    fn window_reindexes_from_zero() {
        let series =
            TimeSeries::new((1..=5).map(|d| (day(d), d as f64)).collect::<Vec<_>>()).unwrap();
        let sub = series.window(2..4).unwrap();

        assert_eq!(sub.len(), 2);
        assert_eq!(sub.get(0).unwrap().index, 0);
        assert_eq!(sub.get(0).unwrap().timestamp, day(3));
        assert_eq!(sub.get(1).unwrap().value, 4.0);

        assert_eq!(
            series.window(3..9).unwrap_err(),
            ChangePointError::InvalidWindowRange { start: 3, end: 9, len: 5 }
        );
    }

    #[test]
    fn transform_parses_from_str() {
        assert_eq!("LOG".parse::<PriceTransform>().unwrap(), PriceTransform::Log);
        assert_eq!("raw".parse::<PriceTransform>().unwrap(), PriceTransform::Raw);
        assert!("sqrt".parse::<PriceTransform>().is_err());
    }
}
