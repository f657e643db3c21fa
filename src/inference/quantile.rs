//! Sample moments, quantiles and equal-tailed credible intervals.
//!
//! Quantiles use linear interpolation between order statistics (Hyndman &
//! Fan type 7, the NumPy default): for sorted `x` of length `n`, the
//! `q`-quantile is `x[⌊h⌋] + (h − ⌊h⌋)(x[⌊h⌋+1] − x[⌊h⌋])` with
//! `h = (n − 1) q`.
use crate::changepoint::errors::{ChangePointError, ChangePointResult};

/// Default posterior mass of credible intervals.
pub const DEFAULT_CREDIBLE_MASS: f64 = 0.90;

/// Slack for rounding discrete bounds, absorbing float error in `(1 − mass) / 2`.
const INDEX_ROUNDING_TOL: f64 = 1e-9;

/// Equal-tailed interval holding `mass` of the posterior.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredibleInterval<T> {
    pub lower: T,
    pub upper: T,
    pub mass: f64,
}

impl<T: PartialOrd> CredibleInterval<T> {
    pub fn contains(&self, value: &T) -> bool {
        &self.lower <= value && value <= &self.upper
    }
}

impl CredibleInterval<f64> {
    /// Equal-tailed interval of `values` (unsorted).
    ///
    /// Errors
    /// ------
    /// - `InvalidCredibleMass` unless `0 < mass < 1`.
    /// - `EmptySampleSet` for empty input.
    pub fn equal_tailed(values: &[f64], mass: f64) -> ChangePointResult<Self> {
        validate_mass(mass)?;
        let sorted = sorted_copy(values)?;
        let tail = (1.0 - mass) / 2.0;
        Ok(CredibleInterval {
            lower: quantile_sorted(&sorted, tail),
            upper: quantile_sorted(&sorted, 1.0 - tail),
            mass,
        })
    }
}

impl CredibleInterval<usize> {
    /// Interval over integer draws: bounds are widened to the enclosing
    /// integers of the real-valued interval. Bounds within
    /// `INDEX_ROUNDING_TOL` of an integer snap to it.
    pub fn equal_tailed_discrete(values: &[usize], mass: f64) -> ChangePointResult<Self> {
        let real: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        let ci = CredibleInterval::equal_tailed(&real, mass)?;
        Ok(CredibleInterval {
            lower: (ci.lower + INDEX_ROUNDING_TOL).floor() as usize,
            upper: (ci.upper - INDEX_ROUNDING_TOL).ceil() as usize,
            mass,
        })
    }
}

/// Reject masses outside `(0, 1)`.
pub fn validate_mass(mass: f64) -> ChangePointResult<()> {
    if !mass.is_finite() || mass <= 0.0 || mass >= 1.0 {
        return Err(ChangePointError::InvalidCredibleMass { value: mass });
    }
    Ok(())
}

fn sorted_copy(values: &[f64]) -> ChangePointResult<Vec<f64>> {
    if values.is_empty() {
        return Err(ChangePointError::EmptySampleSet);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

/// Type-7 quantile of already sorted, non-empty values; `q` is clamped to
/// `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Type-7 quantile of unsorted values.
pub fn quantile(values: &[f64], q: f64) -> ChangePointResult<f64> {
    Ok(quantile_sorted(&sorted_copy(values)?, q))
}

/// Median (type-7 quantile at ½, i.e. the midpoint of the central pair for
/// even lengths).
pub fn median(values: &[f64]) -> ChangePointResult<f64> {
    quantile(values, 0.5)
}

pub fn mean(values: &[f64]) -> ChangePointResult<f64> {
    if values.is_empty() {
        return Err(ChangePointError::EmptySampleSet);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n − 1` denominator); zero for one value.
pub fn std_dev(values: &[f64]) -> ChangePointResult<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Ok(0.0);
    }
    let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
    Ok((ss / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Type-7 interpolation reproduces NumPy's default quantiles.
    //
    // Given
    // -----
    // - `x = [1, 2, 3, 4]`.
    //
    // Expect
    // ------
    // - median 2.5, q(0.25) = 1.75, q(0.9) = 3.7.
    fn type7_quantiles_match_reference_values() {
        let x = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(median(&x).unwrap(), 2.5);
        assert_relative_eq!(quantile(&x, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile(&x, 0.9).unwrap(), 3.7, epsilon = 1e-12);
        assert_eq!(quantile(&x, 0.0).unwrap(), 1.0);
        assert_eq!(quantile(&x, 1.0).unwrap(), 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Equal-tailed interval on 0..=100 with mass 0.9 is [5, 95].
    fn equal_tailed_interval_on_uniform_grid() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let ci = CredibleInterval::equal_tailed(&values, 0.9).unwrap();
        assert_relative_eq!(ci.lower, 5.0, epsilon = 1e-9);
        assert_relative_eq!(ci.upper, 95.0, epsilon = 1e-9);
        assert!(ci.contains(&50.0));

        let discrete: Vec<usize> = (0..=100).collect();
        let ci = CredibleInterval::equal_tailed_discrete(&discrete, 0.9).unwrap();
        assert_eq!((ci.lower, ci.upper), (5, 95));
    }

    #[test]
    // Purpose
    // -------
    // Discrete bounds still widen outward when the real quantile falls
    // strictly between two indices.
    //
    // Given
    // -----
    // - Draws 0..=10, mass 0.9: real interval [0.5, 9.5].
    //
    // Expect
    // ------
    // - Discrete interval [0, 10].
    fn discrete_interval_widens_between_indices() {
        let discrete: Vec<usize> = (0..=10).collect();
        let ci = CredibleInterval::equal_tailed_discrete(&discrete, 0.9).unwrap();
        assert_eq!((ci.lower, ci.upper), (0, 10));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert_eq!(
            CredibleInterval::equal_tailed(&[1.0], 1.0).unwrap_err(),
            ChangePointError::InvalidCredibleMass { value: 1.0 }
        );
        assert_eq!(median(&[]).unwrap_err(), ChangePointError::EmptySampleSet);
        assert_eq!(std_dev(&[3.0]).unwrap(), 0.0);
        assert_relative_eq!(std_dev(&[1.0, 3.0]).unwrap(), 2f64.sqrt());
    }
}
