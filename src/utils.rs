//! Python conversion helpers for the `python-bindings` feature.
//!
//! These functions turn loosely typed Python inputs (numpy arrays, pandas
//! series, plain sequences, ISO date strings) into the validated Rust types
//! the analysis pipeline expects, mapping every failure to a `PyErr`.
#[cfg(feature = "python-bindings")]
use std::str::FromStr;

#[cfg(feature = "python-bindings")]
use chrono::NaiveDate;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
use crate::{
    analysis::AnalysisConfig,
    changepoint::core::{data::PriceTransform, data::TimeSeries},
    events::{CorrelationWindow, Event},
    inference::estimate::{CentralTendency, EstimatorOptions},
    sampling::options::SamplerOptions,
};

/// Borrow a contiguous `f64` view of a numpy array, pandas series, or
/// float sequence, copying only when necessary.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Parse one `YYYY-MM-DD` string.
#[cfg(feature = "python-bindings")]
pub fn parse_date(raw: &str) -> PyResult<NaiveDate> {
    NaiveDate::from_str(raw.trim()).map_err(|e| {
        PyValueError::new_err(format!("invalid date {raw:?} (expected YYYY-MM-DD): {e}"))
    })
}

/// Build a raw-price [`TimeSeries`] from parallel date and value inputs.
#[cfg(feature = "python-bindings")]
pub fn extract_series<'py>(
    py: Python<'py>, dates: &Bound<'py, PyAny>, values: &Bound<'py, PyAny>,
) -> PyResult<TimeSeries> {
    let raw_dates: Vec<String> = dates
        .extract()
        .map_err(|_| PyTypeError::new_err("dates must be a sequence of 'YYYY-MM-DD' strings"))?;
    let arr = extract_f64_array(py, values)?;
    let values = arr.as_slice().map_err(|_| {
        PyValueError::new_err("values must be a 1-D contiguous float64 array or sequence")
    })?;
    if raw_dates.len() != values.len() {
        return Err(PyValueError::new_err(format!(
            "dates and values differ in length ({} vs {})",
            raw_dates.len(),
            values.len()
        )));
    }
    let points = raw_dates
        .iter()
        .zip(values)
        .map(|(d, &v)| Ok((parse_date(d)?, v)))
        .collect::<PyResult<Vec<_>>>()?;
    Ok(TimeSeries::new(points)?)
}

/// Events from a sequence of `(date, name)` or `(date, name, description)`
/// tuples; `None` is an empty catalog.
#[cfg(feature = "python-bindings")]
pub fn extract_events(events: Option<&Bound<'_, PyAny>>) -> PyResult<Vec<Event>> {
    let Some(events) = events else {
        return Ok(Vec::new());
    };
    let mut catalog = Vec::new();
    for item in events.try_iter()? {
        let item = item?;
        let event = if let Ok((date, name, description)) =
            item.extract::<(String, String, String)>()
        {
            Event::new(parse_date(&date)?, name, description)
        } else if let Ok((date, name)) = item.extract::<(String, String)>() {
            Event::new(parse_date(&date)?, name, "")
        } else {
            return Err(PyTypeError::new_err(
                "events must be (date, name) or (date, name, description) tuples",
            ));
        };
        catalog.push(event);
    }
    Ok(catalog)
}

/// Assemble an [`AnalysisConfig`] from Python keyword arguments.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn build_analysis_config(
    transform: Option<&str>, warmup: Option<usize>, draws: Option<usize>, chains: Option<usize>,
    target_accept: Option<f64>, leapfrog_steps: Option<usize>, seed: Option<u64>,
    statistic: Option<&str>, credible_mass: Option<f64>, window_days: Option<i64>,
) -> PyResult<AnalysisConfig> {
    let transform = match transform {
        Some(raw) => PriceTransform::from_str(raw).map_err(PyValueError::new_err)?,
        None => PriceTransform::default(),
    };
    let defaults = SamplerOptions::default();
    let sampler = SamplerOptions::new(
        warmup.unwrap_or(defaults.warmup),
        draws.unwrap_or(defaults.draws),
        chains.unwrap_or(defaults.chains),
        target_accept.unwrap_or(defaults.target_accept),
        leapfrog_steps.unwrap_or(defaults.leapfrog_steps),
    )?
    .with_seed(seed);
    let central_tendency = match statistic {
        Some(raw) => CentralTendency::from_str(raw).map_err(PyValueError::new_err)?,
        None => CentralTendency::default(),
    };
    let estimator = EstimatorOptions::new(
        central_tendency,
        credible_mass.or(EstimatorOptions::default().credible_mass),
        true,
    )?;
    let window = match window_days {
        Some(days) => CorrelationWindow::days(days)?,
        None => CorrelationWindow::default(),
    };
    Ok(AnalysisConfig::new(transform, sampler, estimator, window))
}
