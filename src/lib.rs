//! bayes_changepoint — Bayesian single change-point detection for price series.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the change-point analysis to Python via the `_bayes_changepoint` extension
//! module. The crate infers one unknown break in the mean of a daily price
//! series, reports it as a date with posterior uncertainty, and lists the
//! catalogued real-world events that fall near that date.
//!
//! Key behaviors
//! -------------
//! - [`changepoint`]: validated series, parameters, priors and the mean-switch
//!   likelihood (implements the sampler's target trait).
//! - [`sampling`]: multi-chain mixed discrete/continuous MCMC (Metropolis on
//!   the break index, adaptive HMC on the continuous block) with R̂/ESS
//!   diagnostics.
//! - [`inference`]: reduction of posterior draws to a dated estimate,
//!   credible intervals and parameter summaries.
//! - [`events`]: inclusive ±W-day matching of a break date against an event
//!   catalog.
//! - [`analysis`]: the end-to-end pipeline and its printable report.
//! - With `python-bindings`, a `ChangePointDetector` class under
//!   `bayes_changepoint.detection`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs only
//!   FFI glue, input conversion and error mapping.
//! - Seeds and configuration are passed explicitly; nothing reads global
//!   state or the environment.
//!
//! Conventions
//! -----------
//! - Indices are 0-based positions in the modeled series.
//! - Errors are propagated as [`changepoint::ChangePointError`] /
//!   [`sampling::SamplerError`] internally and converted to `PyErr` at the
//!   PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use bayes_changepoint::{
//!     analysis::{AnalysisConfig, ChangePointAnalysis},
//!     changepoint::TimeSeries,
//!     events::Event,
//!     sampling::CancelToken,
//! };
//! # fn load() -> (TimeSeries, Vec<Event>) { unimplemented!() }
//! let (series, events) = load();
//! let report = ChangePointAnalysis::new(AnalysisConfig::default())
//!     .run(&series, &events, &CancelToken::new())?;
//! print!("{report}");
//! # Ok::<(), bayes_changepoint::changepoint::ChangePointError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end scenarios on synthetic
//!   series are in `tests/integration_changepoint_pipeline.rs`.

pub mod analysis;
pub mod changepoint;
pub mod events;
pub mod inference;
pub mod sampling;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    analysis::{AnalysisConfig, AnalysisReport, ChangePointAnalysis},
    sampling::CancelToken,
    utils::{build_analysis_config, extract_events, extract_series},
};

/// ChangePointDetector — Python-facing wrapper for [`ChangePointAnalysis`].
///
/// Purpose
/// -------
/// Let Python callers configure an analysis once and fit it to any number of
/// dated price series.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `ChangePointDetector(transform="raw", warmup=1000, draws=2000, chains=4,
/// target_accept=0.8, leapfrog_steps=16, seed=None, statistic="median",
/// credible_mass=0.9, window_days=30)`; every argument is validated by the
/// corresponding Rust option type.
///
/// Notes
/// -----
/// - `fit` releases the GIL while sampling.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "bayes_changepoint.detection")]
pub struct ChangePointDetector {
    config: AnalysisConfig,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ChangePointDetector {
    #[new]
    #[pyo3(
        signature = (
            transform = None,
            warmup = None,
            draws = None,
            chains = None,
            target_accept = None,
            leapfrog_steps = None,
            seed = None,
            statistic = None,
            credible_mass = None,
            window_days = None
        ),
        text_signature = "(/, transform='raw', warmup=1000, draws=2000, chains=4, \
                          target_accept=0.8, leapfrog_steps=16, seed=None, statistic='median', \
                          credible_mass=0.9, window_days=30)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transform: Option<&str>, warmup: Option<usize>, draws: Option<usize>,
        chains: Option<usize>, target_accept: Option<f64>, leapfrog_steps: Option<usize>,
        seed: Option<u64>, statistic: Option<&str>, credible_mass: Option<f64>,
        window_days: Option<i64>,
    ) -> PyResult<Self> {
        let config = build_analysis_config(
            transform,
            warmup,
            draws,
            chains,
            target_accept,
            leapfrog_steps,
            seed,
            statistic,
            credible_mass,
            window_days,
        )?;
        Ok(ChangePointDetector { config })
    }

    /// Fit the detector to `values` observed on `dates` (ISO strings) and
    /// match the break against `events`, a sequence of `(date, name[,
    /// description])` tuples.
    #[pyo3(
        signature = (dates, values, events = None),
        text_signature = "(self, dates, values, /, events=None)"
    )]
    pub fn fit<'py>(
        &self, py: Python<'py>, dates: &Bound<'py, PyAny>, values: &Bound<'py, PyAny>,
        events: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<ChangePointFit> {
        let series = extract_series(py, dates, values)?;
        let catalog = extract_events(events)?;
        let analysis = ChangePointAnalysis::new(self.config.clone());
        let report =
            py.allow_threads(|| analysis.run(&series, &catalog, &CancelToken::new()))?;
        Ok(ChangePointFit { inner: report })
    }
}

/// ChangePointFit — read-only view of an [`AnalysisReport`] for Python.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "bayes_changepoint.detection")]
pub struct ChangePointFit {
    inner: AnalysisReport,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ChangePointFit {
    /// Estimated break index in the modeled series.
    #[getter]
    pub fn break_index(&self) -> usize {
        self.inner.estimate.break_index
    }

    /// Estimated break date as `YYYY-MM-DD`.
    #[getter]
    pub fn break_date(&self) -> String {
        self.inner.estimate.break_date.to_string()
    }

    /// Credible interval of the break index, if requested.
    #[getter]
    pub fn break_interval(&self) -> Option<(usize, usize)> {
        self.inner.estimate.break_interval.map(|ci| (ci.lower, ci.upper))
    }

    #[getter]
    pub fn mode_probability(&self) -> f64 {
        self.inner.estimate.mode_probability
    }

    /// Names of the events within the window, in catalog order.
    #[getter]
    pub fn events(&self) -> Vec<String> {
        self.inner.correlation.events.iter().map(|e| e.name.clone()).collect()
    }

    #[getter]
    pub fn mean_before(&self) -> f64 {
        self.inner.segment_shift.before
    }

    #[getter]
    pub fn mean_after(&self) -> f64 {
        self.inner.segment_shift.after
    }

    /// `True` when no convergence warning was raised.
    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.convergence_warning.is_none()
    }

    #[getter]
    pub fn seed(&self) -> u64 {
        self.inner.seed
    }

    /// Plain-text summary.
    pub fn summary(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "ChangePointFit(break_index={}, break_date='{}', events={})",
            self.inner.estimate.break_index,
            self.inner.estimate.break_date,
            self.inner.correlation.len()
        )
    }
}

/// _bayes_changepoint — PyO3 module initializer for the Python extension.
///
/// Registers the `detection` submodule and inserts it into `sys.modules` so
/// that `import bayes_changepoint.detection` works.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _bayes_changepoint<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let detection_mod = PyModule::new(_py, "detection")?;
    detection(_py, m, &detection_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("bayes_changepoint.detection", detection_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn detection<'py>(
    _py: Python, bayes_changepoint: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<ChangePointDetector>()?;
    m.add_class::<ChangePointFit>()?;
    bayes_changepoint.add_submodule(m)?;
    Ok(())
}
