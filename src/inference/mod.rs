//! inference — point estimates and posterior summaries from sampler output.
//!
//! Purpose
//! -------
//! Turn a [`PosteriorSampleSet`](crate::sampling::PosteriorSampleSet) into
//! the quantities a report needs: the estimated break index and date, credible
//! intervals, and per-parameter summaries with convergence statistics.
//!
//! Key behaviors
//! -------------
//! - [`estimate`] reduces break-index draws by median (default) or mean,
//!   truncates toward zero and looks the index up in the series.
//! - [`quantile`] provides type-7 quantiles and equal-tailed
//!   [`CredibleInterval`]s.
//! - [`summarize`] builds one [`ParameterSummary`] row per parameter;
//!   [`SummaryTable`] renders them.
//!
//! Conventions
//! -----------
//! - All functions are pure; the only side effect is one `tracing::info!`
//!   event when an estimate is produced.
//! - Failures are reported as `ChangePointError`.

pub mod estimate;
pub mod quantile;
pub mod summary;

pub use self::estimate::{CentralTendency, ChangePointEstimate, EstimatorOptions, estimate};
pub use self::quantile::{CredibleInterval, DEFAULT_CREDIBLE_MASS};
pub use self::summary::{ParameterSummary, SummaryTable, summarize};
