//! analysis — end-to-end change-point analysis of a dated price series.
//!
//! Purpose
//! -------
//! Offer a single entry point that runs the crate's stages in order
//! (transform, model, sample, estimate, correlate) and collects their
//! outputs into an [`AnalysisReport`].
//!
//! Key behaviors
//! -------------
//! - [`AnalysisConfig`] bundles the per-stage options; its `Default` is the
//!   reference configuration (raw prices, median estimate, 90% intervals,
//!   ±30-day event window).
//! - [`ChangePointAnalysis::run`] is synchronous and cooperative with a
//!   [`CancelToken`](crate::sampling::CancelToken).
//! - [`AnalysisReport`] implements `Display` as a short plain-text summary.

pub mod config;
pub mod report;

pub use self::config::AnalysisConfig;
pub use self::report::{AnalysisReport, ChangePointAnalysis, SegmentShift};
