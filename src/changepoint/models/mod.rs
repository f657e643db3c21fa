//! models — the single change-point likelihood and its sampler target.

pub mod switch;

pub use self::switch::{ChangePointModel, ProfileFit, SegmentStats, log_likelihood};
