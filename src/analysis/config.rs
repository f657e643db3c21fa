//! Analysis configuration — one bundle for the whole pipeline.
//!
//! Purpose
//! -------
//! Collect the independent configuration pieces (price transform, priors,
//! sampler, estimator, event window, optional sub-window of the series) so a
//! run is described by a single value and can be reproduced from it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each component has already been validated by its own constructor;
//!   [`AnalysisConfig`] adds no cross-field checks beyond the sub-window
//!   range, which is checked against the series at run time.
//! - When `priors` is `None`, [`PriorConfig::for_transform`] is used for the
//!   configured transform.
use std::ops::Range;

use crate::{
    changepoint::core::{data::PriceTransform, priors::PriorConfig},
    events::correlate::CorrelationWindow,
    inference::estimate::EstimatorOptions,
    sampling::options::SamplerOptions,
};

/// Configuration of a [`ChangePointAnalysis`](crate::analysis::ChangePointAnalysis).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub transform: PriceTransform,
    /// `None` selects the reference priors of `transform`.
    pub priors: Option<PriorConfig>,
    pub sampler: SamplerOptions,
    pub estimator: EstimatorOptions,
    pub window: CorrelationWindow,
    /// Positional sub-range of the input series to model; `None` uses all of
    /// it.
    pub range: Option<Range<usize>>,
}

impl AnalysisConfig {
    pub fn new(
        transform: PriceTransform, sampler: SamplerOptions, estimator: EstimatorOptions,
        window: CorrelationWindow,
    ) -> Self {
        AnalysisConfig { transform, priors: None, sampler, estimator, window, range: None }
    }

    pub fn with_priors(mut self, priors: PriorConfig) -> Self {
        self.priors = Some(priors);
        self
    }

    pub fn with_range(mut self, range: Range<usize>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.sampler = self.sampler.with_seed(seed);
        self
    }

    /// Priors actually used for a run.
    pub fn resolved_priors(&self) -> PriorConfig {
        self.priors.unwrap_or_else(|| PriorConfig::for_transform(self.transform))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig::new(
            PriceTransform::default(),
            SamplerOptions::default(),
            EstimatorOptions::default(),
            CorrelationWindow::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Priors follow the transform unless set explicitly.
    fn priors_default_to_the_transform() {
        let mut cfg = AnalysisConfig::default();
        assert_eq!(cfg.resolved_priors(), PriorConfig::for_transform(PriceTransform::Raw));
        cfg.transform = PriceTransform::Log;
        assert_eq!(cfg.resolved_priors().mean_scale, 1.0);

        let custom = PriorConfig::new(5.0, 2.0).unwrap();
        let cfg = cfg.with_priors(custom).with_range(0..10).with_seed(Some(4));
        assert_eq!(cfg.resolved_priors(), custom);
        assert_eq!(cfg.range, Some(0..10));
        assert_eq!(cfg.sampler.seed, Some(4));
    }
}
