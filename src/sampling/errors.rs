use argmin::core::{ArgminError, Error};

use crate::{changepoint::errors::ChangePointError, sampling::samples::PartialSamples};

/// Crate-wide result alias for sampler operations.
pub type SamplerResult<T> = Result<T, SamplerError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SamplerError {
    // ---- SamplerOptions ----
    /// Retained draws must be positive.
    InvalidDraws {
        draws: usize,
    },

    /// At least one chain is required.
    InvalidChains {
        chains: usize,
    },

    /// Target acceptance must lie strictly between 0 and 1.
    InvalidTargetAccept {
        value: f64,
    },

    /// Leapfrog steps must be positive.
    InvalidLeapfrogSteps {
        steps: usize,
    },

    /// Discrete updates per iteration must be positive.
    InvalidDiscreteUpdates {
        updates: usize,
    },

    /// Random-walk half-width must be positive.
    InvalidRandomWalkStep {
        max_step: usize,
    },

    /// Convergence thresholds must be finite and sensible.
    InvalidThreshold {
        value: f64,
        reason: &'static str,
    },

    // ---- Target ----
    /// Implies that FD should be used.
    GradientNotImplemented,

    /// Gradient dimensions do not match the continuous block.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite.
    InvalidGradient {
        index: usize,
        value: f64,
    },

    /// Log density evaluated to NaN or +inf.
    NonFiniteLogDensity {
        value: f64,
    },

    /// Initial state has zero posterior density or wrong shape.
    InvalidInitialState {
        reason: String,
    },

    /// Discrete support is empty (`lower > upper`).
    EmptyDiscreteSupport {
        lower: usize,
        upper: usize,
    },

    /// Model-side failure while evaluating the target.
    Model {
        reason: String,
    },

    // ---- Run ----
    /// A chain returned fewer retained draws than configured.
    IncompleteChain {
        chain: usize,
        expected: usize,
        actual: usize,
    },

    /// Run was cancelled; completed draws are preserved per chain.
    Cancelled(PartialSamples),

    // ---- Warm start (argmin) ----
    /// L-BFGS warm start failed.
    WarmStartFailed {
        reason: String,
    },
}

impl std::error::Error for SamplerError {}

impl std::fmt::Display for SamplerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- SamplerOptions ----
            SamplerError::InvalidDraws { draws } => {
                write!(f, "Invalid number of retained draws {draws}: must be greater than zero")
            }
            SamplerError::InvalidChains { chains } => {
                write!(f, "Invalid number of chains {chains}: must be greater than zero")
            }
            SamplerError::InvalidTargetAccept { value } => {
                write!(f, "Invalid target acceptance {value}: must lie in (0, 1)")
            }
            SamplerError::InvalidLeapfrogSteps { steps } => {
                write!(f, "Invalid leapfrog steps {steps}: must be greater than zero")
            }
            SamplerError::InvalidDiscreteUpdates { updates } => {
                write!(f, "Invalid discrete updates per iteration {updates}: must be > 0")
            }
            SamplerError::InvalidRandomWalkStep { max_step } => {
                write!(f, "Invalid random-walk step {max_step}: must be greater than zero")
            }
            SamplerError::InvalidThreshold { value, reason } => {
                write!(f, "Invalid convergence threshold {value}: {reason}")
            }

            // ---- Target ----
            SamplerError::GradientNotImplemented => {
                write!(f, "Analytic gradient not implemented")
            }
            SamplerError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            SamplerError::InvalidGradient { index, value } => {
                write!(f, "Invalid gradient at index {index}: {value}, must be finite")
            }
            SamplerError::NonFiniteLogDensity { value } => {
                write!(f, "Non-finite log density: {value}")
            }
            SamplerError::InvalidInitialState { reason } => {
                write!(f, "Invalid initial state: {reason}")
            }
            SamplerError::EmptyDiscreteSupport { lower, upper } => {
                write!(f, "Empty discrete support: lower {lower} > upper {upper}")
            }
            SamplerError::Model { reason } => {
                write!(f, "Model evaluation failed: {reason}")
            }

            // ---- Run ----
            SamplerError::IncompleteChain { chain, expected, actual } => {
                write!(f, "Chain {chain} produced {actual} of {expected} retained draws")
            }
            SamplerError::Cancelled(partial) => {
                write!(
                    f,
                    "Sampling cancelled after {} retained draws across {} chains",
                    partial.total_draws(),
                    partial.chains.len()
                )
            }

            // ---- Warm start ----
            SamplerError::WarmStartFailed { reason } => {
                write!(f, "Warm start failed: {reason}")
            }
        }
    }
}

impl From<Error> for SamplerError {
    fn from(err: Error) -> Self {
        match err.downcast::<SamplerError>() {
            Ok(err) => err,
            Err(err) => match err.downcast::<ArgminError>() {
                Ok(argmin_err) => SamplerError::WarmStartFailed { reason: argmin_err.to_string() },
                Err(err) => SamplerError::WarmStartFailed { reason: err.to_string() },
            },
        }
    }
}

impl From<ChangePointError> for SamplerError {
    fn from(err: ChangePointError) -> Self {
        match err {
            ChangePointError::Sampling(inner) => inner,
            other => SamplerError::Model { reason: other.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<SamplerError> for pyo3::PyErr {
    fn from(err: SamplerError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // A `SamplerError` raised inside an argmin cost function survives the
    // round trip through `argmin::core::Error`.
    fn sampler_error_round_trips_through_argmin() {
        let boxed: Error = SamplerError::NonFiniteLogDensity { value: f64::INFINITY }.into();
        let back: SamplerError = boxed.into();
        assert_eq!(back, SamplerError::NonFiniteLogDensity { value: f64::INFINITY });
    }

    #[test]
    // Purpose
    // -------
    // Native argmin errors become `WarmStartFailed`.
    fn argmin_error_maps_to_warm_start_failed() {
        let boxed: Error = ArgminError::NotInitialized { text: "param".into() }.into();
        let back: SamplerError = boxed.into();
        assert!(matches!(back, SamplerError::WarmStartFailed { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Model errors keep their message.
    fn model_error_keeps_message() {
        let err: SamplerError = ChangePointError::InvalidSigma { value: -1.0 }.into();
        assert_eq!(
            err,
            SamplerError::Model {
                reason: "Noise scale sigma must be finite and > 0; got: -1".to_string()
            }
        );
    }
}
