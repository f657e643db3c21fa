//! sampling::types — shared numeric aliases for the sampler.
//!
//! The continuous block and its gradient are plain `ndarray` vectors; each
//! chain owns one `Xoshiro256PlusPlus` stream derived from the run seed.
use argmin::solver::{linesearch::MoreThuenteLineSearch, quasinewton::LBFGS};
use ndarray::Array1;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Unconstrained continuous parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient `∇_θ log π(τ, θ)`.
pub type Grad = Array1<f64>;

/// Scalar cost `-log π` seen by the warm-start optimizer.
pub type Cost = f64;

/// Per-chain random stream.
pub type ChainRng = Xoshiro256PlusPlus;

/// Default L-BFGS history size for the warm start.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// More–Thuente line search on the sampler's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS with More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
