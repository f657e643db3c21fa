//! warm_start — L-BFGS search for a high-density starting point.

pub mod adapter;
pub mod run;

pub use self::adapter::ConditionalMode;
pub use self::run::{WarmStart, best_discrete, find_mode, optimize_continuous};
