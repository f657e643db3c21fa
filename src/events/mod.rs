//! events — event catalog and break-date correlation.

pub mod catalog;
pub mod correlate;

pub use self::catalog::Event;
pub use self::correlate::{
    CorrelationResult, CorrelationWindow, DEFAULT_WINDOW_DAYS, correlate,
};
