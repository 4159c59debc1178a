//! Exponential-phase detection and growth-rate fitting.
//!
//! Responsibilities:
//!
//! - enumerate candidate runs of consecutive samples inside the window
//! - score each run by a log-linear regression and select the phase
//! - fit the selected phase and derive growth rate and doubling time

pub mod candidates;
pub mod fitter;
pub mod selection;

pub use candidates::*;
pub use fitter::*;
pub use selection::*;
