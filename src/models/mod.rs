//! Exponential growth model.
//!
//! Implemented as small, pure functions so selection/fitting and plotting code
//! can share them.

pub mod model;

pub use model::*;
