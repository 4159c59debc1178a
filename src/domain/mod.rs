//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations (`Sample`, `Replicate`)
//! - run configuration (`Window`, `SelectionConfig`, `AnalysisConfig`)
//! - fit outputs (`Subrange`, `FitResult`, `ReplicateAnalysis`)

pub mod types;

pub use types::*;
