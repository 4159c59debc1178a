//! Data sources other than user CSV files.

pub mod synthetic;
