//! Chart rendering: ASCII for the terminal, SVG files for reports.

pub mod ascii;
pub mod svg;

pub use ascii::*;
pub use svg::*;
