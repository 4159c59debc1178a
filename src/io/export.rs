//! Export per-replicate results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ReplicateAnalysis;
use crate::error::AppError;

const HEADER: [&str; 10] = [
    "replicate",
    "n",
    "t_start",
    "t_end",
    "growth_rate",
    "intercept",
    "od0",
    "doubling_time",
    "r_squared",
    "rmse",
];

/// Write per-replicate results to a CSV file.
pub fn write_results_csv(path: &Path, analyses: &[ReplicateAnalysis]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, analyses)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Write per-replicate results as CSV to any writer.
pub fn write_results<W: Write>(writer: W, analyses: &[ReplicateAnalysis]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(HEADER)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for a in analyses {
        let f = &a.fit;
        wtr.write_record([
            a.name.clone(),
            f.n().to_string(),
            format!("{:.6}", f.t_start()),
            format!("{:.6}", f.t_end()),
            format!("{:.10}", f.growth_rate),
            format!("{:.10}", f.intercept),
            format!("{:.10}", f.od0()),
            format!("{:.10}", f.doubling_time),
            format!("{:.10}", f.r_squared),
            format!("{:.10}", f.rmse),
        ])
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }

    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}
