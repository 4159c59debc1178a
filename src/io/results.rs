//! Read/write run result JSON files.
//!
//! The results file is the portable representation of a run:
//! - run metadata (source, window, selection settings, timestamp)
//! - every replicate's samples and fit, so charts can be redrawn without refitting
//! - the cross-replicate summary
//!
//! The schema is defined by `ResultsFile`.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, ReplicateAnalysis, SelectionConfig, SkippedReplicate, Window};
use crate::error::AppError;
use crate::report::RunSummary;

/// A saved run (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub generated: String,
    pub source: String,
    pub time_label: String,
    pub time_unit: String,
    pub window: Window,
    pub selection: SelectionConfig,
    pub replicates: Vec<ReplicateAnalysis>,
    #[serde(default)]
    pub skipped: Vec<SkippedReplicate>,
    pub summary: Option<RunSummary>,
}

impl ResultsFile {
    pub fn from_run(run: &RunOutput, config: &AnalysisConfig) -> Self {
        Self {
            tool: "growth".to_string(),
            generated: chrono::Local::now().to_rfc3339(),
            source: config.csv_path.display().to_string(),
            time_label: run.table.time_label.clone(),
            time_unit: config.time_unit.clone(),
            window: config.window,
            selection: config.selection,
            replicates: run.analyses.clone(),
            skipped: run.skipped.clone(),
            summary: run.summary,
        }
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, run: &RunOutput, config: &AnalysisConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create results JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &ResultsFile::from_run(run, config))
        .map_err(|e| AppError::new(4, format!("Failed to write results JSON: {e}")))?;

    log::info!("wrote {}", path.display());
    Ok(())
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open results JSON '{}': {e}", path.display())))?;
    let results: ResultsFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid results JSON: {e}")))?;
    Ok(results)
}
