//! Shared analysis pipeline used by the CLI, the exports and the TUI viewer.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> per-replicate phase selection -> fit -> summary
//!
//! Front-ends then focus on presentation (printing, files, widgets).

use crate::domain::{
    AnalysisConfig, Replicate, ReplicateAnalysis, SelectionConfig, SkippedReplicate, Window,
};
use crate::error::{AppError, GrowthError};
use crate::fit::{fit_growth_rate, select_exponential_phase};
use crate::io::ingest::{GrowthTable, load_growth_table};
use crate::report::{RunSummary, summarize};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub table: GrowthTable,
    pub analyses: Vec<ReplicateAnalysis>,
    pub skipped: Vec<SkippedReplicate>,
    pub summary: Option<RunSummary>,
}

/// Select the exponential phase of one replicate and fit it.
pub fn analyze_replicate(
    replicate: &Replicate,
    window: &Window,
    selection: &SelectionConfig,
) -> Result<ReplicateAnalysis, GrowthError> {
    let phase = select_exponential_phase(&replicate.samples, window, selection)?;
    let fit = fit_growth_rate(&phase.samples)?;

    log::debug!(
        "{}: r={:.6} td={:.4} R²={:.4} over t=[{}, {}]",
        replicate.name,
        fit.growth_rate,
        fit.doubling_time,
        fit.r_squared,
        fit.t_start(),
        fit.t_end()
    );

    Ok(ReplicateAnalysis {
        name: replicate.name.clone(),
        samples: replicate.samples.clone(),
        phase_start: phase.start,
        phase_end: phase.end,
        fit,
    })
}

/// Execute the full pipeline: load the CSV named in `config`, then analyse it.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let table = load_growth_table(&config.csv_path)?.select(&config.replicates)?;
    run_analysis_on_table(table, config)
}

/// Execute the pipeline on an already-ingested table.
pub fn run_analysis_on_table(table: GrowthTable, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    config.window.validate()?;
    config.selection.validate()?;

    let mut analyses = Vec::with_capacity(table.replicates.len());
    let mut skipped = Vec::new();

    for rep in &table.replicates {
        match analyze_replicate(rep, &config.window, &config.selection) {
            Ok(a) => analyses.push(a),
            Err(err) if config.keep_going => {
                log::warn!("skipping replicate {}: {err}", rep.name);
                skipped.push(SkippedReplicate {
                    name: rep.name.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(AppError::from(err).context(&rep.name)),
        }
    }

    if analyses.is_empty() {
        return Err(AppError::new(
            3,
            "No replicate could be fitted (see warnings above).",
        ));
    }

    let summary = summarize(&analyses);

    Ok(RunOutput {
        table,
        analyses,
        skipped,
        summary,
    })
}
