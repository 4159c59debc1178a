//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the selection/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, Criterion, ReplicateAnalysis};
use crate::report::{MetricSummary, RunSummary};

/// One line per replicate, e.g.
/// `R1 - Growth rate: 0.6931 per day, Doubling time: 1.00 days, R²: 1.00`.
pub fn format_replicate_line(a: &ReplicateAnalysis, time_unit: &str) -> String {
    format!(
        "{} - Growth rate: {:.4} per {time_unit}, Doubling time: {:.2} {}, R²: {:.2}",
        a.name,
        a.fit.growth_rate,
        a.fit.doubling_time,
        plural(time_unit),
        a.fit.r_squared
    )
}

/// Format the run header plus the per-replicate table.
pub fn format_run_summary(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();

    out.push_str("=== growth - exponential phase fit ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Rows: {} read | {} skipped cell(s)/row(s) | replicates: {}\n",
        run.table.rows_read,
        run.table.row_errors.len(),
        run.table.replicates.len()
    ));
    out.push_str(&format!(
        "Window ({}): {} | points: {}..={} | R² > {:.2} | criterion: {}\n",
        run.table.time_label,
        config.window.label(),
        config.selection.min_points,
        config.selection.max_points,
        config.selection.r_squared_threshold,
        criterion_name(config.selection.criterion),
    ));
    out.push('\n');

    out.push_str(&format_table(&run.analyses, &config.time_unit));

    for s in &run.skipped {
        out.push_str(&format!("  (skipped {}) {}\n", s.name, s.reason));
    }
    out.push('\n');

    out
}

/// Per-replicate lines followed by the overall block.
pub fn format_results(run: &RunOutput, time_unit: &str) -> String {
    let mut out = String::new();
    for a in &run.analyses {
        out.push_str(&format_replicate_line(a, time_unit));
        out.push('\n');
    }
    if let Some(summary) = &run.summary {
        out.push('\n');
        out.push_str(&format_overall(summary, time_unit));
    }
    out
}

/// The "Overall Results" block (mean and SD across replicates).
pub fn format_overall(summary: &RunSummary, time_unit: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Overall Results (n={}):\n", summary.n));
    out.push_str(&format!(
        "Mean Growth Rate: {:.4} per {time_unit}, SD: {}\n",
        summary.growth_rate.mean,
        fmt_sd(&summary.growth_rate, 4)
    ));
    out.push_str(&format!(
        "Mean Doubling Time: {:.2} {}, SD: {}\n",
        summary.doubling_time.mean,
        plural(time_unit),
        fmt_sd(&summary.doubling_time, 2)
    ));
    out.push_str(&format!(
        "Mean R²: {:.2}, SD: {}\n",
        summary.r_squared.mean,
        fmt_sd(&summary.r_squared, 2)
    ));
    out
}

fn format_table(rows: &[ReplicateAnalysis], time_unit: &str) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:>4} {:>9} {:>9} {:>10} {:>10} {:>8} {:>8}",
            "replicate", "n", "t_start", "t_end", "rate", "doubling", "od0", "R²"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<20} {:-<4} {:-<9} {:-<9} {:-<10} {:-<10} {:-<8} {:-<8}",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for a in rows {
        let f = &a.fit;
        out.push_str(
            format!(
                "{:<20} {:>4} {:>9.3} {:>9.3} {:>10.4} {:>10.3} {:>8.4} {:>8.4}",
                truncate(&a.name, 20),
                f.n(),
                f.t_start(),
                f.t_end(),
                f.growth_rate,
                f.doubling_time,
                f.od0(),
                f.r_squared,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format!("(rate per {time_unit}, doubling time in {})\n", plural(time_unit)));

    out
}

fn fmt_sd(m: &MetricSummary, decimals: usize) -> String {
    match m.sd {
        Some(sd) => format!("{sd:.decimals$}"),
        None => "n/a".to_string(),
    }
}

pub(crate) fn criterion_name(c: Criterion) -> &'static str {
    match c {
        Criterion::BestFit => "best-fit",
        Criterion::Steepest => "steepest",
    }
}

/// `day` -> `days`, `h` stays `h`.
pub(crate) fn plural(unit: &str) -> String {
    if unit.len() <= 1 || unit.ends_with('s') {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::summarize;
    use crate::report::tests::analysis;

    #[test]
    fn replicate_line_matches_lab_format() {
        let a = analysis("Replicate1", std::f64::consts::LN_2, 1.0);
        assert_eq!(
            format_replicate_line(&a, "day"),
            "Replicate1 - Growth rate: 0.6931 per day, Doubling time: 1.00 days, R²: 1.00"
        );
    }

    #[test]
    fn overall_block_marks_missing_sd() {
        let s = summarize(&[analysis("A", 0.5, 0.98)]).unwrap();
        let txt = format_overall(&s, "h");
        assert!(txt.contains("Mean Growth Rate: 0.5000 per h, SD: n/a"));
        assert!(txt.contains("Mean Doubling Time: 1.39 h, SD: n/a"));
    }

    #[test]
    fn overall_block_with_sd() {
        let s = summarize(&[analysis("A", 0.5, 0.9), analysis("B", 0.7, 1.0)]).unwrap();
        let txt = format_overall(&s, "day");
        assert!(txt.starts_with("Overall Results (n=2):\n"));
        assert!(txt.contains("Mean Growth Rate: 0.6000 per day, SD: 0.1414"));
        assert!(txt.contains("Mean R²: 0.95, SD: 0.07"));
    }

    #[test]
    fn truncate_marks_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
