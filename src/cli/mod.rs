//! Command-line parsing for the bacterial growth curve analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the selection/fitting code.
//!
//! Every analysis flag can also come from a `GROWTH_*` environment variable
//! (a `.env` file in the working directory is loaded before parsing).

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::domain::{Criterion, DEFAULT_MAX_POINTS, DEFAULT_MIN_POINTS, DEFAULT_R2_THRESHOLD};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "growth", version, about = "Bacterial growth curve analyzer (exponential phase fit)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every replicate, print growth rates and doubling times, draw charts, export.
    Fit(FitArgs),
    /// Print the run summary table only (useful for scripting).
    Summary(FitArgs),
    /// Re-render charts from a results JSON written by `growth fit --export-json`.
    Plot(PlotArgs),
    /// Browse the fitted replicates in an interactive terminal viewer.
    View(FitArgs),
    /// Write a synthetic growth-curve CSV (logistic growth with lag and noise).
    Simulate(SimulateArgs),
}

/// Common options for fitting, summaries and the viewer.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Input CSV (time column followed by one OD column per replicate).
    ///
    /// When omitted, an interactive picker lists CSV files under the working directory.
    #[arg(short = 'f', long, value_name = "CSV", env = "GROWTH_FILE")]
    pub file: Option<PathBuf>,

    /// Start of the time window (inclusive). Unbounded when omitted.
    #[arg(long, env = "GROWTH_T_START", allow_negative_numbers = true)]
    pub t_start: Option<f64>,

    /// End of the time window (inclusive). Unbounded when omitted.
    #[arg(long, env = "GROWTH_T_END", allow_negative_numbers = true)]
    pub t_end: Option<f64>,

    /// Smallest number of consecutive points tried for the exponential phase.
    #[arg(long, env = "GROWTH_MIN_POINTS", default_value_t = DEFAULT_MIN_POINTS)]
    pub min_points: usize,

    /// Largest number of consecutive points tried for the exponential phase.
    #[arg(long, env = "GROWTH_MAX_POINTS", default_value_t = DEFAULT_MAX_POINTS)]
    pub max_points: usize,

    /// Use exactly N consecutive points (overrides --min-points/--max-points).
    #[arg(long, value_name = "N", env = "GROWTH_POINTS")]
    pub points: Option<usize>,

    /// A candidate sub-range must reach R² above this value.
    #[arg(long = "r2-threshold", env = "GROWTH_R2_THRESHOLD", default_value_t = DEFAULT_R2_THRESHOLD)]
    pub r2_threshold: f64,

    /// How to choose among eligible candidates.
    #[arg(long, value_enum, env = "GROWTH_CRITERION", default_value_t = Criterion::BestFit)]
    pub criterion: Criterion,

    /// Only analyse the named replicate column (repeatable).
    #[arg(long = "replicate", value_name = "NAME")]
    pub replicates: Vec<String>,

    /// Skip replicates that cannot be fitted instead of aborting the run.
    #[arg(long)]
    pub keep_going: bool,

    /// Time unit used in labels (`day`, `h`, `min`, ...).
    #[arg(long, env = "GROWTH_TIME_UNIT", default_value = "day")]
    pub time_unit: String,

    /// Do not render the per-replicate ASCII plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Directory for SVG charts.
    #[arg(long, env = "GROWTH_OUT_DIR", default_value = "growth_plots")]
    pub out_dir: PathBuf,

    /// Do not write SVG charts.
    #[arg(long)]
    pub no_svg: bool,

    /// Export per-replicate results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full run (samples, fits, settings, summary) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for plotting a saved run.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Results JSON file produced by `growth fit --export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,

    /// Only plot the named replicate (repeatable).
    #[arg(long = "replicate", value_name = "NAME")]
    pub replicates: Vec<String>,

    /// Also write SVG charts into this directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "simulated_growth.csv")]
    pub output: PathBuf,

    /// Number of replicate columns.
    #[arg(long, default_value_t = 3)]
    pub replicates: usize,

    /// Number of time points per replicate.
    #[arg(long, default_value_t = 25)]
    pub points: usize,

    /// Time between consecutive samples.
    #[arg(long, default_value_t = 0.5)]
    pub dt: f64,

    /// Initial OD (N0).
    #[arg(long, default_value_t = 0.05)]
    pub n0: f64,

    /// Carrying capacity (K, final OD).
    #[arg(long, default_value_t = 1.5)]
    pub capacity: f64,

    /// Intrinsic growth rate (r, per time unit).
    #[arg(long, default_value_t = 0.7)]
    pub rate: f64,

    /// Lag before growth starts (time units).
    #[arg(long, default_value_t = 2.0)]
    pub lag: f64,

    /// Log-normal noise sigma (0 disables noise).
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fit_args_parse_window_and_points() {
        let cli = Cli::try_parse_from([
            "growth",
            "fit",
            "-f",
            "data.csv",
            "--t-start",
            "2",
            "--t-end",
            "12.5",
            "--points",
            "4",
            "--criterion",
            "steepest",
            "--replicate",
            "R1",
            "--replicate",
            "R3",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.file, Some(PathBuf::from("data.csv")));
        assert_eq!(args.t_start, Some(2.0));
        assert_eq!(args.t_end, Some(12.5));
        assert_eq!(args.points, Some(4));
        assert_eq!(args.criterion, Criterion::Steepest);
        assert_eq!(args.replicates, vec!["R1".to_string(), "R3".to_string()]);
    }

    #[test]
    fn terminal_plots_are_on_unless_disabled() {
        fn no_plot(argv: &[&str]) -> bool {
            match Cli::try_parse_from(argv).unwrap().command {
                Command::Fit(args) => args.no_plot,
                other => panic!("unexpected command: {other:?}"),
            }
        }
        assert!(!no_plot(&["growth", "fit"]));
        assert!(no_plot(&["growth", "fit", "--no-plot"]));
        assert!(Cli::try_parse_from(["growth", "fit", "--plot"]).is_err());
    }

    #[test]
    fn verbose_flag_counts_occurrences() {
        let cli = Cli::try_parse_from(["growth", "-vv", "simulate"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
