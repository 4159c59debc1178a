//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initialises logging
//! - runs phase selection + fitting per replicate
//! - prints reports/plots
//! - writes charts and optional exports

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs, SimulateArgs};
use crate::data::synthetic::{SimulationConfig, write_simulated_csv};
use crate::domain::{AnalysisConfig, SelectionConfig, Window};
use crate::error::AppError;
use crate::plot::ChartLabels;

pub mod pipeline;

/// Entry point for the `growth` binary.
pub fn run() -> Result<(), AppError> {
    // Environment defaults for the `GROWTH_*` flags may live in `.env`.
    dotenvy::dotenv().ok();

    // We want `growth -f data.csv` to behave like `growth fit -f data.csv`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args, OutputMode::Full),
        Command::Summary(args) => handle_fit(args, OutputMode::SummaryOnly),
        Command::Plot(args) => handle_plot(args),
        Command::View(args) => handle_view(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    SummaryOnly,
}

/// `RUST_LOG` wins; otherwise `-v` raises the default `warn` level.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn handle_fit(args: FitArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));

    match mode {
        OutputMode::Full => {
            print!("{}", crate::report::format_results(&run, &config.time_unit));
        }
        OutputMode::SummaryOnly => {
            if let Some(summary) = &run.summary {
                print!("{}", crate::report::format_overall(summary, &config.time_unit));
            }
            return Ok(());
        }
    }

    if config.plot {
        for a in &run.analyses {
            println!();
            print!("{}", crate::plot::render_ascii_plot(a, config.plot_width, config.plot_height));
        }
    }

    if let Some(dir) = &config.svg_dir {
        let labels = ChartLabels {
            time_unit: config.time_unit.clone(),
        };
        let written = crate::plot::write_svg_charts(dir, &run.analyses, &labels)?;
        println!("\nWrote {} chart(s) to {}", written.len(), dir.display());
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.analyses)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::results::write_results_json(path, &run, &config)?;
    }

    Ok(())
}

fn handle_view(args: FitArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;
    crate::tui::run(run, &config)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let results = crate::io::results::read_results_json(&args.results)?;

    let analyses: Vec<_> = if args.replicates.is_empty() {
        results.replicates.clone()
    } else {
        let mut picked = Vec::with_capacity(args.replicates.len());
        for name in &args.replicates {
            let found = results
                .replicates
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!("Replicate '{name}' not found in {}.", args.results.display()),
                    )
                })?;
            picked.push(found.clone());
        }
        picked
    };

    println!(
        "Results: {} (generated {}, source {})",
        args.results.display(),
        results.generated,
        results.source
    );
    for a in &analyses {
        println!("{}", crate::report::format_replicate_line(a, &results.time_unit));
    }
    if let Some(summary) = results.summary.as_ref().filter(|_| args.replicates.is_empty()) {
        println!();
        print!("{}", crate::report::format_overall(summary, &results.time_unit));
    }

    for a in &analyses {
        println!();
        print!("{}", crate::plot::render_ascii_plot(a, args.width, args.height));
    }

    if let Some(dir) = &args.out_dir {
        let labels = ChartLabels {
            time_unit: results.time_unit.clone(),
        };
        let written = crate::plot::write_svg_charts(dir, &analyses, &labels)?;
        println!("\nWrote {} chart(s) to {}", written.len(), dir.display());
    }

    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = simulation_config_from_args(&args);
    let replicates = write_simulated_csv(&args.output, &config)?;
    println!(
        "Wrote {} replicate(s) x {} point(s) to {}",
        replicates.len(),
        config.points,
        args.output.display()
    );
    Ok(())
}

/// Build and validate the run configuration.
///
/// Resolves the input CSV (interactive picker when `-f` is absent) and checks the
/// window and selection settings before any file is read.
pub fn analysis_config_from_args(args: &FitArgs) -> Result<AnalysisConfig, AppError> {
    let window = Window {
        start: args.t_start,
        end: args.t_end,
    };
    window.validate()?;

    let (min_points, max_points) = match args.points {
        Some(n) => (n, n),
        None => (args.min_points, args.max_points),
    };
    let selection = SelectionConfig::new(min_points, max_points)
        .with_threshold(args.r2_threshold)
        .with_criterion(args.criterion);
    selection.validate()?;

    let csv_path = crate::cli::picker::resolve_csv_path(args.file.as_deref())?;

    Ok(AnalysisConfig {
        csv_path,
        window,
        selection,
        replicates: args.replicates.clone(),
        keep_going: args.keep_going,
        time_unit: args.time_unit.clone(),
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg_dir: (!args.no_svg).then(|| args.out_dir.clone()),
        export_results: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}

pub fn simulation_config_from_args(args: &SimulateArgs) -> SimulationConfig {
    SimulationConfig {
        replicates: args.replicates,
        points: args.points,
        dt: args.dt,
        n0: args.n0,
        capacity: args.capacity,
        rate: args.rate,
        lag: args.lag,
        noise_sigma: args.noise,
        seed: args.seed,
    }
}

/// Rewrite argv so bare flags default to `growth fit`.
///
/// Rules:
/// - `growth`                         -> `growth fit` (picker)
/// - `growth -f data.csv ...`         -> `growth fit -f data.csv ...`
/// - `growth --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "summary" | "plot" | "view" | "simulate");
    if is_subcommand {
        return argv;
    }

    // `-v`/`-vv` are global; look past them for the subcommand.
    if arg1.starts_with('-') {
        let first_positional = argv.iter().skip(1).find(|a| !is_verbose_flag(a));
        let has_subcommand = first_positional
            .is_some_and(|a| matches!(a.as_str(), "fit" | "summary" | "plot" | "view" | "simulate"));
        if !has_subcommand {
            argv.insert(1, "fit".to_string());
        }
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

fn is_verbose_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
