mod render;

use clap::{ArgAction, Parser, ValueEnum};
use lazor_core::solver::entropy_seed;
use lazor_core::{LazorError, Puzzle, Solver, SolverConfig, StrategyChoice};
use render::Report;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use thiserror::Error;

/// Solve laser lattice puzzles
#[derive(Parser, Debug)]
#[command(name = "lazor", version, about)]
struct Cli {
    /// Puzzle file in .bff format
    puzzle: PathBuf,

    /// Candidate policy to search with
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Seed for candidate selection
    #[arg(long)]
    seed: Option<u64>,

    /// Iterations allowed per strategy run
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Step ceiling for a single ray trace
    #[arg(long)]
    trace_step_limit: Option<usize>,

    /// JSON solver configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the report next to the puzzle as <name>_solution.bff
    #[arg(long)]
    save: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Auto,
    Heuristic,
    Exhaustive,
}

impl From<StrategyArg> for StrategyChoice {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => StrategyChoice::Auto,
            StrategyArg::Heuristic => StrategyChoice::Heuristic,
            StrategyArg::Exhaustive => StrategyChoice::Exhaustive,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Lazor(#[from] LazorError),

    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// `-v` sets the level; `RUST_LOG` refines or overrides it
fn init_logging(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(verbosity_level(verbose))
        .parse_default_env()
        .init();
}

fn verbosity_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Returns whether the puzzle was solved.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let config = solver_config(cli)?;
    let puzzle = Puzzle::load(&cli.puzzle)?;

    // Fix the seed up front so the report can name it even without a solution.
    let seed = config.seed.unwrap_or_else(entropy_seed);
    let solver = Solver::with_config(SolverConfig {
        seed: Some(seed),
        ..config
    });

    let start = Instant::now();
    let outcome = solver.solve(&puzzle)?;
    let elapsed = start.elapsed();
    log::info!("search finished in {:?}: {:?}", elapsed, outcome.stats());

    let report = Report::new(&cli.puzzle.display().to_string(), &outcome, seed, elapsed);
    let body = if cli.json {
        let mut json = serde_json::to_string_pretty(&report)?;
        json.push('\n');
        json
    } else {
        report.to_string()
    };

    match &cli.output {
        Some(path) => write_file(path, &body)?,
        None => print!("{}", body),
    }
    if cli.save && report.solved {
        let path = solution_path(&cli.puzzle);
        write_file(&path, &body)?;
        log::info!("saved solution to {}", path.display());
    }

    Ok(report.solved)
}

/// Config file first, then flags on top.
fn solver_config(cli: &Cli) -> Result<SolverConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(LazorError::from)?;
            serde_json::from_str(&text).map_err(|source| CliError::Config {
                path: path.clone(),
                source,
            })?
        }
        None => SolverConfig::default(),
    };

    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.max_iterations.is_some() {
        config.max_iterations = cli.max_iterations;
    }
    if cli.trace_step_limit.is_some() {
        config.trace_step_limit = cli.trace_step_limit;
    }
    Ok(config)
}

/// `puzzles/mad_1.bff` -> `puzzles/mad_1_solution.bff`
fn solution_path(puzzle: &Path) -> PathBuf {
    let stem = puzzle
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "puzzle".to_string());
    puzzle.with_file_name(format!("{}_solution.bff", stem))
}

fn write_file(path: &Path, body: &str) -> Result<(), CliError> {
    std::fs::write(path, body).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
