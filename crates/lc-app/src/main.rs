//! Command-line front end for the log file engine

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lc_data::{EngineConfig, LogFileEngine};

mod commands;

/// Inspect large CSV telemetry logs
#[derive(Parser, Debug)]
#[command(name = "logchart")]
#[command(about = "Inspect large CSV telemetry logs without loading them into memory", long_about = None)]
#[command(version)]
struct Args {
    /// Log file to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Engine configuration (JSON) overriding header detection rules
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the detected layout and the column list
    Info,

    /// Print one cell as text and as a number
    Cell {
        row: usize,
        col: usize,
    },

    /// Print a column as a forward-filled numeric series
    Series {
        /// Column name (display or raw)
        column: String,

        /// First row to print
        #[arg(long)]
        from: Option<usize>,

        /// Row after the last one to print
        #[arg(long)]
        to: Option<usize>,
    },

    /// List machine-state changes
    States {
        /// State column; detected from the column names if omitted
        #[arg(long)]
        column: Option<String>,

        /// State catalog (JSON object of id to name)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },

    /// Find the first row whose value matches `>N` or `N`
    Find {
        column: String,
        query: String,

        /// Row to start searching from
        #[arg(long, default_value_t = 0)]
        from: usize,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut engine = LogFileEngine::with_config(config);
    engine
        .load(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    info!("logchart v{}", env!("CARGO_PKG_VERSION"));

    let result = commands::run(&engine, &args.command);
    engine.release();
    result
}
