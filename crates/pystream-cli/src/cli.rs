use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pystream", version, about = "Gridded STREAM rainfall-runoff model")]
pub struct Cli {
    /// Log every simulated month and year
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate a basin described by a TOML file and write the monthly report
    Run {
        /// Simulation configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Report CSV, overriding `[output].path`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate every input without simulating
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Score a simulated discharge series against observations
    Score {
        #[arg(long)]
        simulated: PathBuf,

        #[arg(long)]
        observed: PathBuf,

        /// Months skipped at the start of both series
        #[arg(long, default_value_t = 6)]
        warmup: usize,

        /// nse, log-nse, kge, pbias, rmse or mae
        #[arg(long, default_value = "nse")]
        metric: String,

        /// Column of the simulated file (default: `gauge_flow` if present,
        /// else the last one)
        #[arg(long)]
        simulated_column: Option<String>,

        /// Column of the observed file (default: the last one)
        #[arg(long)]
        observed_column: Option<String>,
    },
}
