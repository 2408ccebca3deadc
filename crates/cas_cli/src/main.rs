//! `cas-equiv`: normalize, extract and compare mathematical answers.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::compare::CompareArgs;
use commands::matrix::MatrixArgs;
use commands::text::{ExtractArgs, NormalizeArgs};

#[derive(Parser, Debug)]
#[command(name = "cas-equiv", version, about = "Decide whether two math answers are equivalent")]
struct Cli {
    /// TOML config file (default: ./cas_equiv.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the normalized form of an answer
    Normalize(NormalizeArgs),
    /// Print the final answer extracted from verbose text
    Extract(ExtractArgs),
    /// Compare two answers and print the verdict with its trail
    Compare(CompareArgs),
    /// Pairwise equivalence matrix over answers, one per line
    Matrix(MatrixArgs),
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Normalize(args) => commands::text::normalize(args),
        Commands::Extract(args) => commands::text::extract(args),
        Commands::Compare(args) => {
            let config = config::load(cli.config.as_deref())?;
            commands::compare::run(args, config).await
        }
        Commands::Matrix(args) => {
            let config = config::load(cli.config.as_deref())?;
            commands::matrix::run(args, config).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
