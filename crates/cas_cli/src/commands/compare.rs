//! compare subcommand.

use anyhow::{Context, Result};
use cas_equiv::EquivConfig;
use clap::Args;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First answer
    pub a: String,

    /// Second answer
    pub b: String,

    /// Relative tolerance for numeric comparisons (overrides config)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Never call the language-model oracle
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub async fn run(args: CompareArgs, mut config: EquivConfig) -> Result<()> {
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    config.validate().context("invalid options")?;

    let engine = super::build_engine(config, args.offline)?;
    let result = engine.compare(&args.a, &args.b).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result);
    }
    Ok(())
}
