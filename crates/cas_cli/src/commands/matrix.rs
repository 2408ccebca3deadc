//! matrix subcommand: pairwise verdicts over a list of answers.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cas_equiv::{equivalence_matrix, EquivConfig, EquivalenceMatrix, Verdict};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct MatrixArgs {
    /// File with one answer per line (stdin when omitted)
    pub file: Option<PathBuf>,

    /// Maximum comparisons in flight (overrides config)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Never call the language-model oracle
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Print the matrix as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Serialize)]
struct MatrixOutput<'a> {
    answers: &'a [String],
    matrix: Vec<&'a [Verdict]>,
}

pub async fn run(args: MatrixArgs, mut config: EquivConfig) -> Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.matrix_concurrency = concurrency;
    }
    config.validate().context("invalid options")?;

    let input = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    let answers: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let concurrency = config.matrix_concurrency;
    let engine = super::build_engine(config, args.offline)?;
    let matrix = equivalence_matrix(&engine, &answers, concurrency).await;

    if args.json {
        let output = MatrixOutput {
            answers: &answers,
            matrix: matrix.rows().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_text(&answers, &matrix));
    }
    Ok(())
}

fn symbol(verdict: Verdict) -> char {
    match verdict {
        Verdict::Equal => 'E',
        Verdict::Unequal => 'U',
        Verdict::Inconclusive => '?',
    }
}

fn render_text(answers: &[String], matrix: &EquivalenceMatrix) -> String {
    let mut out = String::new();
    for (i, row) in matrix.rows().enumerate().take(matrix.size()) {
        let cells: Vec<String> = row.iter().map(|v| symbol(*v).to_string()).collect();
        out.push_str(&format!("{:>3}  {}  {}\n", i, cells.join(" "), answers[i]));
    }
    out
}
