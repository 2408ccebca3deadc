//! normalize / extract subcommands.

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Answer to normalize
    pub answer: String,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Verbose text containing a final answer
    pub text: String,

    /// Normalize the extracted answer as well
    #[arg(long, default_value_t = false)]
    pub normalize: bool,
}

pub fn normalize(args: NormalizeArgs) -> Result<()> {
    println!("{}", cas_equiv::normalize(&args.answer));
    Ok(())
}

pub fn extract(args: ExtractArgs) -> Result<()> {
    let answer = cas_equiv::extract_answer(&args.text);
    if args.normalize {
        println!("{}", cas_equiv::normalize(&answer));
    } else {
        println!("{}", answer);
    }
    Ok(())
}
