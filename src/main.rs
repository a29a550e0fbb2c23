mod batch;
mod cli;
mod driver;
mod encoder;
mod error;
mod model;
mod output;
mod reader;

use crate::error::Result;
use crate::output::Delimiter;
use clap::Parser;
use miette::IntoDiagnostic;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

/// Convert diploid genotype calls (AA/AT/TT) into numeric codes using each marker's REF/ALT alleles.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Input CSV whose first five columns are SNP, CHR, POS, REF, ALT, followed by one genotype column per sample.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    input: PathBuf,

    /// Output file. Only created once every marker has been converted.
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    output: PathBuf,

    /// Number of worker threads.
    #[arg(short, long, default_value_t = 60)]
    workers: usize,

    /// Number of markers per batch handed to a worker.
    #[arg(short, long, default_value_t = 5000)]
    batch_size: usize,

    /// Numeric encoding: "012" (0/1/2) or "-101" (-1/0/1). Unrecognized calls become -9.
    #[arg(short, long, default_value = "012", allow_hyphen_values = true)]
    format: String,

    /// Number of rows written to the output per write.
    #[arg(short, long, default_value_t = 1000)]
    chunk_size: usize,

    /// Output field delimiter.
    #[arg(long, value_enum, default_value_t = Delimiter::Comma)]
    output_delimiter: Delimiter,

    /// Quote every output field.
    #[arg(long)]
    quote_all: bool,

    /// Log filter, e.g. "info" or "hap2num=debug".
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = cli::build_config(&args)?;
    config.log_paths();

    cli::run(&config)?;
    Ok(())
}

fn main() -> miette::Result<()> {
    try_main().into_diagnostic()
}
