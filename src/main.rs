use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use num_bigint::BigInt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use shamir_reconstruct::{reconstruct_from_source, FileSource, ReconstructOptions};

#[derive(Parser)]
#[command(name = "shamir-reconstruct")]
#[command(about = "Reconstruct Shamir secrets from base-encoded integer shares", long_about = None)]
struct Cli {
    /// JSON share files; one secret is reconstructed per file
    inputs: Vec<PathBuf>,

    /// Fail when the shares do not lie on a common integer polynomial
    #[arg(long)]
    strict: bool,

    /// Cross-check every window of k shares when more than k are supplied
    #[arg(long)]
    verify: bool,

    /// Override the threshold k declared in each input
    #[arg(long)]
    threshold: Option<usize>,

    /// Fail when the declared share count n differs from the supplied shares
    #[arg(long)]
    enforce_share_count: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> ReconstructOptions {
        ReconstructOptions {
            threshold: self.threshold,
            strict: self.strict,
            verify: self.verify,
            enforce_share_count: self.enforce_share_count,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.options();
    let mut failures = 0;

    // Inputs are independent: a bad file never stops the others
    for path in &cli.inputs {
        match solve(path, &options) {
            Ok(secret) => println!("Secret from {}: {}", path.display(), secret),
            Err(err) => {
                failures += 1;
                eprintln!("Error: {:#}", err);
            }
        }
    }

    if failures > 0 {
        log::info!("{} of {} inputs failed", failures, cli.inputs.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn solve(path: &Path, options: &ReconstructOptions) -> Result<BigInt> {
    let source = FileSource::new(path);
    let reconstruction = reconstruct_from_source(&source, options)
        .with_context(|| format!("failed to reconstruct secret from {}", path.display()))?;

    if !reconstruction.is_exact() {
        log::warn!("secret from {} is untrusted", path.display());
    }
    Ok(reconstruction.secret)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
