// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application).
//
//   corpus-folds prepare --config <FILE>... [--output-base DIR]
//                        [--folds K] [--seed S] [--dry-run]
//                        [--report-json FILE]
//
// Every config is attempted even when an earlier one fails; the
// process exits non-zero if any dataset failed.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Context, Result};
use std::fs;
use clap::Parser;
use commands::{Commands, PrepareArgs};

use crate::application::prepare_use_case::{run_batch, PrepareOptions};

#[derive(Parser, Debug)]
#[command(
    name = "corpus-folds",
    version = "0.1.0",
    about = "Normalise labelled text corpora and split them into k-fold train/valid/test pools."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(&args),
        }
    }
}

fn run_prepare(args: &PrepareArgs) -> Result<()> {
    let options = PrepareOptions::from(args);
    tracing::info!(
        "Preparing {} dataset(s) into '{}'",
        args.configs.len(),
        options.output_base.display()
    );

    let outcome = run_batch(&args.configs, &options);

    for report in &outcome.succeeded {
        println!("ok     {}", report.summary_line());
    }
    for (path, err) in &outcome.failed {
        println!("failed {}: {:#}", path.display(), err);
    }
    println!(
        "\n{} succeeded, {} failed",
        outcome.succeeded.len(),
        outcome.failed.len()
    );

    if let Some(path) = &args.report_json {
        fs::write(path, outcome.to_json()?)
            .with_context(|| format!("Cannot write report '{}'", path.display()))?;
        tracing::info!("Report written to '{}'", path.display());
    }

    if !outcome.all_succeeded() {
        bail!(
            "{} of {} dataset(s) failed",
            outcome.failed.len(),
            args.configs.len()
        );
    }
    Ok(())
}
