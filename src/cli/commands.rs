// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `prepare` subcommand and its flags.
//
// Values given here override the same settings inside each
// dataset config for the whole run.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::prepare_use_case::PrepareOptions;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build k-fold train/valid/test pools for one or more datasets
    Prepare(PrepareArgs),
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// Dataset config file (JSON). Repeat to prepare several datasets.
    #[arg(long = "config", short = 'c', required = true, num_args = 1..)]
    pub configs: Vec<PathBuf>,

    /// Root directory; pools go to <output-base>/<Dataset>/few_shot/NN/
    #[arg(long, default_value = "data")]
    pub output_base: PathBuf,

    /// Number of folds (at least 3). Overrides every config.
    #[arg(long)]
    pub folds: Option<usize>,

    /// Shuffle seed. Overrides every config.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run the whole pipeline but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Also write every dataset report (and failure) to this JSON file
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,
}

/// Layer 1 → Layer 2 boundary: the use case never sees clap types.
impl From<&PrepareArgs> for PrepareOptions {
    fn from(a: &PrepareArgs) -> Self {
        PrepareOptions {
            output_base: a.output_base.clone(),
            folds:       a.folds,
            seed:        a.seed,
            dry_run:     a.dry_run,
        }
    }
}
