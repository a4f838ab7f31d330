// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Orchestrates one dataset run, strictly in order:
//
//   Step 1: Load raw rows             (Layer 4 - data::loader)
//   Step 2: Normalise records         (Layer 4 - data::normalizer)
//   Step 3: Refuse an empty corpus
//   Step 4: Dedup / shuffle / split   (Layer 4 - data::splitter)
//   Step 5: Write k fold rotations    (Layer 6 - infra::pool_writer)
//
// Everything up to step 5 happens in memory, so a dataset that
// fails (missing file, missing column, too few records) never
// touches its output directory.
//
// run_batch() runs several datasets one after another. A failed
// dataset is reported and skipped; the others still run.

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::data::{
    loader::loader_for,
    normalizer::{NormalizeReport, Normalizer},
    splitter::Splitter,
};
use crate::domain::dataset::DatasetConfig;
use crate::domain::error::PrepareError;
use crate::infra::{config_store::ConfigStore, pool_writer::PoolWriter};

// ─── Run Options ─────────────────────────────────────────────────────────────
// Settings shared by every dataset of one invocation. `folds` and
// `seed` override the per-dataset values when set.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub output_base: PathBuf,
    pub folds:       Option<usize>,
    pub seed:        Option<u64>,
    pub dry_run:     bool,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            output_base: PathBuf::from("data"),
            folds:       None,
            seed:        None,
            dry_run:     false,
        }
    }
}

// ─── Run Report ──────────────────────────────────────────────────────────────
/// What happened to one dataset, for logging and the CLI summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dataset:            String,
    pub rows_loaded:        usize,
    pub malformed_rows:     usize,
    pub normalize:          NormalizeReport,
    pub duplicates_removed: usize,
    pub unique_records:     usize,
    pub folds:              usize,
    pub seed:               u64,
    pub fold_sizes:         Vec<usize>,
    /// `None` on a dry run
    pub output_root:        Option<PathBuf>,
}

impl RunReport {
    pub fn summary_line(&self) -> String {
        let target = match &self.output_root {
            Some(root) => format!("written to '{}'", root.display()),
            None       => "dry run, nothing written".to_string(),
        };
        format!(
            "{}: {} rows, {} malformed, {} rejected, {} duplicates, {} unique in {} folds {:?} ({})",
            self.dataset,
            self.rows_loaded,
            self.malformed_rows,
            self.normalize.rejected(),
            self.duplicates_removed,
            self.unique_records,
            self.folds,
            self.fold_sizes,
            target,
        )
    }
}

// ─── PrepareUseCase ──────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config:  DatasetConfig,
    options: PrepareOptions,
}

impl PrepareUseCase {
    /// Apply the run-wide overrides and re-validate the config.
    pub fn new(mut config: DatasetConfig, options: PrepareOptions) -> Result<Self> {
        if let Some(folds) = options.folds {
            config.folds = folds;
        }
        if let Some(seed) = options.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(Self { config, options })
    }

    /// Run the full pipeline for this dataset.
    pub fn execute(&self) -> Result<RunReport> {
        let cfg = &self.config;
        tracing::info!("Preparing '{}'", cfg.name);

        // ── Step 1: Load raw rows ────────────────────────────────────────────
        let rows = loader_for(cfg).load_all()?;
        tracing::info!(
            "Loaded {} rows ({} malformed rows skipped)",
            rows.records.len(),
            rows.malformed
        );

        // ── Step 2: Normalise ────────────────────────────────────────────────
        let normalizer          = Normalizer::from_config(cfg);
        let (records, nreport)  = normalizer.normalize_all(&rows.records);
        tracing::info!(
            "{} records accepted, {} rejected \
             (missing text {}, missing label {}, invalid label {}, unmapped {}, disallowed {})",
            nreport.accepted,
            nreport.rejected(),
            nreport.missing_text,
            nreport.missing_label,
            nreport.invalid_label,
            nreport.unmapped_dropped,
            nreport.disallowed,
        );

        // ── Step 3: Nothing to split is fatal ────────────────────────────────
        if records.is_empty() {
            return Err(PrepareError::EmptyCorpus { dataset: cfg.name.clone() }.into());
        }

        // ── Step 4: Dedup, shuffle, split ────────────────────────────────────
        let splitter  = Splitter::new(cfg.folds, cfg.seed)?;
        let partition = splitter.split(records)?;

        // ── Step 5: Write pools ──────────────────────────────────────────────
        let output_root = if self.options.dry_run {
            tracing::info!("Dry run: skipping output for '{}'", cfg.name);
            None
        } else {
            let writer = PoolWriter::new(cfg.text_field);
            let root   = writer.write_partition(&self.options.output_base, &cfg.name, &partition)?;
            tracing::info!("{} folds written to '{}'", cfg.folds, root.display());
            Some(root)
        };

        Ok(RunReport {
            dataset:            cfg.name.clone(),
            rows_loaded:        rows.records.len(),
            malformed_rows:     rows.malformed,
            normalize:          nreport,
            duplicates_removed: partition.duplicates_removed(),
            unique_records:     partition.unique_records(),
            folds:              cfg.folds,
            seed:               cfg.seed,
            fold_sizes:         partition.fold_sizes(),
            output_root,
        })
    }
}

// ─── Batch Runs ──────────────────────────────────────────────────────────────

/// Results of running several dataset configs.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<RunReport>,
    /// (config path, error)
    pub failed:    Vec<(PathBuf, anyhow::Error)>,
}

/// Machine-readable form of a BatchOutcome.
#[derive(Debug, Serialize)]
struct BatchSummary<'a> {
    succeeded: &'a [RunReport],
    failed:    Vec<FailedRun<'a>>,
}

#[derive(Debug, Serialize)]
struct FailedRun<'a> {
    config: &'a Path,
    error:  String,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Pretty JSON with every report and every failure message.
    pub fn to_json(&self) -> Result<String> {
        let summary = BatchSummary {
            succeeded: &self.succeeded,
            failed:    self
                .failed
                .iter()
                .map(|(path, e)| FailedRun { config: path, error: format!("{e:#}") })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&summary)?)
    }
}

fn run_one(config_path: &Path, options: &PrepareOptions) -> Result<RunReport> {
    let config = ConfigStore::load(config_path)?;
    PrepareUseCase::new(config, options.clone())?.execute()
}

/// Run every config in order. A failure aborts only its own dataset.
pub fn run_batch(config_paths: &[PathBuf], options: &PrepareOptions) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for path in config_paths {
        match run_one(path, options) {
            Ok(report) => outcome.succeeded.push(report),
            Err(e) => {
                tracing::error!("Dataset '{}' failed: {:#}", path.display(), e);
                outcome.failed.push((path.clone(), e));
            }
        }
    }

    outcome
}
