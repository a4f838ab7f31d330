// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Failures that abort a whole dataset run. Row-level problems
// (bad lines, empty cells, unknown labels) are never errors.
// They are counted in reports and the row is dropped.
//
// These travel inside anyhow::Error through the application
// layer; callers that care can downcast_ref::<PrepareError>().

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("input file '{}' was not found", path.display())]
    MissingSource { path: PathBuf },

    #[error("column '{column}' not found in '{}' (columns found: {found:?})", path.display())]
    MissingColumn {
        path:   PathBuf,
        column: String,
        found:  Vec<String>,
    },

    #[error("invalid dataset configuration: {0}")]
    InvalidConfig(String),

    #[error("dataset '{dataset}' produced no valid records")]
    EmptyCorpus { dataset: String },

    #[error("only {records} unique records remain, cannot build {folds} non-empty folds")]
    TooFewRecords { records: usize, folds: usize },
}
