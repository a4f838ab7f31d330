// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a raw source file and k fold rotations.
//
// The pipeline flows in this order:
//
//   source files (.csv / .tsv / .jsonl)
//       │
//       ▼
//   Loader            → ordered RawRecords + malformed-row count
//       │
//       ▼
//   Normalizer        → canonical Records + NormalizeReport
//       │               (uses Preprocessor when cleanup is on)
//       ▼
//   Splitter          → dedup, seeded shuffle, k balanced folds
//       │
//       ▼
//   Partition         → k FoldAssignments (train / valid / test)
//
// Writing the pools to disk belongs to the infra layer.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads CSV/TSV and JSON Lines sources
pub mod loader;

/// Optional whitespace and control-character cleanup
pub mod preprocessor;

/// Maps raw rows to canonical records and counts rejections
pub mod normalizer;

/// Deduplicates, shuffles and splits into k folds
pub mod splitter;
