// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the concepts
// of the pipeline. Nothing here touches the filesystem.
//
//   record.rs  — RawRecord (as loaded) and Record (canonical)
//   dataset.rs — per-dataset configuration as plain data
//   fold.rs    — Pool and the per-rotation FoldAssignment
//   traits.rs  — RecordSource, the loader abstraction
//   error.rs   — failures that abort a dataset run
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod record;

pub mod dataset;

pub mod fold;

pub mod traits;

pub mod error;
