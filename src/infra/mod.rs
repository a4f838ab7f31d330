// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// The filesystem edges of the pipeline:
//
//   config_store.rs — Reads per-dataset JSON configs and
//                     resolves their input paths relative to
//                     the config file.
//
//   pool_writer.rs  — Writes train/valid/test pools as JSON
//                     Lines under <base>/<Dataset>/few_shot/NN/,
//                     swapping the whole tree into place only
//                     once every file is written.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Dataset config loading
pub mod config_store;

/// Fold pool serialisation
pub mod pool_writer;
