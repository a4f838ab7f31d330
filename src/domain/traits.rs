// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Every dataset used to ship its own loading function: CSV here,
// JSON Lines there, a tab-separated fallback somewhere else.
// They all turn a source into an ordered list of raw
// (text, label) rows, so that job is a trait and each format
// is one implementation of it.
//
//   - DelimitedLoader  implements RecordSource (CSV / TSV)
//   - JsonLinesLoader  implements RecordSource (JSON Lines)
//
// The application layer holds a Box<dyn RecordSource> picked
// by the configured format and never sees the concrete type.
//
// Reference: Rust Book §10 (Traits), §17 (Trait Objects)

use anyhow::Result;

use crate::domain::record::RawRecord;

/// Rows produced by a source, plus how many could not be parsed.
#[derive(Debug, Default, Clone)]
pub struct LoadedRows {
    /// Rows in source order (files concatenated in configured order)
    pub records: Vec<RawRecord>,

    /// Lines/rows skipped because they failed to parse
    pub malformed: usize,
}

impl LoadedRows {
    /// Append the rows of another file after this one's.
    pub fn extend(&mut self, other: LoadedRows) {
        self.records.extend(other.records);
        self.malformed += other.malformed;
    }
}

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the raw rows of one dataset.
///
/// File-level failures (missing file, missing column, unreadable
/// bytes) are errors. Row-level failures are counted in
/// `LoadedRows::malformed` and the row is skipped.
pub trait RecordSource {
    fn load_all(&self) -> Result<LoadedRows>;
}
