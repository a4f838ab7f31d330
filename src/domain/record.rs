// ============================================================
// Layer 3 — Record Domain Types
// ============================================================
// Two shapes of the same row:
//
//   RawRecord — what a loader pulls out of a source file.
//               Every field is optional because cells can be
//               empty, keys can be missing, and values can be null.
//
//   Record    — the canonical (text, label) pair that survives
//               normalisation. Both fields are non-empty.
//
// Identity of a Record is its text alone: two records with the
// same text are duplicates regardless of label.
//
// Reference: Rust Book §5 (Structs and Methods)

/// One row exactly as the loader found it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Title sub-field, only filled for title+body datasets
    pub title: Option<String>,

    /// The text (or body) field
    pub text: Option<String>,

    /// The source-specific label code, rendered as text
    pub label: Option<String>,
}

impl RawRecord {
    /// `title` is only set for title+body datasets.
    pub fn new(
        title: Option<String>,
        text:  Option<String>,
        label: Option<String>,
    ) -> Self {
        Self { title, text, label }
    }
}

/// A cleaned, canonical labelled example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub text:  String,
    pub label: String,
}

impl Record {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text:  text.into(),
            label: label.into(),
        }
    }
}
