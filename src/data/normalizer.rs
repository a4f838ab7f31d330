// ============================================================
// Layer 4 — Record Normaliser
// ============================================================
// Turns RawRecords into canonical Records, or rejects them.
//
// Per record, in order:
//
//   1. Text:  single column, or title + " " + body with missing
//             parts treated as empty. Optional whitespace cleanup.
//             Trimmed; empty → rejected (MissingText).
//
//   2. Label: trimmed; empty → rejected (MissingLabel).
//             first_of_list: keep only the first comma-separated part.
//             numeric: must be an integer code ("4", "4.0"),
//             otherwise rejected (InvalidLabel).
//
//   3. Map:   look the code up in the translation table. Unknown
//             codes are kept verbatim or dropped, per dataset.
//
//   4. Allow: with a closed vocabulary, anything outside it is
//             dropped (DisallowedLabel).
//
// Nothing is silently swallowed: every rejection is counted in a
// NormalizeReport so the caller can log it.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::data::preprocessor::Preprocessor;
use crate::domain::dataset::{DatasetConfig, LabelRules, TextColumns, UnmappedPolicy};
use crate::domain::record::{RawRecord, Record};

/// Why a raw record did not make it into the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingText,
    MissingLabel,
    /// Label is not an integer code on a numeric dataset
    InvalidLabel(String),
    /// No map entry and the dataset drops unmapped labels
    UnmappedLabel(String),
    /// Outside the dataset's closed vocabulary
    DisallowedLabel(String),
}

/// How the canonical label of an accepted record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelOrigin {
    /// No map configured
    Verbatim,
    Mapped,
    /// No map entry, kept as-is by policy
    Unmapped,
}

/// Counts of what happened to every raw record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub accepted:         usize,
    pub missing_text:     usize,
    pub missing_label:    usize,
    pub invalid_label:    usize,
    pub unmapped_kept:    usize,
    pub unmapped_dropped: usize,
    pub disallowed:       usize,

    /// Distinct raw labels that had no map entry
    pub unmapped_values: BTreeSet<String>,

    /// Accepted records per canonical label
    pub label_counts: BTreeMap<String, usize>,
}

impl NormalizeReport {
    pub fn rejected(&self) -> usize {
        self.missing_text
            + self.missing_label
            + self.invalid_label
            + self.unmapped_dropped
            + self.disallowed
    }
}

pub struct Normalizer {
    rules:        LabelRules,
    join_title:   bool,
    clean:        bool,
    preprocessor: Preprocessor,
}

impl Normalizer {
    pub fn new(rules: LabelRules, join_title: bool, clean: bool) -> Self {
        Self {
            rules,
            join_title,
            clean,
            preprocessor: Preprocessor::new(),
        }
    }

    pub fn from_config(cfg: &DatasetConfig) -> Self {
        let join_title = matches!(cfg.text, TextColumns::TitleBody { .. });
        Self::new(cfg.labels.clone(), join_title, cfg.clean_whitespace)
    }

    /// Normalise one raw record.
    pub fn normalize(&self, raw: &RawRecord) -> Result<(Record, LabelOrigin), Rejection> {
        let text            = self.text_of(raw)?;
        let code            = self.label_code(raw)?;
        let (label, origin) = self.map_label(code)?;

        if let Some(allowed) = &self.rules.allowed {
            if !allowed.iter().any(|a| a == &label) {
                return Err(Rejection::DisallowedLabel(label));
            }
        }

        Ok((Record::new(text, label), origin))
    }

    /// Normalise a whole corpus, keeping input order.
    pub fn normalize_all(&self, raws: &[RawRecord]) -> (Vec<Record>, NormalizeReport) {
        let mut records = Vec::with_capacity(raws.len());
        let mut report  = NormalizeReport::default();

        for raw in raws {
            match self.normalize(raw) {
                Ok((record, origin)) => {
                    if origin == LabelOrigin::Unmapped {
                        report.unmapped_kept += 1;
                        report.unmapped_values.insert(record.label.clone());
                    }
                    report.accepted += 1;
                    *report.label_counts.entry(record.label.clone()).or_insert(0) += 1;
                    records.push(record);
                }
                Err(Rejection::MissingText)   => report.missing_text += 1,
                Err(Rejection::MissingLabel)  => report.missing_label += 1,
                Err(Rejection::InvalidLabel(code)) => {
                    tracing::debug!("Rejected non-integer label code {:?}", code);
                    report.invalid_label += 1;
                }
                Err(Rejection::UnmappedLabel(code)) => {
                    report.unmapped_dropped += 1;
                    report.unmapped_values.insert(code);
                }
                Err(Rejection::DisallowedLabel(label)) => {
                    tracing::debug!("Rejected label outside the allowed set {:?}", label);
                    report.disallowed += 1;
                }
            }
        }

        if !report.unmapped_values.is_empty() {
            let action = match self.rules.unmapped {
                UnmappedPolicy::Keep => "kept with their original name",
                UnmappedPolicy::Drop => "dropped",
            };
            tracing::warn!(
                "{} labels not found in the label map were {}: {:?}",
                report.unmapped_values.len(),
                action,
                report.unmapped_values
            );
        }

        (records, report)
    }

    fn text_of(&self, raw: &RawRecord) -> Result<String, Rejection> {
        let joined = if self.join_title {
            format!(
                "{} {}",
                raw.title.as_deref().unwrap_or(""),
                raw.text.as_deref().unwrap_or("")
            )
        } else {
            raw.text.clone().unwrap_or_default()
        };

        let cleaned = if self.clean {
            self.preprocessor.clean(&joined)
        } else {
            joined
        };

        let text = cleaned.trim();
        if text.is_empty() {
            Err(Rejection::MissingText)
        } else {
            Ok(text.to_string())
        }
    }

    fn label_code(&self, raw: &RawRecord) -> Result<String, Rejection> {
        let mut label = raw.label.as_deref().unwrap_or("").trim();

        if self.rules.first_of_list {
            label = label.split(',').next().unwrap_or("").trim();
        }
        if label.is_empty() {
            return Err(Rejection::MissingLabel);
        }

        if self.rules.numeric {
            return parse_label_code(label)
                .map(|code| code.to_string())
                .ok_or_else(|| Rejection::InvalidLabel(label.to_string()));
        }
        Ok(label.to_string())
    }

    fn map_label(&self, code: String) -> Result<(String, LabelOrigin), Rejection> {
        let Some(map) = &self.rules.map else {
            return Ok((code, LabelOrigin::Verbatim));
        };

        match map.get(&code) {
            Some(canonical) => Ok((canonical.clone(), LabelOrigin::Mapped)),
            None => match self.rules.unmapped {
                UnmappedPolicy::Keep => Ok((code, LabelOrigin::Unmapped)),
                UnmappedPolicy::Drop => Err(Rejection::UnmappedLabel(code)),
            },
        }
    }
}

/// Parse an integer label code, accepting an integral float form.
///
/// "4" → 4, "4.0" → 4, "4.5" / "quatro" / "nan" → None
pub fn parse_label_code(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}
