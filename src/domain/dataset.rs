// ============================================================
// Layer 3 — Dataset Configuration
// ============================================================
// Everything that used to be a module-level constant in a
// per-dataset script is now a field on DatasetConfig:
//
//   - where to read from, and in which format
//   - which columns hold the text and the label
//   - how raw label codes become canonical labels
//   - the output dataset name, fold count and seed
//
// The config is plain data. It is deserialised from JSON by
// the infra layer and passed by reference into the pipeline,
// never mutated after validation.
//
// Reference: Rust Book §6 (Enums), serde documentation

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::error::PrepareError;

/// Number of cross-validation folds used by every shipped dataset config.
pub const DEFAULT_FOLDS: usize = 5;

/// Seed used by every shipped dataset config.
pub const DEFAULT_SEED: u64 = 42;

/// Smallest fold count for which test, valid and train are all non-empty.
pub const MIN_FOLDS: usize = 3;

fn default_folds() -> usize {
    DEFAULT_FOLDS
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Declarative description of one dataset run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Output dataset name, e.g. "HateBRCorpus"
    pub name: String,

    /// Input files and their format
    pub source: SourceConfig,

    /// Which column(s) make up the text
    pub text: TextColumns,

    /// Column (or JSON key) holding the raw label
    pub label_column: String,

    /// Key used for the text in the written pools
    #[serde(default)]
    pub text_field: TextField,

    #[serde(default)]
    pub labels: LabelRules,

    /// Opt-in whitespace/control character cleanup of the text
    #[serde(default)]
    pub clean_whitespace: bool,

    #[serde(default = "default_folds")]
    pub folds: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub format: SourceFormat,

    /// Read in order and concatenated
    pub paths: Vec<PathBuf>,

    /// CSV only. Sniffed from the header line when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Delimited text with a header row
    Csv,
    /// Tab-delimited text with a header row
    Tsv,
    /// One JSON object per line
    Jsonl,
    /// Spreadsheet workbook; first sheet, header in row 1
    Xlsx,
}

/// Where the text of a record comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColumns {
    /// A single column
    Column(String),
    /// `title + " " + body`, missing parts treated as empty
    TitleBody { title: String, body: String },
}

/// Output key for the text of each written record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    #[default]
    Sentence,
    Text,
}

impl TextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextField::Sentence => "sentence",
            TextField::Text     => "text",
        }
    }
}

/// What to do with a raw label that has no entry in the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Keep the raw label verbatim
    #[serde(alias = "keep-original")]
    Keep,
    /// Drop the record
    #[default]
    Drop,
}

/// Rules turning a raw label code into a canonical label.
///
/// Applied in this order: first-of-list extraction, numeric
/// coercion, map lookup (with the unmapped policy), allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelRules {
    /// Raw labels are integer codes ("4", "4.0")
    #[serde(default)]
    pub numeric: bool,

    /// Keep only the first comma-separated component
    #[serde(default)]
    pub first_of_list: bool,

    /// Raw code → canonical label. `None` means labels pass through.
    #[serde(default)]
    pub map: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub unmapped: UnmappedPolicy,

    /// Closed vocabulary of canonical labels
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
}

impl DatasetConfig {
    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), PrepareError> {
        let name = self.name.as_str();
        if name.trim().is_empty() {
            return Err(PrepareError::InvalidConfig("dataset name is empty".into()));
        }
        // The name becomes a directory as written
        if name.trim() != name {
            return Err(PrepareError::InvalidConfig(format!(
                "dataset name '{}' has leading or trailing whitespace",
                self.name
            )));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(PrepareError::InvalidConfig(format!(
                "dataset name '{}' must be a single path component",
                self.name
            )));
        }
        if self.source.paths.is_empty() {
            return Err(PrepareError::InvalidConfig(format!(
                "dataset '{}' lists no input paths",
                self.name
            )));
        }
        if let Some(d) = self.source.delimiter {
            if self.source.format != SourceFormat::Csv {
                return Err(PrepareError::InvalidConfig(format!(
                    "delimiter is only valid for csv sources, not {:?}",
                    self.source.format
                )));
            }
            if !d.is_ascii() {
                return Err(PrepareError::InvalidConfig(format!(
                    "delimiter {d:?} is not a single-byte character"
                )));
            }
        }
        if self.label_column.trim().is_empty() {
            return Err(PrepareError::InvalidConfig("label_column is empty".into()));
        }
        let text_columns = match &self.text {
            TextColumns::Column(c)            => vec![c],
            TextColumns::TitleBody { title, body } => vec![title, body],
        };
        if text_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(PrepareError::InvalidConfig("text column name is empty".into()));
        }
        if self.folds < MIN_FOLDS {
            return Err(PrepareError::InvalidConfig(format!(
                "folds must be at least {MIN_FOLDS}, got {}",
                self.folds
            )));
        }
        if let Some(map) = &self.labels.map {
            if map.values().any(|v| v.trim().is_empty()) {
                return Err(PrepareError::InvalidConfig(
                    "label map contains an empty canonical label".into(),
                ));
            }
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DatasetConfig {
        serde_json::from_str(json).expect("valid config json")
    }

    const MINIMAL: &str = r#"{
        "name": "HateBRCorpus",
        "source": { "format": "csv", "paths": ["HateBR.csv"] },
        "text": { "column": "comentario" },
        "label_column": "label_final"
    }"#;

    #[test]
    fn test_defaults_applied() {
        let cfg = parse(MINIMAL);
        assert_eq!(cfg.folds, 5);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.text_field, TextField::Sentence);
        assert_eq!(cfg.labels.unmapped, UnmappedPolicy::Drop);
        assert!(cfg.labels.map.is_none());
        assert!(!cfg.clean_whitespace);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_title_body_and_label_rules() {
        let cfg = parse(r#"{
            "name": "BrandsCorpus",
            "source": { "format": "tsv", "paths": ["a.tsv", "b.tsv"] },
            "text": { "title_body": { "title": "review_title", "body": "review_text" } },
            "label_column": "overall_rating",
            "text_field": "text",
            "labels": {
                "numeric": true,
                "map": { "1": "Negativo", "5": "Positivo" },
                "unmapped": "keep-original"
            }
        }"#);
        assert_eq!(cfg.source.format, SourceFormat::Tsv);
        assert_eq!(cfg.text_field.as_str(), "text");
        assert_eq!(cfg.labels.unmapped, UnmappedPolicy::Keep);
        assert_eq!(
            cfg.text,
            TextColumns::TitleBody {
                title: "review_title".into(),
                body:  "review_text".into(),
            }
        );
    }

    #[test]
    fn test_rejects_too_few_folds() {
        let mut cfg = parse(MINIMAL);
        cfg.folds = 2;
        assert!(matches!(cfg.validate(), Err(PrepareError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_name_with_separator() {
        let mut cfg = parse(MINIMAL);
        cfg.name = "../escape".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_name_with_surrounding_whitespace() {
        let mut cfg = parse(MINIMAL);
        cfg.name = " HateBRCorpus".to_string();
        assert!(matches!(cfg.validate(), Err(PrepareError::InvalidConfig(_))));

        cfg.name = "HateBRCorpus\t".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_xlsx_format_parses() {
        let cfg = parse(&MINIMAL.replace("\"csv\"", "\"xlsx\"").replace("HateBR.csv", "brandsBr.xlsx"));
        assert_eq!(cfg.source.format, SourceFormat::Xlsx);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rejects_delimiter_on_non_csv_source() {
        let mut cfg = parse(MINIMAL);
        cfg.source.format    = SourceFormat::Xlsx;
        cfg.source.delimiter = Some(';');
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let json = MINIMAL.replace("\"label_column\"", "\"lable\": 1, \"label_column\"");
        assert!(serde_json::from_str::<DatasetConfig>(&json).is_err());
    }

    #[test]
    fn test_rejects_empty_paths() {
        let mut cfg = parse(MINIMAL);
        cfg.source.paths.clear();
        assert!(cfg.validate().is_err());
    }
}
