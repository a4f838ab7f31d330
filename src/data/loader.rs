// ============================================================
// Layer 4 — Source Loaders
// ============================================================
// Reads the raw rows of a dataset from one or more files.
//
// Three formats cover every corpus we prepare:
//
//   DelimitedLoader  — CSV/TSV with a header row.
//                      Uses the csv crate. The delimiter is
//                      configured or sniffed from the header.
//
//   JsonLinesLoader  — one JSON object per line.
//                      Uses serde_json::Value so any key can
//                      be selected at runtime.
//
//   XlsxLoader       — first sheet of a workbook, header in
//                      row 1. Uses calamine.
//
// All loaders:
//   - read files in the configured order and concatenate them
//   - abort on a missing file or a missing column
//   - skip and count rows that fail to parse
//   - treat empty cells and JSON nulls as absent fields
//
// Text files that are not valid UTF-8 are decoded as Latin-1.
//
// Reference: csv crate documentation
//            calamine documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use std::collections::BTreeSet;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::dataset::{DatasetConfig, SourceFormat, TextColumns};
use crate::domain::error::PrepareError;
use crate::domain::record::RawRecord;
use crate::domain::traits::{LoadedRows, RecordSource};

/// Source column (or JSON key) names for each RawRecord field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub title: Option<String>,
    pub text:  String,
    pub label: String,
}

impl ColumnSelection {
    pub fn from_config(cfg: &DatasetConfig) -> Self {
        let (title, text) = match &cfg.text {
            TextColumns::Column(c) => (None, c.clone()),
            TextColumns::TitleBody { title, body } => (Some(title.clone()), body.clone()),
        };
        Self {
            title,
            text,
            label: cfg.label_column.clone(),
        }
    }

    fn names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(3);
        if let Some(t) = &self.title {
            names.push(t.as_str());
        }
        names.push(self.text.as_str());
        names.push(self.label.as_str());
        names
    }
}

/// Pick the loader implementation for the configured format.
pub fn loader_for(cfg: &DatasetConfig) -> Box<dyn RecordSource> {
    let columns = ColumnSelection::from_config(cfg);
    let paths   = cfg.source.paths.clone();

    match cfg.source.format {
        SourceFormat::Csv => Box::new(DelimitedLoader::new(
            paths,
            cfg.source.delimiter.map(|d| d as u8),
            columns,
        )),
        SourceFormat::Tsv => Box::new(DelimitedLoader::new(paths, Some(b'\t'), columns)),
        SourceFormat::Jsonl => Box::new(JsonLinesLoader::new(paths, columns)),
        SourceFormat::Xlsx  => Box::new(XlsxLoader::new(paths, columns)),
    }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Read a whole source file as text.
///
/// A missing file is a `PrepareError::MissingSource`. Bytes that are
/// not valid UTF-8 are decoded as Latin-1, which maps every byte to
/// the code point of the same value. A leading BOM is dropped.
fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PrepareError::MissingSource { path: path.to_path_buf() }.into());
    }

    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(
                "'{}' is not valid UTF-8, decoding as Latin-1",
                path.display()
            );
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Choose a delimiter from the header line: tab, then semicolon
/// (only when there is no comma), then comma.
fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.contains('\t') {
        b'\t'
    } else if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

fn present(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ─── DelimitedLoader ─────────────────────────────────────────────────────────

/// Loads CSV/TSV files with a header row.
pub struct DelimitedLoader {
    paths:     Vec<PathBuf>,
    /// `None` → sniff per file
    delimiter: Option<u8>,
    columns:   ColumnSelection,
}

impl DelimitedLoader {
    pub fn new(paths: Vec<PathBuf>, delimiter: Option<u8>, columns: ColumnSelection) -> Self {
        Self { paths, delimiter, columns }
    }

    fn load_file(&self, path: &Path) -> Result<LoadedRows> {
        let content   = read_source(path)?;
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(&content));

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read header row of '{}'", path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let index_of = |column: &str| -> Result<usize, PrepareError> {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| PrepareError::MissingColumn {
                    path:   path.to_path_buf(),
                    column: column.to_string(),
                    found:  headers.clone(),
                })
        };

        let title_idx = self.columns.title.as_deref().map(|t| index_of(t)).transpose()?;
        let text_idx  = index_of(&self.columns.text)?;
        let label_idx = index_of(&self.columns.label)?;

        let mut rows = LoadedRows::default();

        for (i, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let cell = |idx: usize| record.get(idx).and_then(present);
                    rows.records.push(RawRecord::new(
                        title_idx.and_then(|idx| cell(idx)),
                        cell(text_idx),
                        cell(label_idx),
                    ));
                }
                Err(e) => {
                    // +2: one for the header, one for 1-based numbering
                    tracing::debug!(
                        "Skipping malformed row {} in '{}': {}",
                        i + 2,
                        path.display(),
                        e
                    );
                    rows.malformed += 1;
                }
            }
        }

        Ok(rows)
    }
}

impl RecordSource for DelimitedLoader {
    fn load_all(&self) -> Result<LoadedRows> {
        let mut all = LoadedRows::default();
        for path in &self.paths {
            let rows = self.load_file(path)?;
            tracing::info!(
                "Read {} rows from '{}' ({} malformed)",
                rows.records.len(),
                path.display(),
                rows.malformed
            );
            all.extend(rows);
        }
        Ok(all)
    }
}

// ─── JsonLinesLoader ─────────────────────────────────────────────────────────

/// Loads files holding one JSON object per line.
pub struct JsonLinesLoader {
    paths:   Vec<PathBuf>,
    columns: ColumnSelection,
}

impl JsonLinesLoader {
    pub fn new(paths: Vec<PathBuf>, columns: ColumnSelection) -> Self {
        Self { paths, columns }
    }

    fn load_file(&self, path: &Path) -> Result<LoadedRows> {
        let content  = read_source(path)?;
        let mut rows = LoadedRows::default();
        let mut keys = BTreeSet::new();

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let object = match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(object)) => object,
                Ok(_) => {
                    tracing::debug!("Skipping line {} in '{}': not an object", i + 1, path.display());
                    rows.malformed += 1;
                    continue;
                }
                Err(e) => {
                    tracing::debug!("Skipping line {} in '{}': {}", i + 1, path.display(), e);
                    rows.malformed += 1;
                    continue;
                }
            };

            keys.extend(object.keys().cloned());
            let field = |key: &str| object.get(key).and_then(json_to_text);

            rows.records.push(RawRecord::new(
                self.columns.title.as_deref().and_then(|key| field(key)),
                field(&self.columns.text),
                field(&self.columns.label),
            ));
        }

        // A key that no line carries is a configuration mistake,
        // not a dataset full of empty rows.
        if !rows.records.is_empty() {
            if let Some(missing) = self.columns.names().into_iter().find(|c| !keys.contains(*c)) {
                return Err(PrepareError::MissingColumn {
                    path:   path.to_path_buf(),
                    column: missing.to_string(),
                    found:  keys.into_iter().collect(),
                }
                .into());
            }
        }

        Ok(rows)
    }
}

impl RecordSource for JsonLinesLoader {
    fn load_all(&self) -> Result<LoadedRows> {
        let mut all = LoadedRows::default();
        for path in &self.paths {
            let rows = self.load_file(path)?;
            tracing::info!(
                "Read {} lines from '{}' ({} malformed)",
                rows.records.len(),
                path.display(),
                rows.malformed
            );
            all.extend(rows);
        }
        Ok(all)
    }
}

// ─── XlsxLoader ──────────────────────────────────────────────────────────────

/// Loads the first worksheet of spreadsheet workbooks.
pub struct XlsxLoader {
    paths:   Vec<PathBuf>,
    columns: ColumnSelection,
}

impl XlsxLoader {
    pub fn new(paths: Vec<PathBuf>, columns: ColumnSelection) -> Self {
        Self { paths, columns }
    }

    fn load_file(&self, path: &Path) -> Result<LoadedRows> {
        if !path.exists() {
            return Err(PrepareError::MissingSource { path: path.to_path_buf() }.into());
        }

        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Cannot open workbook '{}'", path.display()))?;
        let range = workbook
            .worksheet_range_at(0)
            .with_context(|| format!("Workbook '{}' has no sheets", path.display()))?
            .with_context(|| format!("Cannot read first sheet of '{}'", path.display()))?;

        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .map(|row| {
                row.iter()
                    .map(|c| cell_to_text(c).unwrap_or_default().trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let index_of = |column: &str| -> Result<usize, PrepareError> {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| PrepareError::MissingColumn {
                    path:   path.to_path_buf(),
                    column: column.to_string(),
                    found:  headers.clone(),
                })
        };

        let title_idx = self.columns.title.as_deref().map(|t| index_of(t)).transpose()?;
        let text_idx  = index_of(&self.columns.text)?;
        let label_idx = index_of(&self.columns.label)?;

        let selected: Vec<usize> = title_idx.into_iter().chain([text_idx, label_idx]).collect();
        let mut rows = LoadedRows::default();

        for (i, row) in sheet_rows.enumerate() {
            if row.iter().all(|c| matches!(c, Data::Empty)) {
                continue;
            }
            // #N/A, #DIV/0! and friends in a selected column
            if selected.iter().any(|&idx| matches!(row.get(idx), Some(Data::Error(_)))) {
                // +2: one for the header, one for 1-based numbering
                tracing::debug!("Skipping row {} in '{}': cell error", i + 2, path.display());
                rows.malformed += 1;
                continue;
            }

            let cell = |idx: usize| row.get(idx).and_then(cell_to_text);
            rows.records.push(RawRecord::new(
                title_idx.and_then(|idx| cell(idx)),
                cell(text_idx),
                cell(label_idx),
            ));
        }

        Ok(rows)
    }
}

impl RecordSource for XlsxLoader {
    fn load_all(&self) -> Result<LoadedRows> {
        let mut all = LoadedRows::default();
        for path in &self.paths {
            let rows = self.load_file(path)?;
            tracing::info!(
                "Read {} rows from '{}' ({} malformed)",
                rows.records.len(),
                path.display(),
                rows.malformed
            );
            all.extend(rows);
        }
        Ok(all)
    }
}

/// Render a spreadsheet cell as a text field. Whole-number floats
/// lose their ".0", as ratings are usually stored as numbers.
fn cell_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s)              => present(s),
        Data::Int(i)                 => Some(i.to_string()),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            Some(format!("{}", *f as i64))
        }
        Data::Float(f)               => Some(f.to_string()),
        Data::Bool(b)                => Some(b.to_string()),
        other                        => present(&other.to_string()),
    }
}

/// Render a JSON value as a text field.
///
/// Strings pass through, integral numbers lose any ".0", null and
/// blank strings are absent, and compound values keep their JSON form.
fn json_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null      => None,
        Value::String(s) => present(s),
        Value::Bool(b)   => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                        Some(format!("{}", f as i64))
                    }
                    _ => Some(n.to_string()),
                }
            }
        }
        other => Some(other.to_string()),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    fn columns(title: Option<&str>, text: &str, label: &str) -> ColumnSelection {
        ColumnSelection {
            title: title.map(str::to_string),
            text:  text.to_string(),
            label: label.to_string(),
        }
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_csv_reads_selected_columns() {
        let dir  = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "hate.csv",
            b"id,comentario,label_final\n1,que horror,1\n2,,0\n3,\"ok, tudo bem\",0\n",
        );

        let loader = DelimitedLoader::new(vec![path], None, columns(None, "comentario", "label_final"));
        let rows   = loader.load_all().unwrap();

        assert_eq!(rows.records.len(), 3);
        assert_eq!(rows.malformed, 0);
        assert_eq!(
            rows.records[0],
            RawRecord::new(None, Some("que horror".into()), Some("1".into()))
        );
        // Empty cell → absent
        assert_eq!(rows.records[1].text, None);
        assert_eq!(rows.records[2].text.as_deref(), Some("ok, tudo bem"));
    }

    #[test]
    fn test_csv_sniffs_tab_delimiter() {
        let dir  = tempdir().unwrap();
        let path = write_file(dir.path(), "mmlu.csv", b"Question\tSubject\nO que e?\tanatomy\n");

        let loader = DelimitedLoader::new(vec![path], None, columns(None, "Question", "Subject"));
        let rows   = loader.load_all().unwrap();

        assert_eq!(rows.records[0].label.as_deref(), Some("anatomy"));
    }

    #[test]
    fn test_csv_counts_malformed_rows() {
        let dir  = tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", b"text,label\na,1\nb,2,extra\nc,3\n");

        let loader = DelimitedLoader::new(vec![path], Some(b','), columns(None, "text", "label"));
        let rows   = loader.load_all().unwrap();

        assert_eq!(rows.records.len(), 2);
        assert_eq!(rows.malformed, 1);
    }

    #[test]
    fn test_csv_missing_column_is_an_error() {
        let dir  = tempdir().unwrap();
        let path = write_file(dir.path(), "x.csv", b"texto,rotulo\na,1\n");

        let loader = DelimitedLoader::new(vec![path], None, columns(None, "text", "rotulo"));
        let err    = loader.load_all().unwrap_err();

        match err.downcast_ref::<PrepareError>() {
            Some(PrepareError::MissingColumn { column, found, .. }) => {
                assert_eq!(column, "text");
                assert_eq!(found, &vec!["texto".to_string(), "rotulo".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir    = tempdir().unwrap();
        let loader = DelimitedLoader::new(
            vec![dir.path().join("nope.csv")],
            None,
            columns(None, "text", "label"),
        );
        let err = loader.load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrepareError>(),
            Some(PrepareError::MissingSource { .. })
        ));
    }

    #[test]
    fn test_csv_title_body_columns() {
        let dir  = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "b2w.csv",
            b"review_title,review_text,overall_rating\nBom,Chegou rapido,5\n,So o corpo,4\n",
        );

        let loader = DelimitedLoader::new(
            vec![path],
            None,
            columns(Some("review_title"), "review_text", "overall_rating"),
        );
        let rows = loader.load_all().unwrap();

        assert_eq!(rows.records[0].title.as_deref(), Some("Bom"));
        assert_eq!(rows.records[1].title, None);
        assert_eq!(rows.records[1].text.as_deref(), Some("So o corpo"));
    }

    #[test]
    fn test_latin1_fallback() {
        let dir = tempdir().unwrap();
        // "não" with ã encoded as the single Latin-1 byte 0xE3
        let path = write_file(dir.path(), "olist.csv", b"review_text,polarity\nn\xe3o gostei,0\n");

        let loader = DelimitedLoader::new(vec![path], None, columns(None, "review_text", "polarity"));
        let rows   = loader.load_all().unwrap();

        assert_eq!(rows.records[0].text.as_deref(), Some("não gostei"));
    }

    #[test]
    fn test_jsonl_skips_bad_lines_and_renders_numbers() {
        let dir  = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "intent.jsonl",
            concat!(
                "{\"utt\": \"acorda me as sete\", \"intent\": \"alarm_set\"}\n",
                "not json\n",
                "\n",
                "[1, 2]\n",
                "{\"utt\": \"nota\", \"intent\": 5.0}\n",
                "{\"utt\": null, \"intent\": 3}\n",
            )
            .as_bytes(),
        );

        let loader = JsonLinesLoader::new(vec![path], columns(None, "utt", "intent"));
        let rows   = loader.load_all().unwrap();

        assert_eq!(rows.records.len(), 3);
        assert_eq!(rows.malformed, 2);
        assert_eq!(rows.records[1].label.as_deref(), Some("5"));
        assert_eq!(rows.records[2].text, None);
    }

    #[test]
    fn test_jsonl_missing_key_everywhere_is_an_error() {
        let dir  = tempdir().unwrap();
        let path = write_file(dir.path(), "r.jsonl", b"{\"ementa\": \"x\", \"area\": \"y\"}\n");

        let loader = JsonLinesLoader::new(vec![path], columns(None, "ementa", "categoria"));
        assert!(loader.load_all().is_err());
    }

    #[test]
    fn test_multiple_files_concatenate_in_order() {
        let dir = tempdir().unwrap();
        let a   = write_file(dir.path(), "train.jsonl", b"{\"t\": \"a\", \"l\": \"x\"}\n");
        let b   = write_file(dir.path(), "test.jsonl",  b"{\"t\": \"b\", \"l\": \"y\"}\n");

        let loader = JsonLinesLoader::new(vec![a, b], columns(None, "t", "l"));
        let rows   = loader.load_all().unwrap();

        let texts: Vec<_> = rows.records.iter().map(|r| r.text.clone().unwrap()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_json_to_text() {
        assert_eq!(json_to_text(&json!(null)), None);
        assert_eq!(json_to_text(&json!("  ")), None);
        assert_eq!(json_to_text(&json!(4)).as_deref(), Some("4"));
        assert_eq!(json_to_text(&json!(4.0)).as_deref(), Some("4"));
        assert_eq!(json_to_text(&json!(4.5)).as_deref(), Some("4.5"));
        assert_eq!(json_to_text(&json!(true)).as_deref(), Some("true"));
    }

    /// Write a one-sheet workbook. Cells that parse as numbers are
    /// stored as numbers; empty strings leave the cell blank.
    fn write_workbook(dir: &Path, name: &str, rows: &[&[&str]]) -> PathBuf {
        let path         = dir.join(name);
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet        = workbook.add_worksheet();

        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n)  => sheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_xlsx_reads_title_body_and_numeric_rating() {
        let dir  = tempdir().unwrap();
        let path = write_workbook(
            dir.path(),
            "brandsBr.xlsx",
            &[
                &["review_title", "review_text", "overall_rating"],
                &["Ótimo", "Chegou rápido", "5"],
                &["", "", ""],
                &["Ruim", "", "1"],
                &["Meh", "Mais ou menos", "3.5"],
            ],
        );

        let loader = XlsxLoader::new(
            vec![path],
            columns(Some("review_title"), "review_text", "overall_rating"),
        );
        let rows = loader.load_all().unwrap();

        // Blank row skipped, not counted
        assert_eq!(rows.records.len(), 3);
        assert_eq!(rows.malformed, 0);
        assert_eq!(
            rows.records[0],
            RawRecord::new(
                Some("Ótimo".into()),
                Some("Chegou rápido".into()),
                Some("5".into()),
            )
        );
        assert_eq!(rows.records[1].text, None);
        assert_eq!(rows.records[1].label.as_deref(), Some("1"));
        assert_eq!(rows.records[2].label.as_deref(), Some("3.5"));
    }

    #[test]
    fn test_xlsx_missing_column_is_an_error() {
        let dir  = tempdir().unwrap();
        let path = write_workbook(dir.path(), "x.xlsx", &[&["texto", "rotulo"], &["a", "1"]]);

        let loader = XlsxLoader::new(vec![path], columns(None, "text", "rotulo"));
        let err    = loader.load_all().unwrap_err();

        match err.downcast_ref::<PrepareError>() {
            Some(PrepareError::MissingColumn { column, found, .. }) => {
                assert_eq!(column, "text");
                assert_eq!(found, &vec!["texto".to_string(), "rotulo".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_xlsx_missing_file_is_missing_source() {
        let dir    = tempdir().unwrap();
        let loader = XlsxLoader::new(vec![dir.path().join("nope.xlsx")], columns(None, "t", "l"));
        let err    = loader.load_all().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrepareError>(),
            Some(PrepareError::MissingSource { .. })
        ));
    }

    #[test]
    fn test_cell_to_text() {
        assert_eq!(cell_to_text(&Data::Empty), None);
        assert_eq!(cell_to_text(&Data::String("  ".into())), None);
        assert_eq!(cell_to_text(&Data::Float(4.0)).as_deref(), Some("4"));
        assert_eq!(cell_to_text(&Data::Float(4.5)).as_deref(), Some("4.5"));
        assert_eq!(cell_to_text(&Data::Int(2)).as_deref(), Some("2"));
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a\tb\n"), b'\t');
        assert_eq!(sniff_delimiter("a;b\n"), b';');
        assert_eq!(sniff_delimiter("a,b;c\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }
}
