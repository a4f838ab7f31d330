// ============================================================
// Layer 6 — Dataset Config Store
// ============================================================
// Reads per-dataset DatasetConfig files from disk.
//
// A config file is plain JSON (see configs/ for the datasets we
// ship). Input paths inside it are relative to the config file's
// own directory, so a config can sit next to its raw data:
//
//   raw_data/hate/HateBR/
//     hatebr.json        ← "paths": ["HateBR.csv"]
//     HateBR.csv
//
// Absolute paths are used as-is.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::dataset::DatasetConfig;

pub struct ConfigStore;

impl ConfigStore {
    /// Load, resolve and validate one dataset config.
    pub fn load(path: impl AsRef<Path>) -> Result<DatasetConfig> {
        let path = path.as_ref();

        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read dataset config '{}'", path.display()))?;

        let mut cfg: DatasetConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid dataset config '{}'", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        cfg.source.paths = resolve_paths(base, &cfg.source.paths);

        cfg.validate()
            .with_context(|| format!("Invalid dataset config '{}'", path.display()))?;

        tracing::debug!(
            "Loaded config for '{}' from '{}' ({} input files)",
            cfg.name,
            path.display(),
            cfg.source.paths.len()
        );
        Ok(cfg)
    }
}

fn resolve_paths(base: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|p| if p.is_absolute() { p.clone() } else { base.join(p) })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PrepareError;
    use tempfile::tempdir;

    #[test]
    fn test_relative_paths_resolved_against_config_dir() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("eniac.json");
        fs::write(
            &path,
            r#"{
                "name": "EniacCorpus",
                "source": { "format": "csv", "paths": ["dataset-eniac-2023.csv"] },
                "text": { "column": "sentenca" },
                "label_column": "categoria",
                "labels": { "first_of_list": true }
            }"#,
        )
        .unwrap();

        let cfg = ConfigStore::load(&path).unwrap();
        assert_eq!(cfg.source.paths, vec![dir.path().join("dataset-eniac-2023.csv")]);
        assert!(cfg.labels.first_of_list);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{
                "name": "X",
                "source": { "format": "jsonl", "paths": ["x.jsonl"] },
                "text": { "column": "t" },
                "label_column": "l",
                "folds": 1
            }"#,
        )
        .unwrap();

        let err = ConfigStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
        assert!(matches!(
            err.downcast_ref::<PrepareError>(),
            Some(PrepareError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        assert!(ConfigStore::load(dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_shipped_configs_parse() {
        let configs = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
        let mut seen = 0;
        for entry in fs::read_dir(&configs).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                ConfigStore::load(&path)
                    .unwrap_or_else(|e| panic!("{}: {e:#}", path.display()));
                seen += 1;
            }
        }
        assert!(seen >= 10);
    }
}
