// ============================================================
// Layer 6 — Pool Writer
// ============================================================
// Writes the k fold rotations of a dataset to disk.
//
// Output layout:
//   <output_base>/<DatasetName>/few_shot/
//     01/train.json  01/valid.json  01/test.json
//     02/...
//     ...
//     <k>/...
//
// Despite the .json extension every pool is JSON Lines: one
// object per line, text key first:
//   {"sentence": "não gostei", "label": "Negativo"}
//
// UTF-8, non-ASCII written literally (serde_json never escapes
// it). The text key is "sentence" or "text" per dataset.
//
// Replacing a previous run:
//   The whole few_shot tree is written into a sibling staging
//   directory first. Once every file is written:
//     1. the old few_shot is renamed to a backup
//     2. staging is renamed to few_shot
//     3. the backup is deleted
//   If writing or step 2 fails, staging is deleted and the backup
//   (if any) is renamed back, so the previous output survives.
//
// Reference: Rust Book §12 (I/O and File Handling)
//            serde documentation (implementing Serialize)

use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::data::splitter::Partition;
use crate::domain::dataset::TextField;
use crate::domain::fold::{FoldAssignment, Pool};
use crate::domain::record::Record;

const FEW_SHOT_DIR: &str = "few_shot";
const STAGING_DIR:  &str = ".few_shot.staging";
const BACKUP_DIR:   &str = ".few_shot.previous";

/// `<output_base>/<name>/few_shot`
pub fn few_shot_root(output_base: &Path, dataset: &str) -> PathBuf {
    output_base.join(dataset).join(FEW_SHOT_DIR)
}

/// One output line. Serialises as a two-entry map so the text key
/// always comes before "label".
struct PoolLine<'a> {
    text_key: &'static str,
    record:   &'a Record,
}

impl Serialize for PoolLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.text_key, &self.record.text)?;
        map.serialize_entry("label", &self.record.label)?;
        map.end()
    }
}

pub struct PoolWriter {
    text_field: TextField,
}

impl PoolWriter {
    pub fn new(text_field: TextField) -> Self {
        Self { text_field }
    }

    /// Write one pool file, truncating anything already there.
    /// Returns the number of lines written.
    pub fn write_pool<'a>(
        &self,
        path:    &Path,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Result<usize> {
        let file = File::create(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        let mut out = BufWriter::new(file);
        let mut n   = 0usize;

        for record in records {
            let line = PoolLine { text_key: self.text_field.as_str(), record };
            serde_json::to_writer(&mut out, &line)?;
            out.write_all(b"\n")?;
            n += 1;
        }

        out.flush()
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(n)
    }

    /// Write train/valid/test for one rotation into `dir`.
    pub fn write_fold(&self, dir: &Path, rotation: &FoldAssignment<'_>) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        for pool in Pool::ALL {
            self.write_pool(&dir.join(pool.file_name()), rotation.pool(pool))?;
        }
        Ok(())
    }

    /// Write every rotation of `partition` under
    /// `<output_base>/<dataset>/few_shot`, replacing any previous run.
    pub fn write_partition(
        &self,
        output_base: &Path,
        dataset:     &str,
        partition:   &Partition,
    ) -> Result<PathBuf> {
        let dataset_dir = output_base.join(dataset);
        let final_root  = few_shot_root(output_base, dataset);
        let staging     = dataset_dir.join(STAGING_DIR);
        let backup      = dataset_dir.join(BACKUP_DIR);

        // Leftovers from an interrupted run
        for dir in [&staging, &backup] {
            if dir.exists() {
                fs::remove_dir_all(dir)
                    .with_context(|| format!("Cannot remove '{}'", dir.display()))?;
            }
        }

        if let Err(e) = self.write_tree(&staging, partition) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        swap_into_place(&staging, &final_root, &backup)?;
        Ok(final_root)
    }

    fn write_tree(&self, root: &Path, partition: &Partition) -> Result<()> {
        let k = partition.num_folds();

        for rotation in partition.rotations() {
            tracing::info!(
                "Fold {}/{:02}: train={}, valid={}, test={}",
                rotation.dir_name(),
                k,
                rotation.train.len(),
                rotation.valid.len(),
                rotation.test.len()
            );
            self.write_fold(&root.join(rotation.dir_name()), &rotation)?;
        }
        Ok(())
    }
}

/// Replace `target` with `staging`, keeping the old `target` in
/// `backup` until the new tree is in place.
fn swap_into_place(staging: &Path, target: &Path, backup: &Path) -> Result<()> {
    let had_previous = target.exists();

    if had_previous {
        if let Err(e) = fs::rename(target, backup) {
            let _ = fs::remove_dir_all(staging);
            return Err(e).with_context(|| {
                format!("Cannot move '{}' aside to '{}'", target.display(), backup.display())
            });
        }
    }

    if let Err(e) = fs::rename(staging, target) {
        let _ = fs::remove_dir_all(staging);
        if had_previous {
            if let Err(restore) = fs::rename(backup, target) {
                tracing::error!(
                    "Cannot restore previous output from '{}': {}",
                    backup.display(),
                    restore
                );
            }
        }
        return Err(e).with_context(|| {
            format!("Cannot move '{}' to '{}'", staging.display(), target.display())
        });
    }

    if had_previous {
        tracing::info!("Replaced previous output: '{}'", target.display());
        if let Err(e) = fs::remove_dir_all(backup) {
            tracing::warn!("Cannot remove '{}': {}", backup.display(), e);
        }
    }
    Ok(())
}
