// ============================================================
// Layer 3 — Fold Assignment
// ============================================================
// For rotation i of k:
//
//   test  = Fold[i]
//   valid = Fold[(i + 1) mod k]
//   train = every other fold, in ascending fold index
//
// A FoldAssignment borrows from the shuffled corpus. Folds are
// read-only views; each rotation is built, written and dropped.

use crate::domain::record::Record;

/// Named slice written out for one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Train,
    Valid,
    Test,
}

impl Pool {
    /// Write order used for every fold directory.
    pub const ALL: [Pool; 3] = [Pool::Train, Pool::Valid, Pool::Test];

    /// File name of this pool inside a fold directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Pool::Train => "train.json",
            Pool::Valid => "valid.json",
            Pool::Test  => "test.json",
        }
    }
}

/// The train/valid/test triple for one rotation.
#[derive(Debug, Clone)]
pub struct FoldAssignment<'a> {
    /// 0-based rotation index
    pub index: usize,
    pub train: Vec<&'a Record>,
    pub valid: &'a [Record],
    pub test:  &'a [Record],
}

impl<'a> FoldAssignment<'a> {
    /// Directory name for this rotation: "01", "02", ...
    pub fn dir_name(&self) -> String {
        format!("{:02}", self.index + 1)
    }

    /// Records of one pool, in output order.
    pub fn pool(&self, pool: Pool) -> Vec<&'a Record> {
        match pool {
            Pool::Train => self.train.clone(),
            Pool::Valid => self.valid.iter().collect(),
            Pool::Test  => self.test.iter().collect(),
        }
    }
}
