// ============================================================
// Layer 4 — K-Fold Splitter
// ============================================================
// Builds k train/valid/test rotations from a normalised corpus:
//
//   1. Deduplicate by text, keeping the first occurrence.
//   2. Shuffle the whole deduplicated corpus with a seeded PRNG.
//   3. Cut the shuffled sequence into k contiguous folds whose
//      sizes differ by at most one (the first n mod k folds get
//      the extra record).
//   4. Rotation i: test = fold i, valid = fold (i + 1) mod k,
//      train = the remaining folds in ascending index order.
//
// Shuffle algorithm (part of the output contract; changing it
// changes every written file):
//
//   rng = ChaCha8Rng::seed_from_u64(seed)
//   for i in (1..n).rev():
//       j = rng.gen_range(0..=i as u64)
//       swap(i, j)
//
// Drawing j as a u64 keeps the permutation independent of the
// platform's usize width, so the same seed gives the same folds
// everywhere.
//
// Across all k rotations every record lands in test exactly once
// and in valid exactly once.
//
// Reference: Rust Book §8 (Vectors), §15 (Slices)
//            rand / rand_chacha crate documentation

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::ops::Range;

use crate::domain::dataset::MIN_FOLDS;
use crate::domain::error::PrepareError;
use crate::domain::fold::FoldAssignment;
use crate::domain::record::Record;

/// Drop records whose text was already seen, keeping input order.
/// Returns the unique records and how many were removed.
pub fn deduplicate(records: Vec<Record>) -> (Vec<Record>, usize) {
    let before   = records.len();
    let mut seen = HashSet::with_capacity(before);

    let unique: Vec<Record> = records
        .into_iter()
        .filter(|r| seen.insert(r.text.clone()))
        .collect();

    let removed = before - unique.len();
    (unique, removed)
}

/// Seeded in-place Fisher–Yates shuffle.
pub fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i as u64) as usize;
        items.swap(i, j);
    }
}

/// Sizes of k balanced folds over n items: the first `n % k` folds
/// hold `n / k + 1`, the rest hold `n / k`.
pub fn fold_sizes(n: usize, k: usize) -> Vec<usize> {
    if k == 0 {
        return Vec::new();
    }
    let base  = n / k;
    let extra = n % k;
    (0..k).map(|i| if i < extra { base + 1 } else { base }).collect()
}

/// Index ranges of the k folds over n items.
pub fn fold_ranges(n: usize, k: usize) -> Vec<Range<usize>> {
    let mut start = 0;
    fold_sizes(n, k)
        .into_iter()
        .map(|size| {
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Deduplicates, shuffles and splits a corpus into folds.
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    folds: usize,
    seed:  u64,
}

impl Splitter {
    pub fn new(folds: usize, seed: u64) -> Result<Self, PrepareError> {
        if folds < MIN_FOLDS {
            return Err(PrepareError::InvalidConfig(format!(
                "folds must be at least {MIN_FOLDS}, got {folds}"
            )));
        }
        Ok(Self { folds, seed })
    }

    /// Run dedup → shuffle → split.
    ///
    /// Refuses to build folds when fewer than k unique records remain,
    /// since at least one fold would be empty.
    pub fn split(&self, records: Vec<Record>) -> Result<Partition, PrepareError> {
        let (mut unique, duplicates_removed) = deduplicate(records);

        tracing::info!(
            "{} unique records ({} duplicates removed)",
            unique.len(),
            duplicates_removed
        );

        if unique.len() < self.folds {
            return Err(PrepareError::TooFewRecords {
                records: unique.len(),
                folds:   self.folds,
            });
        }

        tracing::info!("Shuffling with seed {}", self.seed);
        shuffle(&mut unique, self.seed);

        let ranges = fold_ranges(unique.len(), self.folds);
        tracing::debug!(
            "Fold sizes: {:?}",
            ranges.iter().map(|r| r.len()).collect::<Vec<_>>()
        );

        Ok(Partition {
            shuffled: unique,
            ranges,
            duplicates_removed,
        })
    }
}

/// The shuffled corpus and its k fold boundaries.
#[derive(Debug, Clone)]
pub struct Partition {
    shuffled:           Vec<Record>,
    ranges:             Vec<Range<usize>>,
    duplicates_removed: usize,
}

impl Partition {
    pub fn unique_records(&self) -> usize {
        self.shuffled.len()
    }

    pub fn num_folds(&self) -> usize {
        self.ranges.len()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    pub fn fold(&self, i: usize) -> &[Record] {
        &self.shuffled[self.ranges[i].clone()]
    }

    pub fn fold_sizes(&self) -> Vec<usize> {
        self.ranges.iter().map(|r| r.len()).collect()
    }

    /// Train/valid/test for rotation `i` (0-based, `i < k`).
    pub fn rotation(&self, i: usize) -> FoldAssignment<'_> {
        let k     = self.num_folds();
        let valid = (i + 1) % k;

        let train = (0..k)
            .filter(|&j| j != i && j != valid)
            .flat_map(|j| self.fold(j).iter())
            .collect();

        FoldAssignment {
            index: i,
            train,
            valid: self.fold(valid),
            test:  self.fold(i),
        }
    }

    /// All k rotations in order.
    pub fn rotations(&self) -> impl Iterator<Item = FoldAssignment<'_>> + '_ {
        (0..self.num_folds()).map(move |i| self.rotation(i))
    }
}
