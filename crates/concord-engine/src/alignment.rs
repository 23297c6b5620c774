//! Sequence alignment over a caller-supplied match predicate.
//!
//! [`AlignmentTable`] is the longest-common-subsequence table with equality
//! replaced by the predicate. `L[i][j]` is the length of the longest common
//! subsequence of `source[i..]` and `target[j..]`:
//!
//! ```text
//! L[n][*] = 0 ;  L[*][m] = 0
//! L[i][j] = L[i+1][j+1] + 1            if matches(source[i], target[j])
//!         = max(L[i+1][j], L[i][j+1])  otherwise
//! ```
//!
//! Ties between "skip a source element" and "skip a target element" are
//! resolved in favour of treating the source element as inserted. The
//! ordered merge and [`AlignmentTable::script`] both use this rule.

use serde::{Deserialize, Serialize};

/// The (n+1)×(m+1) alignment table plus the n×m match verdicts it was
/// built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentTable {
    source_len: usize,
    target_len: usize,
    /// Row-major, `(source_len + 1) * (target_len + 1)` cells.
    lengths: Vec<usize>,
    /// Row-major, `source_len * target_len` cells.
    matched: Vec<bool>,
}

/// One step of an alignment script.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// `source[source]` lines up with `target[target]`.
    Keep { source: usize, target: usize },
    /// `source[source]` has no counterpart and is inserted.
    Insert { source: usize },
    /// `target[target]` has no counterpart and is deleted.
    Delete { target: usize },
}

impl AlignmentTable {
    /// Build the table, filling from the bottom-right corner.
    ///
    /// The predicate is called exactly once per (source, target) pair.
    pub fn build<A, B, E>(
        source: &[A],
        target: &[B],
        mut matches: impl FnMut(&A, &B) -> Result<bool, E>,
    ) -> Result<Self, E> {
        let n = source.len();
        let m = target.len();
        let cols = m + 1;
        let mut lengths = vec![0; (n + 1) * cols];
        let mut matched = vec![false; n * m];

        for i in (0..n).rev() {
            for j in (0..m).rev() {
                lengths[i * cols + j] = if matches(&source[i], &target[j])? {
                    matched[i * m + j] = true;
                    lengths[(i + 1) * cols + j + 1] + 1
                } else {
                    lengths[(i + 1) * cols + j].max(lengths[i * cols + j + 1])
                };
            }
        }

        Ok(Self {
            source_len: n,
            target_len: m,
            lengths,
            matched,
        })
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// `L[i][j]`.
    ///
    /// # Panics
    ///
    /// Panics if `i > source_len` or `j > target_len`.
    pub fn get(&self, i: usize, j: usize) -> usize {
        assert!(i <= self.source_len && j <= self.target_len, "alignment index out of range");
        self.lengths[i * (self.target_len + 1) + j]
    }

    /// Length of the longest common subsequence of the whole sequences.
    pub fn common_len(&self) -> usize {
        self.get(0, 0)
    }

    /// Whether the predicate matched `source[i]` with `target[j]`.
    pub fn is_match(&self, i: usize, j: usize) -> bool {
        i < self.source_len && j < self.target_len && self.matched[i * self.target_len + j]
    }

    /// The tie-break rule: with `source[i]` and `target[j]` unmatched,
    /// `true` means "treat the source element as added",
    /// `false` means "treat the target element as removed".
    ///
    /// Requires `i < source_len` and `j < target_len`.
    pub fn prefers_insert(&self, i: usize, j: usize) -> bool {
        self.get(i + 1, j) >= self.get(i, j + 1)
    }

    /// Walk the table into an edit script.
    ///
    /// Trailing targets are deleted before trailing sources are inserted,
    /// mirroring the tail flush of the ordered merge.
    pub fn script(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.source_len + self.target_len);
        let (mut i, mut j) = (0, 0);

        while i < self.source_len && j < self.target_len {
            if self.is_match(i, j) {
                steps.push(Step::Keep { source: i, target: j });
                i += 1;
                j += 1;
            } else if self.prefers_insert(i, j) {
                steps.push(Step::Insert { source: i });
                i += 1;
            } else {
                steps.push(Step::Delete { target: j });
                j += 1;
            }
        }
        steps.extend((j..self.target_len).map(|target| Step::Delete { target }));
        steps.extend((i..self.source_len).map(|source| Step::Insert { source }));
        steps
    }
}
