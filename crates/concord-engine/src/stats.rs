use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Per-call tally of what the engine did to the target collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Matched pairs whose target kept its identity.
    pub matched: usize,
    /// Matched pairs whose target was swapped for a different object.
    pub replaced: usize,
    /// Source elements that produced a brand new target.
    pub created: usize,
    /// Source elements reunited with a displaced target from the rescue pool.
    pub rescued: usize,
    /// Source elements that pulled a later target forward into their slot.
    pub moved: usize,
    /// Unmatched targets kept as tombstones.
    pub tombstoned: usize,
    /// Targets that did not survive the call.
    pub removed: usize,
    /// Source elements that never materialized.
    pub skipped: usize,
}

impl MergeStats {
    /// Number of elements in the target after the call.
    pub fn surviving(&self) -> usize {
        self.matched + self.replaced + self.created + self.rescued + self.moved + self.tombstoned
    }

    /// Returns `true` if every surviving element was matched in place and
    /// nothing was created, removed, relocated, or tombstoned.
    pub fn is_unchanged(&self) -> bool {
        self.replaced == 0
            && self.created == 0
            && self.rescued == 0
            && self.moved == 0
            && self.tombstoned == 0
            && self.removed == 0
            && self.skipped == 0
    }
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.replaced += other.replaced;
        self.created += other.created;
        self.rescued += other.rescued;
        self.moved += other.moved;
        self.tombstoned += other.tombstoned;
        self.removed += other.removed;
        self.skipped += other.skipped;
    }
}
