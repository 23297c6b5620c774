//! Grouped reconciliation: one unordered merge per key.

use std::collections::BTreeMap;
use std::fmt::Debug;

use concord_engine::{MergeStats, TargetCollection};
use tracing::debug;

use crate::error::ReconcileResult;
use crate::options::MissingSource;
use crate::reconciler::Reconciler;

impl<'a, S, T, C> Reconciler<'a, S, T, C>
where
    C: TargetCollection<T>,
{
    /// Partition `source` by `key` and reconcile each partition with the
    /// group of `target` under the same key.
    ///
    /// Groups present only in `target` are merged against an empty source, so
    /// their members go through the tombstone path. Groups left empty are
    /// dropped, even when a callback fails part way. The post-merge hook runs
    /// once per group.
    pub fn merge_grouped<'s, K, I>(
        &mut self,
        source: Option<I>,
        target: &mut BTreeMap<K, C>,
        mut key: impl FnMut(&S) -> K,
    ) -> ReconcileResult<MergeStats>
    where
        I: IntoIterator<Item = &'s S>,
        S: Debug + 's,
        K: Ord + Debug,
        C: Default + Debug,
    {
        let Some(source) = source else {
            let mut stats = MergeStats::default();
            if self.options.missing_source == MissingSource::Clear {
                stats.removed = target.values().map(|group| group.len()).sum();
                target.clear();
            }
            self.stats = stats;
            return Ok(stats);
        };

        let mut partitions: BTreeMap<K, Vec<&'s S>> = BTreeMap::new();
        for item in source {
            partitions.entry(key(item)).or_default().push(item);
        }

        let outcome = self.merge_groups(partitions, target);
        target.retain(|_, group| !group.is_empty());
        self.stats = outcome?;
        Ok(self.stats)
    }

    fn merge_groups<'s, K>(
        &mut self,
        partitions: BTreeMap<K, Vec<&'s S>>,
        target: &mut BTreeMap<K, C>,
    ) -> ReconcileResult<MergeStats>
    where
        S: Debug + 's,
        K: Ord + Debug,
        C: Default + Debug,
    {
        let mut total = MergeStats::default();
        for (group_key, group) in target.iter_mut() {
            if partitions.contains_key(group_key) {
                continue;
            }
            total += self.merge_into(Some(Vec::<&'s S>::new()), group)?;
            debug!(key = ?group_key, size = group.len(), "orphan group merged");
        }
        for (group_key, items) in partitions {
            debug!(key = ?group_key, items = items.len(), "merging group");
            let group = target.entry(group_key).or_default();
            total += self.merge_into(Some(items), group)?;
        }
        Ok(total)
    }
}
