//! Reconciliation of keyed maps.

use std::collections::BTreeMap;
use std::fmt::Debug;

use concord_engine::{merge_slot, MergeStats, MergeStrategy, Verdict};
use tracing::debug;

use crate::error::{CallbackError, ReconcileResult};
use crate::options::MissingSource;
use crate::reconciler::{run_after, Callbacks, Reconciler};

impl<'a, S, T, K> Reconciler<'a, S, T, BTreeMap<K, T>>
where
    K: Ord + Clone + Debug,
{
    /// Merge `(key, source)` entries into a map keyed the same way.
    ///
    /// An entry whose key is present in `target` and whose value satisfies
    /// the match predicate is merged in place. Otherwise the old value, if
    /// any, is offered as a tombstone and a new value is created; a created
    /// value takes precedence over a surviving tombstone. Keys never named
    /// by the source are offered as tombstones. When the source repeats a
    /// key the first entry wins and the rest are skipped.
    ///
    /// If a callback fails, values not yet visited are put back next to the
    /// ones already merged, so `target` loses nothing.
    pub fn merge_keyed<'s, I>(
        &mut self,
        source: Option<I>,
        target: &mut BTreeMap<K, T>,
    ) -> ReconcileResult<MergeStats>
    where
        I: IntoIterator<Item = (K, &'s S)>,
        S: Debug + 's,
        T: Debug,
    {
        let Some(source) = source else {
            let mut stats = MergeStats::default();
            if self.options.missing_source == MissingSource::Clear {
                stats.removed = target.len();
                target.clear();
            }
            self.stats = stats;
            return Ok(stats);
        };

        let entries: Vec<(K, &S)> = source.into_iter().collect();
        let mut existing = std::mem::take(target);
        let mut stats = MergeStats::default();
        let outcome = reconcile(
            &mut self.callbacks,
            &entries,
            &mut existing,
            target,
            &mut stats,
        );
        if let Err(cause) = outcome {
            target.append(&mut existing);
            return Err(self.fail(cause, &entries, &*target));
        }
        if let Err(cause) = run_after(&mut self.after, target) {
            return Err(self.fail(cause, &entries, &*target));
        }

        debug!(
            matched = stats.matched,
            created = stats.created,
            tombstoned = stats.tombstoned,
            removed = stats.removed,
            size = target.len(),
            "keyed merge complete"
        );
        self.stats = stats;
        Ok(stats)
    }
}

fn reconcile<K, S, T>(
    callbacks: &mut Callbacks<'_, S, T>,
    entries: &[(K, &S)],
    existing: &mut BTreeMap<K, T>,
    merged: &mut BTreeMap<K, T>,
    stats: &mut MergeStats,
) -> Result<(), CallbackError>
where
    K: Ord + Clone,
{
    for &(ref key, item) in entries {
        if merged.contains_key(key) {
            stats.skipped += 1;
            continue;
        }

        let matched = match existing.get(key) {
            Some(current) => callbacks.matches(item, current)?,
            None => false,
        };
        if matched {
            let verdict = merge_slot(callbacks, Some(item), existing.get_mut(key))?;
            match verdict {
                Verdict::Retained => stats.matched += 1,
                Verdict::Replaced(_) => stats.replaced += 1,
                Verdict::Rejected => stats.removed += 1,
            }
            if let Some(value) = verdict.resolve(existing.remove(key)) {
                merged.insert(key.clone(), value);
            }
            continue;
        }

        let tombstone = match existing.get_mut(key) {
            Some(current) => Some(merge_slot(callbacks, None, Some(current))?),
            None => None,
        };
        let created = merge_slot(callbacks, Some(item), None)?;
        let previous = match tombstone {
            Some(verdict) => {
                let previous = verdict.resolve(existing.remove(key));
                if previous.is_none() {
                    stats.removed += 1;
                }
                previous
            }
            None => None,
        };
        match (created, previous) {
            (Verdict::Replaced(next), previous) => {
                stats.created += 1;
                if previous.is_some() {
                    stats.removed += 1;
                }
                merged.insert(key.clone(), next);
            }
            (_, Some(previous)) => {
                stats.skipped += 1;
                stats.tombstoned += 1;
                merged.insert(key.clone(), previous);
            }
            (_, None) => stats.skipped += 1,
        }
    }

    let unvisited: Vec<K> = existing.keys().cloned().collect();
    for key in unvisited {
        let verdict = merge_slot(callbacks, None, existing.get_mut(&key))?;
        match verdict.resolve(existing.remove(&key)) {
            Some(value) => {
                stats.tombstoned += 1;
                merged.insert(key, value);
            }
            None => stats.removed += 1,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MergeOptions;
    use crate::testing::*;
    use crate::Merged;

    type EntityMap = BTreeMap<String, Entity>;

    fn keyed() -> Reconciler<'static, Row, Entity, EntityMap> {
        Reconciler::new(match_row, merge_row)
    }

    fn map(listing: &[(&str, u32, &str)]) -> EntityMap {
        listing
            .iter()
            .map(|(key, id, name)| (key.to_string(), entity(*id, name)))
            .collect()
    }

    fn entries<'a>(listing: &[&str], rows: &'a [Row]) -> Vec<(String, &'a Row)> {
        listing.iter().map(|key| key.to_string()).zip(rows).collect()
    }

    fn keys_of(map: &EntityMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn matched_keys_merge_in_place() {
        let source = rows(&[(1, "a2"), (3, "c")]);
        let mut target = map(&[("a", 1, "a"), ("b", 2, "b")]);
        let stats = keyed()
            .merge_keyed(Some(entries(&["a", "c"], &source)), &mut target)
            .unwrap();

        assert_eq!(keys_of(&target), ["a", "c"]);
        assert_eq!(target["a"].name, "a2");
        assert_eq!(target["a"].version, 1);
        assert_eq!((stats.matched, stats.created, stats.removed), (1, 1, 1));
    }

    #[test]
    fn key_hit_without_match_recreates() {
        let source = rows(&[(7, "new")]);
        let mut target = map(&[("a", 1, "old")]);
        let stats = keyed()
            .merge_keyed(Some(entries(&["a"], &source)), &mut target)
            .unwrap();
        assert_eq!(target["a"].id, 7);
        assert_eq!(target["a"].version, 0);
        assert_eq!((stats.created, stats.removed), (1, 1));
    }

    #[test]
    fn tombstone_survives_when_creation_is_filtered() {
        let source = rows(&[(7, "new")]);
        let mut target = map(&[("a", 1, "old")]);
        let mut reconciler: Reconciler<'_, Row, Entity, EntityMap> =
            Reconciler::new(match_row, |s: Option<&Row>, t: Option<&mut Entity>| match (s, t) {
                (None, Some(existing)) => {
                    existing.deleted = true;
                    Ok(Merged::Retain)
                }
                (s, t) => merge_row(s, t),
            })
            .filter(|e: &Entity| Ok(e.id != 7));
        let stats = reconciler
            .merge_keyed(Some(entries(&["a"], &source)), &mut target)
            .unwrap();
        assert_eq!(target["a"].id, 1);
        assert!(target["a"].deleted);
        assert_eq!(stats.tombstoned, 1);
    }

    #[test]
    fn repeated_keys_keep_first_entry() {
        let source = rows(&[(1, "first"), (1, "second")]);
        let mut target = EntityMap::new();
        let stats = keyed()
            .merge_keyed(Some(entries(&["a", "a"], &source)), &mut target)
            .unwrap();
        assert_eq!(target["a"].name, "first");
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn absent_source_clears_map() {
        let mut target = map(&[("a", 1, "a")]);
        keyed()
            .merge_keyed(None::<Vec<(String, &Row)>>, &mut target)
            .unwrap();
        assert!(target.is_empty());

        let mut target = map(&[("a", 1, "a")]);
        keyed()
            .options(MergeOptions::default().with_missing_source(MissingSource::Ignore))
            .merge_keyed(None::<Vec<(String, &Row)>>, &mut target)
            .unwrap();
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn hook_runs_on_merged_map() {
        let source = rows(&[(1, "a")]);
        let mut reconciler = keyed().after(|merged: &mut EntityMap| {
            merged.retain(|key, _| key != "a");
            Ok(())
        });
        let mut target = EntityMap::new();
        reconciler
            .merge_keyed(Some(entries(&["a"], &source)), &mut target)
            .unwrap();
        assert!(target.is_empty());
    }

    #[test]
    fn failed_keyed_merge_keeps_every_key() {
        let source = rows(&[(1, "a2"), (9, "z")]);
        let mut target = map(&[("a", 1, "a"), ("b", 2, "b"), ("c", 3, "c")]);
        let mut reconciler: Reconciler<'_, Row, Entity, EntityMap> =
            Reconciler::new(match_row, |s: Option<&Row>, t: Option<&mut Entity>| {
                if s.map(|r| r.id) == Some(9) {
                    return Err("row 9 is poisoned".into());
                }
                merge_row(s, t)
            });
        let err = reconciler
            .merge_keyed(Some(entries(&["a", "z"], &source)), &mut target)
            .unwrap_err();
        assert_eq!(err.cause().to_string(), "row 9 is poisoned");
        assert_eq!(keys_of(&target), ["a", "b", "c"]);
        assert_eq!(target["a"].name, "a2");
    }
}
