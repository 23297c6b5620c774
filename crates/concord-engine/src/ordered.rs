//! Ordered merge: reconcile a list against a source sequence, preserving
//! target identity while repairing the order to follow the source.
//!
//! The walk is guided by an [`AlignmentTable`] built once over the source
//! and the original target list. Three cursors move through it:
//!
//! - `source_index`: next source element to place,
//! - `read_index`: position in the *original* target list, used only to
//!   consult the table,
//! - `write_index`: position in the list being rewritten.
//!
//! At each step the pair under the cursors is either a match (merge in
//! place), an insertion (rescue a displaced target, pull a later matching
//! target forward, or create a new one), or a removal (tombstone or
//! displace the target into the [`RescuePool`]).
//!
//! # Invariants
//!
//! - Every element at or after `write_index` is an original target that
//!   has not been visited yet.
//! - Each original target is claimed by at most one source element.
//! - A reused target is never re-created: `Retain` keeps the same object.

use tracing::{debug, trace};

use crate::alignment::AlignmentTable;
use crate::rescue::RescuePool;
use crate::stats::MergeStats;
use crate::strategy::{merge_slot, MergeStrategy, Verdict};

/// Merge `source` into `target` in order.
///
/// Equivalent to [`merge_ordered_with`] without a post-merge hook.
pub fn merge_ordered<'s, S, T, St>(
    source: impl IntoIterator<Item = &'s S>,
    target: &mut Vec<T>,
    strategy: &mut St,
) -> Result<MergeStats, St::Error>
where
    S: 's,
    St: MergeStrategy<S, T> + ?Sized,
{
    merge_ordered_with(source, target, strategy, |_| Ok(()))
}

/// Merge `source` into `target` in order, then run `after` on the result.
///
/// A target kept as a tombstone stays at its position and is never offered
/// for rescue. If its key shows up later in the source, that source element
/// gets a newly created target next to the tombstone.
///
/// Callback errors propagate unchanged. The list then reflects the progress
/// made before the failure, with targets still parked in the rescue pool
/// appended at the end.
pub fn merge_ordered_with<'s, S, T, St, H>(
    source: impl IntoIterator<Item = &'s S>,
    target: &mut Vec<T>,
    strategy: &mut St,
    after: H,
) -> Result<MergeStats, St::Error>
where
    S: 's,
    St: MergeStrategy<S, T> + ?Sized,
    H: FnOnce(&mut Vec<T>) -> Result<(), St::Error>,
{
    let source: Vec<&S> = source.into_iter().collect();
    let table = AlignmentTable::build(&source, &target[..], |s, t| strategy.matches(s, t))?;

    let mut walk = OrderedWalk {
        source: &source,
        table: &table,
        strategy,
        pool: RescuePool::new(),
        stats: MergeStats::default(),
        source_index: 0,
        read_index: 0,
        write_index: 0,
    };
    if let Err(err) = walk.run(target) {
        target.extend(walk.pool.into_inner());
        return Err(err);
    }

    let mut stats = walk.stats;
    stats.removed += walk.pool.len();
    after(&mut *target)?;

    debug!(
        source = source.len(),
        common = table.common_len(),
        matched = stats.matched,
        created = stats.created,
        rescued = stats.rescued,
        moved = stats.moved,
        removed = stats.removed,
        "ordered merge complete"
    );
    Ok(stats)
}

struct OrderedWalk<'a, S, T, St: ?Sized> {
    source: &'a [&'a S],
    table: &'a AlignmentTable,
    strategy: &'a mut St,
    pool: RescuePool<T>,
    stats: MergeStats,
    source_index: usize,
    read_index: usize,
    write_index: usize,
}

impl<'a, S, T, St> OrderedWalk<'a, S, T, St>
where
    St: MergeStrategy<S, T> + ?Sized,
{
    fn run(&mut self, target: &mut Vec<T>) -> Result<(), St::Error> {
        while self.source_index < self.source.len() && self.write_index < target.len() {
            let source = self.source[self.source_index];
            if self.strategy.matches(source, &target[self.write_index])? {
                self.same(source, target)?;
            } else if self.table.prefers_insert(self.source_index, self.read_index) {
                self.added(source, target)?;
            } else {
                self.removed(target)?;
            }
        }

        // Leftover targets first, so their displacement can feed rescues
        // for the leftover sources.
        while self.write_index < target.len() {
            self.removed(target)?;
        }
        while self.source_index < self.source.len() {
            let source = self.source[self.source_index];
            self.added(source, target)?;
        }
        Ok(())
    }

    fn same(&mut self, source: &S, target: &mut Vec<T>) -> Result<(), St::Error> {
        let at = self.write_index;
        match merge_slot(&mut *self.strategy, Some(source), Some(&mut target[at]))? {
            Verdict::Retained => {
                self.stats.matched += 1;
                self.write_index += 1;
            }
            Verdict::Replaced(next) => {
                target[at] = next;
                self.stats.replaced += 1;
                self.write_index += 1;
            }
            Verdict::Rejected => {
                self.pool.push(target.remove(at));
            }
        }
        self.source_index += 1;
        self.read_index += 1;
        Ok(())
    }

    fn added(&mut self, source: &S, target: &mut Vec<T>) -> Result<(), St::Error> {
        let at = self.write_index;
        let strategy = &mut *self.strategy;

        let mut candidate = self
            .pool
            .rescue(|pooled| strategy.matches(source, pooled))?
            .map(|rescued| (rescued, Reuse::Rescued));
        if candidate.is_none() {
            if let Some(found) = position_from(&target[..], at + 1, source, strategy)? {
                trace!(from = found, to = at, "relocating target");
                candidate = Some((target.remove(found), Reuse::Moved));
            }
        }

        match candidate {
            Some((mut reused, how)) => {
                let verdict = match merge_slot(strategy, Some(source), Some(&mut reused)) {
                    Ok(verdict) => verdict,
                    Err(err) => {
                        self.pool.push(reused);
                        return Err(err);
                    }
                };
                match verdict {
                    Verdict::Retained => target.insert(at, reused),
                    Verdict::Replaced(next) => target.insert(at, next),
                    Verdict::Rejected => {
                        self.pool.push(reused);
                        self.stats.skipped += 1;
                        self.source_index += 1;
                        return Ok(());
                    }
                }
                match how {
                    Reuse::Rescued => self.stats.rescued += 1,
                    Reuse::Moved => self.stats.moved += 1,
                }
                self.write_index += 1;
            }
            None => match merge_slot(strategy, Some(source), None)? {
                Verdict::Replaced(next) => {
                    target.insert(at, next);
                    self.stats.created += 1;
                    self.write_index += 1;
                }
                Verdict::Retained | Verdict::Rejected => self.stats.skipped += 1,
            },
        }
        self.source_index += 1;
        Ok(())
    }

    fn removed(&mut self, target: &mut Vec<T>) -> Result<(), St::Error> {
        let at = self.write_index;
        match merge_slot(&mut *self.strategy, None, Some(&mut target[at]))? {
            Verdict::Retained => {
                self.stats.tombstoned += 1;
                self.write_index += 1;
            }
            Verdict::Replaced(next) => {
                target[at] = next;
                self.stats.tombstoned += 1;
                self.write_index += 1;
            }
            Verdict::Rejected => {
                self.pool.push(target.remove(at));
            }
        }
        self.read_index += 1;
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Reuse {
    Rescued,
    Moved,
}

/// First index at or after `start` whose element matches `source`.
fn position_from<S, T, St>(
    target: &[T],
    start: usize,
    source: &S,
    strategy: &mut St,
) -> Result<Option<usize>, St::Error>
where
    St: MergeStrategy<S, T> + ?Sized,
{
    for (index, candidate) in target.iter().enumerate().skip(start) {
        if strategy.matches(source, candidate)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}
