//! Unordered ("mixed") merge: position plays no part in matching.
//!
//! Every source element claims the first unclaimed target it matches, by
//! linear scan. Claims are tracked per slot, so two targets that compare
//! equal by value are still distinct candidates. Targets never claimed are
//! offered to the merge function as tombstones.

use tracing::debug;

use crate::collection::TargetCollection;
use crate::stats::MergeStats;
use crate::strategy::{merge_slot, MergeStrategy, Verdict};

/// Merge `source` into an unordered `target`.
///
/// Equivalent to [`merge_mixed_with`] without a post-merge hook.
pub fn merge_mixed<'s, S, T, C, St>(
    source: Option<impl IntoIterator<Item = &'s S>>,
    target: &mut C,
    strategy: &mut St,
) -> Result<MergeStats, St::Error>
where
    S: 's,
    C: TargetCollection<T> + ?Sized,
    St: MergeStrategy<S, T> + ?Sized,
{
    merge_mixed_with(source, target, strategy, |_| Ok(()))
}

/// Merge `source` into an unordered `target`, then run `after` on it.
///
/// A `None` source clears the target without consulting the strategy or
/// the hook. On a callback error every element the engine still holds is
/// put back into `target` before the error is returned.
pub fn merge_mixed_with<'s, S, T, C, St, H>(
    source: Option<impl IntoIterator<Item = &'s S>>,
    target: &mut C,
    strategy: &mut St,
    after: H,
) -> Result<MergeStats, St::Error>
where
    S: 's,
    C: TargetCollection<T> + ?Sized,
    St: MergeStrategy<S, T> + ?Sized,
    H: FnOnce(&mut C) -> Result<(), St::Error>,
{
    let Some(source) = source else {
        let cleared = target.len();
        target.clear();
        debug!(cleared, "source absent, target cleared");
        return Ok(MergeStats {
            removed: cleared,
            ..Default::default()
        });
    };

    let mut slots: Vec<Option<T>> = target.take_all().into_iter().map(Some).collect();
    let mut claimed = vec![false; slots.len()];
    let mut created = Vec::new();
    let mut stats = MergeStats::default();

    let outcome = reconcile(
        source,
        &mut slots[..],
        &mut claimed[..],
        &mut created,
        strategy,
        &mut stats,
    );
    target.put_all(slots.into_iter().flatten().chain(created).collect());
    outcome?;
    after(&mut *target)?;

    debug!(
        matched = stats.matched,
        created = stats.created,
        tombstoned = stats.tombstoned,
        removed = stats.removed,
        size = target.len(),
        "mixed merge complete"
    );
    Ok(stats)
}

fn reconcile<'s, S, T, St>(
    source: impl IntoIterator<Item = &'s S>,
    slots: &mut [Option<T>],
    claimed: &mut [bool],
    created: &mut Vec<T>,
    strategy: &mut St,
    stats: &mut MergeStats,
) -> Result<(), St::Error>
where
    S: 's,
    St: MergeStrategy<S, T> + ?Sized,
{
    for item in source {
        let Some(index) = claim(item, slots, claimed, strategy)? else {
            match merge_slot(strategy, Some(item), None)? {
                Verdict::Replaced(next) => {
                    created.push(next);
                    stats.created += 1;
                }
                Verdict::Retained | Verdict::Rejected => stats.skipped += 1,
            }
            continue;
        };

        let verdict = match slots[index].as_mut() {
            Some(existing) => merge_slot(strategy, Some(item), Some(existing))?,
            None => continue,
        };
        match verdict {
            Verdict::Retained => stats.matched += 1,
            Verdict::Replaced(next) => {
                slots[index] = Some(next);
                stats.replaced += 1;
            }
            Verdict::Rejected => {
                slots[index] = None;
                stats.removed += 1;
            }
        }
    }

    for (slot, taken) in slots.iter_mut().zip(claimed.iter()) {
        if *taken {
            continue;
        }
        let verdict = match slot.as_mut() {
            Some(existing) => merge_slot(strategy, None, Some(existing))?,
            None => continue,
        };
        match verdict {
            Verdict::Retained => stats.tombstoned += 1,
            Verdict::Replaced(next) => {
                *slot = Some(next);
                stats.tombstoned += 1;
            }
            Verdict::Rejected => {
                *slot = None;
                stats.removed += 1;
            }
        }
    }
    Ok(())
}

/// Claim the first unclaimed slot matching `item`.
fn claim<S, T, St>(
    item: &S,
    slots: &[Option<T>],
    claimed: &mut [bool],
    strategy: &mut St,
) -> Result<Option<usize>, St::Error>
where
    St: MergeStrategy<S, T> + ?Sized,
{
    for (index, slot) in slots.iter().enumerate() {
        if claimed[index] {
            continue;
        }
        let Some(candidate) = slot else { continue };
        if strategy.matches(item, candidate)? {
            claimed[index] = true;
            return Ok(Some(index));
        }
    }
    Ok(None)
}
