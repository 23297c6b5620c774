//! Fluent reconciliation API over the engine.

use std::fmt::Debug;

use concord_engine::{
    merge_mixed_with, merge_ordered_with, merge_slot, MergeStats, MergeStrategy, Merged,
    TargetCollection, Verdict,
};
use tracing::debug;

use crate::error::{CallbackError, ReconcileError, ReconcileResult};
use crate::options::{MergeOptions, MissingSource};

pub type MatchFn<'a, S, T> = Box<dyn FnMut(&S, &T) -> Result<bool, CallbackError> + 'a>;
pub type MergeFn<'a, S, T> =
    Box<dyn FnMut(Option<&S>, Option<&mut T>) -> Result<Merged<T>, CallbackError> + 'a>;
pub type FilterFn<'a, T> = Box<dyn FnMut(&T) -> Result<bool, CallbackError> + 'a>;
pub type AfterFn<'a, C> = Box<dyn FnMut(&mut C) -> Result<(), CallbackError> + 'a>;

/// The caller's callbacks, presented to the engine as a strategy.
pub(crate) struct Callbacks<'a, S, T> {
    matches: MatchFn<'a, S, T>,
    merge: MergeFn<'a, S, T>,
    filter: Option<FilterFn<'a, T>>,
    preserve_absent: bool,
}

impl<S, T> MergeStrategy<S, T> for Callbacks<'_, S, T> {
    type Error = CallbackError;

    fn matches(&mut self, source: &S, target: &T) -> Result<bool, CallbackError> {
        (self.matches)(source, target)
    }

    fn merge(
        &mut self,
        source: Option<&S>,
        target: Option<&mut T>,
    ) -> Result<Merged<T>, CallbackError> {
        if source.is_none() && target.is_some() && self.preserve_absent {
            return Ok(Merged::Retain);
        }
        (self.merge)(source, target)
    }

    fn keep(&mut self, merged: &T) -> Result<bool, CallbackError> {
        match self.filter.as_mut() {
            Some(filter) => filter(merged),
            None => Ok(true),
        }
    }
}

/// A configured reconciliation: match and merge callbacks, an optional
/// result filter, an optional post-merge hook, and [`MergeOptions`].
///
/// `C` is the target container type the hook sees. Use [`Reconciler::list`]
/// for `Vec` targets, which also unlocks [`merge_ordered`](Self::merge_ordered).
///
/// ```
/// use concord_sdk::{Merged, Reconciler};
///
/// let mut reconciler = Reconciler::list(
///     |s: &u32, t: &(u32, bool)| Ok(*s == t.0),
///     |s: Option<&u32>, t: Option<&mut (u32, bool)>| {
///         Ok(match (s, t) {
///             (Some(_), Some(t)) => {
///                 t.1 = true;
///                 Merged::Retain
///             }
///             (Some(s), None) => Merged::Replace((*s, false)),
///             (None, _) => Merged::Discard,
///         })
///     },
/// );
/// let mut list = vec![(1, false), (3, false)];
/// let stats = reconciler.merge_ordered(Some(&[2u32, 1]), &mut list).unwrap();
/// assert_eq!(list, [(2, false), (1, true)]);
/// assert_eq!(stats.created, 1);
/// ```
pub struct Reconciler<'a, S, T, C> {
    pub(crate) callbacks: Callbacks<'a, S, T>,
    pub(crate) after: Option<AfterFn<'a, C>>,
    pub(crate) options: MergeOptions,
    pub(crate) stats: MergeStats,
}

impl<'a, S, T, C> Reconciler<'a, S, T, C> {
    pub fn new(
        matches: impl FnMut(&S, &T) -> Result<bool, CallbackError> + 'a,
        merge: impl FnMut(Option<&S>, Option<&mut T>) -> Result<Merged<T>, CallbackError> + 'a,
    ) -> Self {
        Self {
            callbacks: Callbacks {
                matches: Box::new(matches),
                merge: Box::new(merge),
                filter: None,
                preserve_absent: false,
            },
            after: None,
            options: MergeOptions::default(),
            stats: MergeStats::default(),
        }
    }

    /// Keep only merged elements for which `keep` returns `true`.
    pub fn filter(mut self, keep: impl FnMut(&T) -> Result<bool, CallbackError> + 'a) -> Self {
        self.callbacks.filter = Some(Box::new(keep));
        self
    }

    /// Run `hook` on the finished target container.
    pub fn after(mut self, hook: impl FnMut(&mut C) -> Result<(), CallbackError> + 'a) -> Self {
        self.after = Some(Box::new(hook));
        self
    }

    pub fn options(mut self, options: MergeOptions) -> Self {
        self.callbacks.preserve_absent = options.preserve_absent;
        self.options = options;
        self
    }

    pub fn merge_options(&self) -> &MergeOptions {
        &self.options
    }

    /// Statistics of the most recent terminal call.
    pub fn last_stats(&self) -> MergeStats {
        self.stats
    }

    /// Merge a single optional source value into a single optional target.
    ///
    /// A matching pair is merged in place. Otherwise an existing target is
    /// offered as a tombstone and a present source creates a new value,
    /// which takes precedence over a surviving tombstone. On error `target`
    /// still holds its value.
    pub fn merge_one(
        &mut self,
        source: Option<&S>,
        target: &mut Option<T>,
    ) -> ReconcileResult<MergeStats>
    where
        S: Debug,
        T: Debug,
    {
        let mut stats = MergeStats::default();
        match settle_one(&mut self.callbacks, source, target, &mut stats) {
            Ok(merged) => {
                *target = merged;
                self.stats = stats;
                Ok(stats)
            }
            Err(cause) => Err(self.fail(cause, &source, &*target)),
        }
    }

    pub(crate) fn fail(
        &self,
        cause: CallbackError,
        source: &dyn Debug,
        target: &dyn Debug,
    ) -> ReconcileError {
        debug!(error = %cause, "merge callback failed");
        ReconcileError::callback(cause, source, target, self.options.snapshot_limit)
    }

    /// Apply `missing_source` to the target of an absent source.
    pub(crate) fn absent_source<X>(&self, target: &mut X) -> MergeStats
    where
        X: TargetCollection<T>,
    {
        let mut stats = MergeStats::default();
        if self.options.missing_source == MissingSource::Clear {
            stats.removed = target.len();
            target.clear();
        }
        debug!(
            missing_source = ?self.options.missing_source,
            removed = stats.removed,
            "source absent"
        );
        stats
    }
}

impl<'a, S, T> Reconciler<'a, S, T, Vec<T>> {
    /// A reconciler whose targets are `Vec<T>`.
    pub fn list(
        matches: impl FnMut(&S, &T) -> Result<bool, CallbackError> + 'a,
        merge: impl FnMut(Option<&S>, Option<&mut T>) -> Result<Merged<T>, CallbackError> + 'a,
    ) -> Self {
        Self::new(matches, merge)
    }

    /// Order-repairing merge. Afterwards `target` follows the source order.
    ///
    /// If a callback fails, `target` keeps every element it held, merged
    /// or not, and the error is returned.
    pub fn merge_ordered<'s, I>(
        &mut self,
        source: Option<I>,
        target: &mut Vec<T>,
    ) -> ReconcileResult<MergeStats>
    where
        I: IntoIterator<Item = &'s S>,
        S: Debug + 's,
        T: Debug,
    {
        let Some(source) = source else {
            self.stats = self.absent_source(target);
            return Ok(self.stats);
        };
        let items: Vec<&S> = source.into_iter().collect();

        let after = &mut self.after;
        let outcome = merge_ordered_with(
            items.iter().copied(),
            &mut *target,
            &mut self.callbacks,
            |list| run_after(after, list),
        );
        match outcome {
            Ok(stats) => {
                self.stats = stats;
                Ok(stats)
            }
            Err(cause) => Err(self.fail(cause, &items, &*target)),
        }
    }
}

impl<'a, S, T, C> Reconciler<'a, S, T, C>
where
    C: TargetCollection<T>,
{
    /// Unordered merge into `target`.
    ///
    /// If a callback fails, `target` keeps every element it held, merged
    /// or not, and the error is returned.
    pub fn merge_into<'s, I>(
        &mut self,
        source: Option<I>,
        target: &mut C,
    ) -> ReconcileResult<MergeStats>
    where
        I: IntoIterator<Item = &'s S>,
        S: Debug + 's,
        C: Debug,
    {
        let Some(source) = source else {
            self.stats = self.absent_source(target);
            return Ok(self.stats);
        };
        let items: Vec<&S> = source.into_iter().collect();

        let after = &mut self.after;
        let outcome = merge_mixed_with(
            Some(items.iter().copied()),
            &mut *target,
            &mut self.callbacks,
            |container| run_after(after, container),
        );
        match outcome {
            Ok(stats) => {
                self.stats = stats;
                Ok(stats)
            }
            Err(cause) => Err(self.fail(cause, &items, &*target)),
        }
    }

    /// Unordered merge into `target`, first filling an empty slot with a
    /// container built by `factory`.
    pub fn merge_into_with<'s, I>(
        &mut self,
        source: Option<I>,
        target: &mut Option<C>,
        factory: impl FnOnce() -> C,
    ) -> ReconcileResult<MergeStats>
    where
        I: IntoIterator<Item = &'s S>,
        S: Debug + 's,
        C: Debug,
    {
        self.merge_into(source, target.get_or_insert_with(factory))
    }
}

pub(crate) fn run_after<C>(
    after: &mut Option<AfterFn<'_, C>>,
    target: &mut C,
) -> Result<(), CallbackError> {
    match after.as_mut() {
        Some(hook) => hook(target),
        None => Ok(()),
    }
}

fn settle_one<S, T>(
    callbacks: &mut Callbacks<'_, S, T>,
    source: Option<&S>,
    target: &mut Option<T>,
    stats: &mut MergeStats,
) -> Result<Option<T>, CallbackError> {
    let matched = match (source, target.as_ref()) {
        (Some(item), Some(existing)) => callbacks.matches(item, existing)?,
        _ => false,
    };
    if matched {
        let verdict = merge_slot(callbacks, source, target.as_mut())?;
        match verdict {
            Verdict::Retained => stats.matched += 1,
            Verdict::Replaced(_) => stats.replaced += 1,
            Verdict::Rejected => stats.removed += 1,
        }
        return Ok(verdict.resolve(target.take()));
    }

    let tombstone = match target.as_mut() {
        Some(existing) => merge_slot(callbacks, None, Some(existing))?,
        None => Verdict::Rejected,
    };
    let created = match source {
        Some(item) => merge_slot(callbacks, Some(item), None)?,
        None => Verdict::Rejected,
    };

    let had_target = target.is_some();
    let previous = tombstone.resolve(target.take());
    if had_target && previous.is_none() {
        stats.removed += 1;
    }
    match created {
        Verdict::Replaced(next) => {
            stats.created += 1;
            if previous.is_some() {
                stats.removed += 1;
            }
            Ok(Some(next))
        }
        Verdict::Retained | Verdict::Rejected => {
            if source.is_some() {
                stats.skipped += 1;
            }
            if previous.is_some() {
                stats.tombstoned += 1;
            }
            Ok(previous)
        }
    }
}
