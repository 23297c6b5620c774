//! Caller-supplied behaviour: matching, merging, and filtering.
//!
//! The engine never inspects target identity or equality itself. Every
//! decision it makes is driven by a [`MergeStrategy`]: whether a source and a
//! target denote the same entity, what the merged target looks like, and
//! whether the merged result survives.

use std::convert::Infallible;
use std::marker::PhantomData;

/// The outcome of one merge-function call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Merged<T> {
    /// The existing target survives at its slot, possibly mutated in place.
    ///
    /// With no existing target (the create case) this yields nothing.
    Retain,
    /// A different object takes the slot.
    Replace(T),
    /// Nothing survives at this slot.
    Discard,
}

/// Strategy consulted by both merge algorithms.
///
/// `merge` is called with:
/// - `(Some(source), Some(target))` for a matched pair,
/// - `(Some(source), None)` when a new target must be created,
/// - `(None, Some(target))` for a target with no counterpart (tombstone).
///
/// It is never called with both arguments absent.
pub trait MergeStrategy<S, T> {
    /// Error raised by a failing callback. The engine propagates it untouched.
    type Error;

    /// Whether `source` and `target` denote the same logical entity.
    fn matches(&mut self, source: &S, target: &T) -> Result<bool, Self::Error>;

    /// Produce the new state of a slot.
    fn merge(
        &mut self,
        source: Option<&S>,
        target: Option<&mut T>,
    ) -> Result<Merged<T>, Self::Error>;

    /// Whether a merged element is kept. Rejected elements are treated as
    /// deleted regardless of what `merge` returned.
    fn keep(&mut self, _merged: &T) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl<S, T, St> MergeStrategy<S, T> for &mut St
where
    St: MergeStrategy<S, T> + ?Sized,
{
    type Error = St::Error;

    fn matches(&mut self, source: &S, target: &T) -> Result<bool, Self::Error> {
        (**self).matches(source, target)
    }

    fn merge(
        &mut self,
        source: Option<&S>,
        target: Option<&mut T>,
    ) -> Result<Merged<T>, Self::Error> {
        (**self).merge(source, target)
    }

    fn keep(&mut self, merged: &T) -> Result<bool, Self::Error> {
        (**self).keep(merged)
    }
}

/// Filter that keeps every merged element.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAll;

/// Result filter used by [`FnStrategy`].
pub trait Filter<T> {
    fn keep(&mut self, merged: &T) -> bool;
}

impl<T> Filter<T> for KeepAll {
    fn keep(&mut self, _merged: &T) -> bool {
        true
    }
}

impl<T, F> Filter<T> for F
where
    F: FnMut(&T) -> bool,
{
    fn keep(&mut self, merged: &T) -> bool {
        self(merged)
    }
}

/// A [`MergeStrategy`] assembled from infallible closures.
///
/// ```
/// use concord_engine::{merge_ordered, FnStrategy, Merged};
///
/// let source = vec!["a".to_string(), "b".to_string()];
/// let mut target = vec!["b".to_string()];
/// let mut strategy = FnStrategy::new(
///     |s: &String, t: &String| s == t,
///     |s: Option<&String>, t: Option<&mut String>| match (s, t) {
///         (Some(s), None) => Merged::Replace(s.clone()),
///         (Some(_), Some(_)) => Merged::Retain,
///         (None, _) => Merged::Discard,
///     },
/// );
/// let stats = merge_ordered(&source, &mut target, &mut strategy).unwrap();
/// assert_eq!(target, source);
/// assert_eq!(stats.created, 1);
/// ```
#[derive(Clone, Debug)]
pub struct FnStrategy<M, G, K = KeepAll> {
    matches: M,
    merge: G,
    keep: K,
}

impl<M, G> FnStrategy<M, G> {
    /// Build a strategy from a match predicate and a merge function.
    pub fn new<S, T>(matches: M, merge: G) -> Self
    where
        M: FnMut(&S, &T) -> bool,
        G: FnMut(Option<&S>, Option<&mut T>) -> Merged<T>,
    {
        Self {
            matches,
            merge,
            keep: KeepAll,
        }
    }
}

impl<M, G, K> FnStrategy<M, G, K> {
    /// Attach a result filter.
    pub fn filter<T, F>(self, keep: F) -> FnStrategy<M, G, F>
    where
        F: FnMut(&T) -> bool,
    {
        FnStrategy {
            matches: self.matches,
            merge: self.merge,
            keep,
        }
    }
}

impl<S, T, M, G, K> MergeStrategy<S, T> for FnStrategy<M, G, K>
where
    M: FnMut(&S, &T) -> bool,
    G: FnMut(Option<&S>, Option<&mut T>) -> Merged<T>,
    K: Filter<T>,
{
    type Error = Infallible;

    fn matches(&mut self, source: &S, target: &T) -> Result<bool, Infallible> {
        Ok((self.matches)(source, target))
    }

    fn merge(
        &mut self,
        source: Option<&S>,
        target: Option<&mut T>,
    ) -> Result<Merged<T>, Infallible> {
        Ok((self.merge)(source, target))
    }

    fn keep(&mut self, merged: &T) -> Result<bool, Infallible> {
        Ok(self.keep.keep(merged))
    }
}

/// Fallible result filter used by [`TryFnStrategy`].
pub trait TryFilter<T, E> {
    fn keep(&mut self, merged: &T) -> Result<bool, E>;
}

impl<T, E> TryFilter<T, E> for KeepAll {
    fn keep(&mut self, _merged: &T) -> Result<bool, E> {
        Ok(true)
    }
}

impl<T, E, F> TryFilter<T, E> for F
where
    F: FnMut(&T) -> Result<bool, E>,
{
    fn keep(&mut self, merged: &T) -> Result<bool, E> {
        self(merged)
    }
}

/// A [`MergeStrategy`] assembled from closures that can fail with `E`.
///
/// The first error any closure returns aborts the merge and is handed back
/// to the caller unchanged.
pub struct TryFnStrategy<M, G, E, K = KeepAll> {
    matches: M,
    merge: G,
    keep: K,
    _error: PhantomData<fn() -> E>,
}

impl<M, G, E> TryFnStrategy<M, G, E> {
    pub fn new<S, T>(matches: M, merge: G) -> Self
    where
        M: FnMut(&S, &T) -> Result<bool, E>,
        G: FnMut(Option<&S>, Option<&mut T>) -> Result<Merged<T>, E>,
    {
        Self {
            matches,
            merge,
            keep: KeepAll,
            _error: PhantomData,
        }
    }
}

impl<M, G, E, K> TryFnStrategy<M, G, E, K> {
    /// Attach a fallible result filter.
    pub fn filter<T, F>(self, keep: F) -> TryFnStrategy<M, G, E, F>
    where
        F: FnMut(&T) -> Result<bool, E>,
    {
        TryFnStrategy {
            matches: self.matches,
            merge: self.merge,
            keep,
            _error: PhantomData,
        }
    }
}

impl<S, T, M, G, E, K> MergeStrategy<S, T> for TryFnStrategy<M, G, E, K>
where
    M: FnMut(&S, &T) -> Result<bool, E>,
    G: FnMut(Option<&S>, Option<&mut T>) -> Result<Merged<T>, E>,
    K: TryFilter<T, E>,
{
    type Error = E;

    fn matches(&mut self, source: &S, target: &T) -> Result<bool, E> {
        (self.matches)(source, target)
    }

    fn merge(&mut self, source: Option<&S>, target: Option<&mut T>) -> Result<Merged<T>, E> {
        (self.merge)(source, target)
    }

    fn keep(&mut self, merged: &T) -> Result<bool, E> {
        self.keep.keep(merged)
    }
}

/// What became of a single slot after merging and filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict<T> {
    /// The existing target survives; its identity is unchanged.
    Retained,
    /// A different object takes the slot.
    Replaced(T),
    /// The slot is empty: the merge discarded it or the filter rejected it.
    Rejected,
}

impl<T> Verdict<T> {
    /// Resolve the verdict against the owned original target.
    pub fn resolve(self, original: Option<T>) -> Option<T> {
        match self {
            Verdict::Retained => original,
            Verdict::Replaced(next) => Some(next),
            Verdict::Rejected => None,
        }
    }
}

/// Merge one slot and run the filter over the result.
///
/// `Retain` without a target is rejected, since there is nothing to retain.
pub fn merge_slot<S, T, St>(
    strategy: &mut St,
    source: Option<&S>,
    mut target: Option<&mut T>,
) -> Result<Verdict<T>, St::Error>
where
    St: MergeStrategy<S, T> + ?Sized,
{
    let verdict = match strategy.merge(source, target.as_deref_mut())? {
        Merged::Retain => match target {
            Some(existing) => {
                if strategy.keep(existing)? {
                    Verdict::Retained
                } else {
                    Verdict::Rejected
                }
            }
            None => Verdict::Rejected,
        },
        Merged::Replace(next) => {
            if strategy.keep(&next)? {
                Verdict::Replaced(next)
            } else {
                Verdict::Rejected
            }
        }
        Merged::Discard => Verdict::Rejected,
    };
    Ok(verdict)
}
