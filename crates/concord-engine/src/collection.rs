//! Target container adapters for the unordered engine.
//!
//! The unordered merge only needs to take every element out of a container
//! and put the survivors back. Positional containers keep the order they
//! are refilled in; set-like containers apply their own ordering and
//! deduplication.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

/// A container the unordered merge can reconcile in place.
pub trait TargetCollection<T> {
    /// Number of elements currently held.
    fn len(&self) -> usize;

    /// Returns `true` if the container holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every element.
    fn clear(&mut self);

    /// Move every element out, in the container's iteration order.
    fn take_all(&mut self) -> Vec<T>;

    /// Insert `items` in order.
    fn put_all(&mut self, items: Vec<T>);
}

impl<T> TargetCollection<T> for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn take_all(&mut self) -> Vec<T> {
        std::mem::take(self)
    }

    fn put_all(&mut self, items: Vec<T>) {
        self.extend(items);
    }
}

impl<T> TargetCollection<T> for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn clear(&mut self) {
        VecDeque::clear(self);
    }

    fn take_all(&mut self) -> Vec<T> {
        self.drain(..).collect()
    }

    fn put_all(&mut self, items: Vec<T>) {
        self.extend(items);
    }
}

impl<T, H> TargetCollection<T> for HashSet<T, H>
where
    T: Eq + Hash,
    H: BuildHasher,
{
    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn clear(&mut self) {
        HashSet::clear(self);
    }

    fn take_all(&mut self) -> Vec<T> {
        self.drain().collect()
    }

    fn put_all(&mut self, items: Vec<T>) {
        self.extend(items);
    }
}

impl<T: Ord> TargetCollection<T> for BTreeSet<T> {
    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn clear(&mut self) {
        BTreeSet::clear(self);
    }

    fn take_all(&mut self) -> Vec<T> {
        std::mem::take(self).into_iter().collect()
    }

    fn put_all(&mut self, items: Vec<T>) {
        self.extend(items);
    }
}
