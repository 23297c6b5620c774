//! Comparator-sorted container.

use std::cmp::Ordering;
use std::fmt;

use concord_engine::TargetCollection;

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A `Vec` kept sorted by a caller-supplied comparator.
///
/// Elements comparing equal to one already present are not inserted, so the
/// container behaves like an ordered set under its comparator. Because the
/// comparator cannot be defaulted, targets of this type are created through
/// [`Reconciler::merge_into_with`](crate::Reconciler::merge_into_with).
pub struct SortedVec<T> {
    items: Vec<T>,
    order: Comparator<T>,
}

impl<T> SortedVec<T> {
    pub fn new(order: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        Self {
            items: Vec::new(),
            order: Box::new(order),
        }
    }

    /// Insert `item` at its sorted position. Returns `false` if an equal
    /// element is already present.
    pub fn insert(&mut self, item: T) -> bool {
        match self
            .items
            .binary_search_by(|existing| (self.order)(existing, &item))
        {
            Ok(_) => false,
            Err(at) => {
                self.items.insert(at, item);
                true
            }
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for SortedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl<'a, T> IntoIterator for &'a SortedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> TargetCollection<T> for SortedVec<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn take_all(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }

    fn put_all(&mut self, items: Vec<T>) {
        for item in items {
            self.insert(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_rejects_equal() {
        let mut sorted = SortedVec::new(|a: &i32, b: &i32| b.cmp(a));
        assert!(sorted.insert(2));
        assert!(sorted.insert(9));
        assert!(sorted.insert(5));
        assert!(!sorted.insert(5));
        assert_eq!(sorted.as_slice(), &[9, 5, 2]);
    }

    #[test]
    fn put_all_sorts_incoming() {
        let mut sorted = SortedVec::new(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        sorted.put_all(vec!["ccc", "a", "bb"]);
        assert_eq!(sorted.into_vec(), ["a", "bb", "ccc"]);
    }

    #[test]
    fn take_all_empties() {
        let mut sorted = SortedVec::new(i32::cmp);
        sorted.put_all(vec![3, 1]);
        assert_eq!(sorted.take_all(), [1, 3]);
        assert!(sorted.is_empty());
        assert_eq!(format!("{sorted:?}"), "[]");
    }
}
