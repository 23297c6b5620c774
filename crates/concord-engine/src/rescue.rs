//! The rescue pool: targets displaced during one ordered merge.
//!
//! When a target is removed from the list it is parked here instead of
//! being dropped. A later source element that matches it reclaims the same
//! object, so re-appearing entities keep their identity instead of being
//! recreated. The pool lives for exactly one merge call.

use tracing::trace;

/// Insertion-ordered collection of displaced targets.
#[derive(Clone, Debug)]
pub struct RescuePool<T> {
    displaced: Vec<T>,
}

impl<T> Default for RescuePool<T> {
    fn default() -> Self {
        Self {
            displaced: Vec::new(),
        }
    }
}

impl<T> RescuePool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of targets waiting to be rescued.
    pub fn len(&self) -> usize {
        self.displaced.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.displaced.is_empty()
    }

    /// Park a displaced target.
    pub fn push(&mut self, target: T) {
        self.displaced.push(target);
        trace!(pooled = self.displaced.len(), "target displaced into rescue pool");
    }

    /// Take the oldest displaced target satisfying `predicate`.
    pub fn rescue<E>(
        &mut self,
        mut predicate: impl FnMut(&T) -> Result<bool, E>,
    ) -> Result<Option<T>, E> {
        let mut found = None;
        for (index, candidate) in self.displaced.iter().enumerate() {
            if predicate(candidate)? {
                found = Some(index);
                break;
            }
        }
        Ok(found.map(|index| {
            trace!(index, "target rescued from pool");
            self.displaced.remove(index)
        }))
    }

    /// Consume the pool, yielding targets that were never rescued.
    pub fn into_inner(self) -> Vec<T> {
        self.displaced
    }
}
