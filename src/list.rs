//! Ordered-insertion sequence used for every wait queue in the core.

use alloc::collections::VecDeque;
use core::cmp::Ordering;

/// A double-ended sequence with ordered insertion.
///
/// Semaphore waiters, a thread's held locks and condition variable waiters
/// are all kept in one of these.
#[derive(Debug, Clone)]
pub struct OrderedList<T> {
    items: VecDeque<T>,
}

impl<T> OrderedList<T> {
    pub const fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Insert `item` before the first element `e` for which
    /// `before(&item, e)` holds, or at the back if there is none.
    ///
    /// With a strict "greater than" predicate this keeps a descending order
    /// and places `item` after every element that compares equal, so ties
    /// stay in arrival order.
    pub fn insert_ordered<F>(&mut self, item: T, mut before: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let pos = self
            .items
            .iter()
            .position(|existing| before(&item, existing))
            .unwrap_or(self.items.len());
        self.items.insert(pos, item);
    }

    /// Re-sort the whole list. The sort is stable.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.items.make_contiguous().sort_by(compare);
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        self.items.remove(index)
    }
}

impl<T: PartialEq> OrderedList<T> {
    /// Remove the first element equal to `item`. Returns whether one was found.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.items.iter().position(|existing| existing == item) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}
