//! Strict-priority ready queue.

use crate::list::OrderedList;
use crate::thread::{Priority, ThreadId};

/// Threads that are ready to run.
///
/// Priorities are read at selection time rather than at enqueue time,
/// because donation can raise a ready thread's effective priority while it
/// waits for the CPU.
#[derive(Debug, Default)]
pub struct RunQueue {
    threads: OrderedList<ThreadId>,
}

impl RunQueue {
    pub const fn new() -> Self {
        Self {
            threads: OrderedList::new(),
        }
    }

    /// Enqueue at the back: behind every thread of equal priority.
    pub fn push(&mut self, thread: ThreadId) {
        self.threads.push_back(thread);
    }

    /// Remove and return the highest-priority thread, earliest first
    /// among equals.
    pub fn pop_highest<F>(&mut self, priority_of: F) -> Option<ThreadId>
    where
        F: Fn(ThreadId) -> Priority,
    {
        let index = self.highest_index(&priority_of)?;
        self.threads.remove_at(index)
    }

    /// Priority of the best thread in the queue.
    pub fn highest_priority<F>(&self, priority_of: F) -> Option<Priority>
    where
        F: Fn(ThreadId) -> Priority,
    {
        self.threads.iter().map(|&t| priority_of(t)).max()
    }

    pub fn remove(&mut self, thread: ThreadId) -> bool {
        self.threads.remove(&thread)
    }

    pub fn contains(&self, thread: ThreadId) -> bool {
        self.threads.contains(&thread)
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    fn highest_index<F>(&self, priority_of: &F) -> Option<usize>
    where
        F: Fn(ThreadId) -> Priority,
    {
        let mut best: Option<(usize, Priority)> = None;
        for (index, &thread) in self.threads.iter().enumerate() {
            let priority = priority_of(thread);
            // Strictly greater: the first of several equals wins
            if best.map_or(true, |(_, p)| priority > p) {
                best = Some((index, priority));
            }
        }
        best.map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priority_table(thread: ThreadId) -> Priority {
        [10, 30, 20, 30, 5][thread.index()]
    }

    #[test]
    fn test_pop_highest_priority_then_fifo() {
        let mut queue = RunQueue::new();
        for index in 0..5 {
            queue.push(ThreadId::from_index(index));
        }

        let order: [usize; 5] = core::array::from_fn(|_| {
            queue.pop_highest(priority_table).map(ThreadId::index).unwrap()
        });
        assert_eq!(order, [1, 3, 2, 0, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.pop_highest(priority_table), None);
    }

    #[test]
    fn test_highest_priority_peek() {
        let mut queue = RunQueue::new();
        assert_eq!(queue.highest_priority(priority_table), None);

        queue.push(ThreadId::from_index(0));
        queue.push(ThreadId::from_index(2));
        assert_eq!(queue.highest_priority(priority_table), Some(20));
        assert_eq!(queue.len(), 2);

        assert!(queue.remove(ThreadId::from_index(2)));
        assert!(!queue.contains(ThreadId::from_index(2)));
        assert_eq!(queue.highest_priority(priority_table), Some(10));
    }
}
