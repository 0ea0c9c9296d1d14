//! Priority donation engine.
//!
//! Every lock remembers the highest priority among the threads trying to
//! acquire it (`max_priority`), and every thread keeps the locks it holds
//! sorted by that value. A waiter lends its priority to the holder, and
//! transitively along the wait-for chain when the holder is itself blocked
//! on another lock. Releasing a lock pays the loan back: the holder drops to
//! the strongest claim among the locks it still holds, not straight to its
//! base priority.
//!
//! All of this runs on [`SyncTable`] with preemption suppressed by the
//! caller.

use super::table::{LockId, SyncTable};
use crate::thread::{Priority, ThreadId};

impl SyncTable {
    /// Donate `priority` to the holder of `lock`, following the chain of
    /// holders that are themselves blocked on another lock.
    ///
    /// Each hop compares the requesting priority with the next wanted lock's
    /// recorded maximum, never with the weakest link of the chain. A cycle
    /// in the wait-for graph is a caller bug; the walk stops after
    /// `max_threads` hops and logs it.
    pub(crate) fn donate(&mut self, lock: LockId, priority: Priority) {
        let mut next = Some(lock);
        let mut hops = 0;

        while let Some(lock) = next.take() {
            let Some(holder) = self.lock_record(lock).holder else {
                return;
            };

            let record = self.lock_record_mut(lock);
            if Some(priority) > record.max_priority {
                record.max_priority = Some(priority);
                self.reposition_held(holder, lock);
            }

            if priority > self.effective_priority(holder) {
                self.thread_mut(holder).donated_priority = Some(priority);
                log::trace!("lock {}: thread {} boosted to {}", lock, holder, priority);
            }

            if let Some(wanted) = self.thread(holder).wanted_lock {
                if Some(priority) > self.lock_record(wanted).max_priority {
                    hops += 1;
                    if hops > self.config.max_threads {
                        log::warn!("donation chain through lock {} exceeds {} hops; wait-for cycle?", wanted, hops - 1);
                        return;
                    }
                    next = Some(wanted);
                }
            }
        }
    }

    /// Record that `thread` now owns `lock`.
    ///
    /// `pending` is the highest effective priority among threads still
    /// queued on the lock; it becomes the lock's recorded maximum and, when
    /// donation is enabled, is lent to the new holder.
    pub(crate) fn acquired(&mut self, lock: LockId, thread: ThreadId, pending: Option<Priority>) {
        let pending = if self.config.donation { pending } else { None };

        let record = self.lock_record_mut(lock);
        record.holder = Some(thread);
        record.max_priority = pending;

        self.insert_held(thread, lock);
        let record = self.thread_mut(thread);
        record.wanted_lock = None;
        if let Some(pending) = pending {
            if pending > record.effective_priority() {
                record.donated_priority = Some(pending);
            }
        }
    }

    /// Record that the holder gave `lock` up and pay back its donation.
    pub(crate) fn released(&mut self, lock: LockId) {
        if let Some(holder) = self.lock_record(lock).holder {
            self.thread_mut(holder).held_locks.remove(&lock);
            self.refresh_donation(holder);
        }

        let record = self.lock_record_mut(lock);
        record.max_priority = None;
        record.holder = None;
    }

    /// Reset a thread's donation to the strongest claim among the locks it
    /// still holds (the head of its sorted held-lock list).
    pub(crate) fn refresh_donation(&mut self, thread: ThreadId) {
        let donated = self
            .thread(thread)
            .held_locks
            .front()
            .and_then(|&head| self.lock_record(head).max_priority);
        self.thread_mut(thread).donated_priority = donated;
    }

    /// Highest-priority lock first; ties and locks without waiters keep
    /// their arrival order.
    fn insert_held(&mut self, thread: ThreadId, lock: LockId) {
        let key = self.lock_record(lock).max_priority;
        let SyncTable { threads, locks, .. } = self;
        let Some(Some(record)) = threads.get_mut(thread.index()) else {
            return;
        };
        record.held_locks.insert_ordered(lock, |_, other| {
            let other_key = locks[other.index()].as_ref().and_then(|l| l.max_priority);
            key > other_key
        });
    }

    fn reposition_held(&mut self, thread: ThreadId, lock: LockId) {
        if self.thread_mut(thread).held_locks.remove(&lock) {
            self.insert_held(thread, lock);
        }
    }
}
