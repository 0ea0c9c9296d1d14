//! Counting semaphore.
//!
//! A nonnegative counter with two atomic operations:
//!
//! - `down` ("P"): wait for the value to become positive, then decrement it.
//! - `up` ("V"): increment the value and wake the highest-priority waiter.
//!
//! Waiters queue by descending effective priority, FIFO among equals. This
//! is the only primitive that blocks; locks and condition variables are
//! built on it.

use crate::arch::InterruptGuard;
use crate::errors::{fatal, ContractViolation};
use crate::kernel::Kernel;
use crate::list::OrderedList;
use crate::thread::{Priority, ThreadId};

struct SemaState {
    value: usize,
    waiters: OrderedList<ThreadId>,
}

/// A counting semaphore bound to a kernel.
pub struct Semaphore<'k, K: Kernel + ?Sized> {
    kernel: &'k K,
    state: spin::Mutex<SemaState>,
}

impl<'k, K: Kernel + ?Sized> Semaphore<'k, K> {
    /// Create a semaphore with the given initial value.
    pub fn new(kernel: &'k K, value: usize) -> Self {
        Self {
            kernel,
            state: spin::Mutex::new(SemaState {
                value,
                waiters: OrderedList::new(),
            }),
        }
    }

    /// Wait for the value to become positive and decrement it.
    ///
    /// May sleep, so it must not be called from an interrupt handler. It may
    /// be called with preemption suppressed; the scheduler re-enables it for
    /// whichever thread runs next while the caller sleeps.
    pub fn down(&self) {
        if self.kernel.in_interrupt() {
            fatal(ContractViolation::BlockingInInterrupt("Semaphore::down"));
        }

        let _guard = InterruptGuard::new(self.kernel);
        while !self.down_or_sleep() {}
    }

    /// Take a unit if one is available; otherwise queue the caller and
    /// sleep once. Returns whether the unit was taken.
    ///
    /// A woken caller is not guaranteed the unit: another thread may have
    /// taken it first, so callers retry. The caller suppresses preemption.
    pub(crate) fn down_or_sleep(&self) -> bool {
        let current = self.kernel.current();
        {
            let mut state = self.state.lock();
            if state.value > 0 {
                state.value -= 1;
                return true;
            }

            let table = self.kernel.table().lock();
            let priority = table.effective_priority(current);
            state.waiters.insert_ordered(current, |_, other| {
                priority > table.effective_priority(*other)
            });
        }
        log::trace!("thread {} sleeping on semaphore", current);
        self.kernel.block_current();
        false
    }

    /// Decrement the value if it is positive, without blocking.
    ///
    /// Returns whether the decrement happened. Safe to call from an
    /// interrupt handler.
    pub fn try_down(&self) -> bool {
        let _guard = InterruptGuard::new(self.kernel);
        let mut state = self.state.lock();
        if state.value > 0 {
            state.value -= 1;
            true
        } else {
            false
        }
    }

    /// Increment the value and wake the highest-priority waiter, if any.
    ///
    /// The woken thread preempts the caller right away when it outranks it
    /// (after the handler returns, inside an interrupt handler). Safe to
    /// call from an interrupt handler.
    pub fn up(&self) {
        let _guard = InterruptGuard::new(self.kernel);

        let woken = {
            let mut state = self.state.lock();
            // Increment first so the woken thread finds the value positive
            state.value += 1;
            if state.waiters.is_empty() {
                None
            } else {
                // Donation may have raised a waiter since it queued
                let table = self.kernel.table().lock();
                state.waiters.sort_by(|a, b| {
                    table.effective_priority(*b).cmp(&table.effective_priority(*a))
                });
                state.waiters.pop_front()
            }
        };

        if let Some(thread) = woken {
            log::trace!("waking thread {} from semaphore", thread);
            self.kernel.unblock(thread);
            self.kernel.maybe_yield();
        }
    }

    /// Current value.
    pub fn value(&self) -> usize {
        self.state.lock().value
    }

    /// Number of threads sleeping on the semaphore.
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Highest effective priority among the sleeping threads.
    pub(crate) fn max_waiter_priority(&self) -> Option<Priority> {
        let state = self.state.lock();
        let table = self.kernel.table().lock();
        state
            .waiters
            .iter()
            .map(|&thread| table.effective_priority(thread))
            .max()
    }

    pub(crate) fn kernel(&self) -> &'k K {
        self.kernel
    }
}
