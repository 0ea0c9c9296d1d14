//! Condition variable.
//!
//! Lets code holding a [`Lock`] sleep until another thread announces that
//! the protected state changed. Semantics are Mesa-style: a signal makes a
//! waiter runnable but does not hand it the lock, so by the time the waiter
//! reacquires it the condition may be false again. Always wait in a loop, or
//! use [`Condvar::wait_while`].
//!
//! Each waiter sleeps on a private one-shot semaphore. Signals pop these in
//! FIFO order; which of several signaled threads runs first is then up to
//! the scheduler's priority order.

use alloc::sync::Arc;

use super::lock::Lock;
use super::semaphore::Semaphore;
use crate::errors::{fatal, ContractViolation};
use crate::kernel::Kernel;
use crate::list::OrderedList;

/// A condition variable used together with a [`Lock`].
///
/// Nothing ties a condition variable to one particular lock; callers must
/// use it with the same lock every time.
pub struct Condvar<'k, K: Kernel + ?Sized> {
    kernel: &'k K,
    waiters: spin::Mutex<OrderedList<Arc<Semaphore<'k, K>>>>,
}

impl<'k, K: Kernel + ?Sized> Condvar<'k, K> {
    pub fn new(kernel: &'k K) -> Self {
        Self {
            kernel,
            waiters: spin::Mutex::new(OrderedList::new()),
        }
    }

    /// Atomically release `lock` and sleep until signaled, then reacquire
    /// `lock` before returning.
    ///
    /// The caller must hold `lock` and must not be in an interrupt handler.
    pub fn wait(&self, lock: &Lock<'k, K>) {
        if self.kernel.in_interrupt() {
            fatal(ContractViolation::BlockingInInterrupt("Condvar::wait"));
        }
        if !lock.held_by_current() {
            fatal(ContractViolation::WaitWithoutLock {
                lock: lock.id(),
                thread: self.kernel.current(),
            });
        }

        let waiter = Arc::new(Semaphore::new(self.kernel, 0));
        self.waiters.lock().push_back(Arc::clone(&waiter));
        lock.release();
        waiter.down();
        lock.acquire();
    }

    /// Wait while `condition` returns true, rechecking it with `lock` held
    /// after every wakeup.
    ///
    /// ```ignore
    /// lock.acquire();
    /// not_empty.wait_while(&lock, || queue.is_empty());
    /// let item = queue.pop();
    /// lock.release();
    /// ```
    pub fn wait_while<F>(&self, lock: &Lock<'k, K>, mut condition: F)
    where
        F: FnMut() -> bool,
    {
        while condition() {
            self.wait(lock);
        }
    }

    /// Wake the longest-waiting thread, if any. The caller must hold `lock`.
    ///
    /// Signals are not remembered: with no waiter this does nothing.
    pub fn signal(&self, lock: &Lock<'k, K>) {
        if !lock.held_by_current() {
            fatal(ContractViolation::SignalWithoutLock {
                lock: lock.id(),
                thread: self.kernel.current(),
            });
        }

        let waiter = self.waiters.lock().pop_front();
        if let Some(waiter) = waiter {
            waiter.up();
        }
    }

    /// Wake every thread currently waiting. The caller must hold `lock`.
    pub fn broadcast(&self, lock: &Lock<'k, K>) {
        while !self.waiters.lock().is_empty() {
            self.signal(lock);
        }
    }

    /// Number of threads waiting and not yet signaled.
    pub fn waiters(&self) -> usize {
        self.waiters.lock().len()
    }
}
