//! Lock with priority donation.
//!
//! A lock is a binary semaphore with an owner: only the thread that
//! acquired it may release it, and it cannot be acquired recursively. While
//! a thread waits for a lock, the holder runs at the waiter's priority
//! (see [`donation`](super::donation)), so a medium-priority thread cannot
//! starve a high-priority one by preempting the low-priority holder.

use super::semaphore::Semaphore;
use super::table::LockId;
use crate::arch::InterruptGuard;
use crate::errors::{fatal, ContractViolation};
use crate::kernel::Kernel;
use crate::thread::{Priority, ThreadId};

/// A non-recursive sleeping lock.
///
/// # Examples
///
/// ```ignore
/// let lock = Lock::new(&kernel);
/// lock.acquire();
/// // critical section
/// lock.release();
/// ```
pub struct Lock<'k, K: Kernel + ?Sized> {
    id: LockId,
    sema: Semaphore<'k, K>,
}

impl<'k, K: Kernel + ?Sized> Lock<'k, K> {
    /// Create an unlocked lock.
    pub fn new(kernel: &'k K) -> Self {
        let id = kernel.table().lock().register_lock();
        Self {
            id,
            sema: Semaphore::new(kernel, 1),
        }
    }

    pub fn id(&self) -> LockId {
        self.id
    }

    /// Acquire the lock, sleeping until it is available.
    ///
    /// Before each sleep the caller donates its priority to the holder and,
    /// transitively, to whatever the holder is waiting for.
    pub fn acquire(&self) {
        let kernel = self.sema.kernel();
        if kernel.in_interrupt() {
            fatal(ContractViolation::BlockingInInterrupt("Lock::acquire"));
        }
        let current = kernel.current();
        if self.held_by_current() {
            fatal(ContractViolation::RecursiveAcquire {
                lock: self.id,
                thread: current,
            });
        }

        let _guard = InterruptGuard::new(kernel);
        // Donate before every sleep: the lock may have changed hands while
        // this thread was being woken.
        loop {
            {
                let mut table = kernel.table().lock();
                table.thread_mut(current).wanted_lock = Some(self.id);
                if table.config().donation {
                    let priority = table.effective_priority(current);
                    table.donate(self.id, priority);
                }
            }
            if self.sema.down_or_sleep() {
                break;
            }
        }

        let pending = self.sema.max_waiter_priority();
        let mut table = kernel.table().lock();
        table.acquired(self.id, current, pending);
        log::debug!(
            "thread {} acquired lock {} (priority {})",
            current,
            self.id,
            table.effective_priority(current)
        );
    }

    /// Acquire the lock if it is free, without sleeping.
    ///
    /// Never donates: a thread that gets the lock at once cannot be
    /// inverted by it.
    pub fn try_acquire(&self) -> bool {
        let kernel = self.sema.kernel();
        let current = kernel.current();
        if self.held_by_current() {
            fatal(ContractViolation::RecursiveAcquire {
                lock: self.id,
                thread: current,
            });
        }

        let _guard = InterruptGuard::new(kernel);
        if !self.sema.try_down() {
            return false;
        }
        let pending = self.sema.max_waiter_priority();
        kernel.table().lock().acquired(self.id, current, pending);
        true
    }

    /// Release the lock, which the caller must hold.
    ///
    /// The caller falls back to the highest claim among the locks it still
    /// holds, then the best waiter is woken and may preempt it.
    pub fn release(&self) {
        let kernel = self.sema.kernel();
        let current = kernel.current();
        if !self.held_by_current() {
            fatal(ContractViolation::ReleaseNotHeld {
                lock: self.id,
                thread: current,
            });
        }

        let _guard = InterruptGuard::new(kernel);
        {
            let mut table = kernel.table().lock();
            table.released(self.id);
            log::debug!(
                "thread {} released lock {} (priority {})",
                current,
                self.id,
                table.effective_priority(current)
            );
        }
        self.sema.up();
    }

    /// Whether the running thread holds the lock.
    ///
    /// Asking whether some other thread holds it would be racy.
    pub fn held_by_current(&self) -> bool {
        let kernel = self.sema.kernel();
        let current = kernel.current();
        kernel.table().lock().lock_record(self.id).holder == Some(current)
    }

    /// Current holder, for diagnostics.
    pub fn holder(&self) -> Option<ThreadId> {
        self.sema.kernel().table().lock().lock_record(self.id).holder
    }

    /// Highest priority among threads waiting for the lock.
    pub fn max_priority(&self) -> Option<Priority> {
        self.sema.kernel().table().lock().lock_record(self.id).max_priority
    }
}

impl<K: Kernel + ?Sized> Drop for Lock<'_, K> {
    fn drop(&mut self) {
        self.sema.kernel().table().lock().retire_lock(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimKernel;

    #[test]
    fn test_acquire_release_uncontended() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        assert_eq!(lock.holder(), None);
        assert!(!lock.held_by_current());

        lock.acquire();
        assert!(lock.held_by_current());
        assert_eq!(lock.holder(), Some(kernel.current()));
        assert_eq!(lock.max_priority(), None);

        lock.release();
        assert!(!lock.held_by_current());
        assert_eq!(lock.holder(), None);
        assert!(kernel.intr_level().is_enabled());
    }

    #[test]
    fn test_try_acquire() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);

        assert!(lock.try_acquire());
        assert!(lock.held_by_current());
        let main = kernel.current();
        assert_eq!(kernel.table().lock().thread(main).held_locks().count(), 1);

        lock.release();
        assert_eq!(kernel.table().lock().thread(main).held_locks().count(), 0);
    }

    #[test]
    #[should_panic(expected = "already holds lock")]
    fn test_recursive_acquire_is_fatal() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        lock.acquire();
        lock.acquire();
    }

    #[test]
    #[should_panic(expected = "already holds lock")]
    fn test_recursive_try_acquire_is_fatal() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        lock.acquire();
        lock.try_acquire();
    }

    #[test]
    #[should_panic(expected = "does not hold")]
    fn test_release_without_holding_is_fatal() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        lock.release();
    }

    #[test]
    #[should_panic(expected = "Lock::acquire may block")]
    fn test_acquire_in_interrupt_is_fatal() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        kernel.interrupt(|| lock.acquire());
    }

    #[test]
    fn test_dropping_a_held_lock_detaches_it() {
        let kernel = SimKernel::new();
        let main = kernel.current();
        {
            let lock = Lock::new(&kernel);
            lock.acquire();
        }
        assert_eq!(kernel.table().lock().thread(main).held_locks().count(), 0);
    }
}
