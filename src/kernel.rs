//! Interface the synchronization core consumes from the surrounding kernel.
//!
//! The core owns no threads and never context-switches by itself. It asks
//! the kernel to suspend, resume and preempt threads, and it shares one
//! [`SyncTable`] with the kernel so the scheduler sees donated priorities.

use crate::arch::IntrLevel;
use crate::sync::SyncTable;
use crate::thread::{Priority, ThreadId};

/// The kernel services used by semaphores, locks and condition variables.
///
/// # Contract
///
/// - Exactly one thread executes at a time; interleaving comes only from
///   interrupts and from the blocking calls below.
/// - `block_current` is called with preemption suppressed. It returns once
///   another thread has called `unblock` on the caller and the scheduler has
///   picked it again, with the caller's preemption level restored.
/// - The ready queue honors strict effective priority (as recorded in
///   [`table`](Kernel::table)) with FIFO among equals.
/// - Implementations never call back into the core while holding the table
///   lock, and take the table lock only briefly.
pub trait Kernel: Sync {
    /// Suppress preemption and return the previous level.
    fn suppress(&self) -> IntrLevel;

    /// Restore a level previously returned by [`suppress`](Kernel::suppress).
    fn restore(&self, level: IntrLevel);

    /// Whether the CPU is running an interrupt handler.
    fn in_interrupt(&self) -> bool;

    /// The running thread (the interrupted thread, inside a handler).
    fn current(&self) -> ThreadId;

    /// Suspend the running thread until it is unblocked.
    fn block_current(&self);

    /// Make a blocked thread runnable. Does not preempt the caller.
    fn unblock(&self, thread: ThreadId);

    /// Preempt the caller if a higher-priority thread is ready. Inside an
    /// interrupt handler the yield is deferred until the handler returns.
    fn maybe_yield(&self);

    /// Thread and lock bookkeeping shared with the scheduler.
    fn table(&self) -> &spin::Mutex<SyncTable>;

    /// Effective priority of the running thread.
    fn current_priority(&self) -> Priority {
        let current = self.current();
        self.table().lock().effective_priority(current)
    }
}
