//! # Synchronization primitives.
//!
//! Sleeping primitives for a single-CPU kernel whose scheduler picks the
//! highest-priority ready thread:
//!
//! - [`Semaphore`]: a counter with `down` (wait until positive, decrement)
//!   and `up` (increment, wake the best waiter). The only primitive that
//!   blocks; the other two are built on it.
//! - [`Lock`]: a binary semaphore with an owner. A thread blocked on a lock
//!   donates its priority to the holder, transitively along the chain of
//!   holders, so a low-priority holder cannot stall a high-priority waiter
//!   behind medium-priority work.
//! - [`Condvar`]: Mesa-style condition variable used with a [`Lock`].
//!
//! | Primitive     | Blocks? | Wake order                     | Interrupt handler |
//! |---------------|---------|--------------------------------|-------------------|
//! | [`Semaphore`] | Yes     | Priority, FIFO among equals    | `up`, `try_down`  |
//! | [`Lock`]      | Yes     | Priority, FIFO among equals    | No                |
//! | [`Condvar`]   | Yes     | FIFO per signal                | No                |
//!
//! Shared state is protected by suppressing preemption through the
//! [`Kernel`](crate::kernel::Kernel) (see [`InterruptGuard`]), plus short
//! spin locks around the data itself. Thread and lock bookkeeping for
//! donation lives in the [`SyncTable`].
//!
//! [`InterruptGuard`]: crate::arch::InterruptGuard

pub mod condvar;
pub mod donation;
pub mod lock;
pub mod semaphore;
pub mod table;

pub use condvar::Condvar;
pub use lock::Lock;
pub use semaphore::Semaphore;
pub use table::{LockId, LockRecord, SyncTable};
