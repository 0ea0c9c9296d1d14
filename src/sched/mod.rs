//! Scheduling policy pieces shared by the core and its host kernel.
//!
//! Threads are scheduled by strict priority with FIFO among equals. The
//! core itself never picks threads; it only relies on the kernel honoring
//! this order (see [`Kernel`](crate::kernel::Kernel)).

pub mod run_queue;

pub use run_queue::RunQueue;

/// Priority levels for threads.
pub mod priority {
    use crate::thread::Priority;

    /// Lowest priority
    pub const MIN: Priority = 0;

    /// Default priority for newly created threads
    pub const DEFAULT: Priority = 31;

    /// Highest priority
    pub const MAX: Priority = 63;
}
