#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(unreachable_pub)]

//! Sleeping synchronization primitives with priority donation for a
//! single-CPU preemptive kernel.
//!
//! The crate provides the synchronization core of a small kernel whose
//! scheduler always runs the highest-priority ready thread:
//!
//! - [`Semaphore`]: counting semaphore whose waiters wake in priority order
//! - [`Lock`]: non-recursive lock that lends a waiter's priority to the
//!   holder, along the whole chain of holders, to prevent priority inversion
//! - [`Condvar`]: Mesa-style condition variable
//!
//! The core owns no threads. It runs on top of a [`Kernel`] implementation
//! that provides preemption control, blocking, wakeup and the shared
//! [`SyncTable`] of thread and lock records.
//!
//! # Features
//!
//! - `std-shim`: Enable [`sim::SimKernel`], a host simulation of a
//!   uniprocessor kernel, for testing outside the target
//!
//! # Quick Start
//!
//! ```ignore
//! use preemptive_sync::sim::SimKernel;
//! use preemptive_sync::{Condvar, Lock};
//!
//! let kernel = SimKernel::new();
//! let lock = Lock::new(&kernel);
//! let ready = Condvar::new(&kernel);
//!
//! kernel.scope(|s| {
//!     kernel.spawn(s, "consumer", 40, || {
//!         lock.acquire();
//!         ready.wait(&lock);
//!         lock.release();
//!     }).unwrap();
//!
//!     lock.acquire();
//!     ready.signal(&lock);
//!     lock.release();
//! });
//! ```

// Core modules
pub mod arch;
pub mod config;
pub mod errors;
pub mod kernel;
pub mod list;
pub mod sched;
pub mod sync;
pub mod thread;

#[cfg(any(test, feature = "std-shim"))]
pub mod sim;

#[cfg(test)]
mod tests;

#[cfg(any(test, feature = "std-shim"))]
extern crate std;

extern crate alloc;

// ============================================================================
// Public API
// ============================================================================

// Preemption control
pub use arch::{without_preemption, InterruptGuard, IntrLevel};

// Kernel interface
pub use kernel::Kernel;

// Configuration
pub use config::SyncConfig;

// Scheduling
pub use sched::{priority, RunQueue};

// Threads
pub use thread::{Priority, ThreadId, ThreadRecord, ThreadState};

// Primitives
pub use sync::{Condvar, Lock, LockId, LockRecord, Semaphore, SyncTable};

// Errors
pub use errors::{fatal, ContractViolation, SpawnError, SyncError, SyncResult};
