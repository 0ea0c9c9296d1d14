//! Error handling for the synchronization core.
//!
//! Only thread registration reports recoverable errors. Everything else that
//! can go wrong is a broken calling contract (releasing a lock you do not
//! hold, blocking from an interrupt handler, ...), which corrupts the
//! donation invariants if allowed to continue, so it is reported through
//! [`fatal`] and halts the caller.

#![allow(clippy::uninlined_format_args)]

use core::fmt;
use alloc::string::String;

use crate::sync::LockId;
use crate::thread::ThreadId;

/// Result type for fallible synchronization-core operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Umbrella error type for the synchronization core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Thread registration errors
    Spawn(SpawnError),
    /// Calling-contract violations
    Contract(ContractViolation),
}

/// Errors that can occur when registering a thread with the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// Live thread limit reached
    TooManyThreads,
    /// Priority outside `priority::MIN..=priority::MAX`
    InvalidPriority(u8),
    /// Thread name is empty
    InvalidName(String),
}

/// Violations of the calling contract of semaphores, locks and condition
/// variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// The caller already holds the lock it is trying to acquire
    RecursiveAcquire { lock: LockId, thread: ThreadId },
    /// The caller is releasing a lock it does not hold
    ReleaseNotHeld { lock: LockId, thread: ThreadId },
    /// `Condvar::wait` without holding the associated lock
    WaitWithoutLock { lock: LockId, thread: ThreadId },
    /// `Condvar::signal` or `broadcast` without holding the associated lock
    SignalWithoutLock { lock: LockId, thread: ThreadId },
    /// A blocking operation was called from interrupt context
    BlockingInInterrupt(&'static str),
    /// Thread id does not name a live thread
    UnknownThread(ThreadId),
    /// Lock id does not name a live lock
    UnknownLock(LockId),
    /// `unblock` on a thread that is not blocked
    NotBlocked(ThreadId),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Spawn(e) => write!(f, "Thread spawn error: {}", e),
            SyncError::Contract(e) => write!(f, "Contract violation: {}", e),
        }
    }
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::TooManyThreads => write!(f, "Maximum number of threads reached"),
            SpawnError::InvalidPriority(prio) => write!(f, "Invalid priority: {}", prio),
            SpawnError::InvalidName(name) => write!(f, "Invalid thread name: {:?}", name),
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::RecursiveAcquire { lock, thread } => {
                write!(f, "thread {} already holds lock {}", thread, lock)
            }
            ContractViolation::ReleaseNotHeld { lock, thread } => {
                write!(f, "thread {} released lock {} it does not hold", thread, lock)
            }
            ContractViolation::WaitWithoutLock { lock, thread } => {
                write!(f, "thread {} waited on a condition without holding lock {}", thread, lock)
            }
            ContractViolation::SignalWithoutLock { lock, thread } => {
                write!(f, "thread {} signaled a condition without holding lock {}", thread, lock)
            }
            ContractViolation::BlockingInInterrupt(op) => {
                write!(f, "{} may block and cannot be called from interrupt context", op)
            }
            ContractViolation::UnknownThread(thread) => write!(f, "unknown thread {}", thread),
            ContractViolation::UnknownLock(lock) => write!(f, "unknown lock {}", lock),
            ContractViolation::NotBlocked(thread) => {
                write!(f, "thread {} is not blocked and cannot be unblocked", thread)
            }
        }
    }
}

impl From<SpawnError> for SyncError {
    fn from(error: SpawnError) -> Self {
        SyncError::Spawn(error)
    }
}

impl From<ContractViolation> for SyncError {
    fn from(error: ContractViolation) -> Self {
        SyncError::Contract(error)
    }
}

/// Report a contract violation and halt the caller.
///
/// Callers must not hold any internal spin lock when they get here, so that
/// unwinding (on hosts) can still drop the primitives involved.
#[cold]
#[track_caller]
pub fn fatal(violation: ContractViolation) -> ! {
    log::error!("{}", violation);
    panic!("{}", violation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_contract_messages_name_the_parties() {
        let violation = ContractViolation::RecursiveAcquire {
            lock: LockId::from_index(3),
            thread: ThreadId::from_index(1),
        };
        assert_eq!(violation.to_string(), "thread 1 already holds lock 3");

        let err: SyncError = SpawnError::InvalidPriority(99).into();
        assert_eq!(err.to_string(), "Thread spawn error: Invalid priority: 99");
    }

    #[test]
    #[should_panic(expected = "cannot be called from interrupt context")]
    fn test_fatal_panics_with_message() {
        fatal(ContractViolation::BlockingInInterrupt("Semaphore::down"));
    }
}
