//! Thread-side state consumed by the synchronization core.
//!
//! Creation, destruction and context switching of threads belong to the
//! surrounding kernel. This module only describes the per-thread fields the
//! donation protocol reads and writes: base and donated priority, the lock a
//! thread is blocked on and the locks it holds.

use crate::list::OrderedList;
use crate::sync::LockId;

use alloc::string::String;

/// Thread priority. Higher values are more important.
pub type Priority = u8;

/// Identifier of a thread registered with a [`SyncTable`].
///
/// Thread IDs are never reused for the lifetime of the table.
///
/// [`SyncTable`]: crate::sync::SyncTable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(usize);

impl core::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ThreadId {
    /// Build an ID from a table slot index.
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw slot index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Thread execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// Thread is ready to run
    Ready = 0,
    /// Thread is currently running
    Running = 1,
    /// Thread is blocked waiting for something
    Blocked = 2,
    /// Thread has finished execution
    Finished = 3,
}

/// Synchronization-related state of one thread.
#[derive(Debug, Clone)]
pub struct ThreadRecord {
    pub(crate) name: String,
    pub(crate) state: ThreadState,
    pub(crate) base_priority: Priority,
    /// Highest priority donated through a held lock, if any.
    pub(crate) donated_priority: Option<Priority>,
    /// Lock this thread is blocked acquiring.
    pub(crate) wanted_lock: Option<LockId>,
    /// Every lock this thread holds, by descending `max_priority`.
    pub(crate) held_locks: OrderedList<LockId>,
}

impl ThreadRecord {
    pub(crate) fn new(name: String, priority: Priority) -> Self {
        Self {
            name,
            state: ThreadState::Ready,
            base_priority: priority,
            donated_priority: None,
            wanted_lock: None,
            held_locks: OrderedList::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub fn base_priority(&self) -> Priority {
        self.base_priority
    }

    pub fn donated_priority(&self) -> Option<Priority> {
        self.donated_priority
    }

    /// `max(base priority, donated priority)`.
    pub fn effective_priority(&self) -> Priority {
        match self.donated_priority {
            Some(donated) if donated > self.base_priority => donated,
            _ => self.base_priority,
        }
    }

    pub fn wanted_lock(&self) -> Option<LockId> {
        self.wanted_lock
    }

    pub fn held_locks(&self) -> impl Iterator<Item = LockId> + '_ {
        self.held_locks.iter().copied()
    }

    /// Check if this thread is runnable (ready or running).
    pub fn is_runnable(&self) -> bool {
        matches!(self.state, ThreadState::Ready | ThreadState::Running)
    }
}
