//! Arena of thread and lock records.
//!
//! A lock and its holder refer to each other (holder, held-lock list, wanted
//! lock) without either owning the other, so both live here and refer to
//! each other by index.

use crate::config::SyncConfig;
use crate::errors::{fatal, ContractViolation, SpawnError};
use crate::sched::priority;
use crate::thread::{Priority, ThreadId, ThreadRecord, ThreadState};

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier of a lock registered with a [`SyncTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockId(usize);

impl core::fmt::Display for LockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl LockId {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Ownership and donation state of one lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockRecord {
    pub(crate) holder: Option<ThreadId>,
    /// Highest priority among threads trying to acquire the lock.
    pub(crate) max_priority: Option<Priority>,
}

impl LockRecord {
    pub fn holder(&self) -> Option<ThreadId> {
        self.holder
    }

    pub fn max_priority(&self) -> Option<Priority> {
        self.max_priority
    }
}

/// Synchronization bookkeeping shared by a kernel and its primitives.
#[derive(Debug)]
pub struct SyncTable {
    pub(crate) config: SyncConfig,
    pub(crate) threads: Vec<Option<ThreadRecord>>,
    pub(crate) locks: Vec<Option<LockRecord>>,
    free_locks: Vec<usize>,
    live_threads: usize,
}

impl SyncTable {
    pub const fn new(config: SyncConfig) -> Self {
        Self {
            config,
            threads: Vec::new(),
            locks: Vec::new(),
            free_locks: Vec::new(),
            live_threads: 0,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Register a thread with the given base priority.
    pub fn register_thread(&mut self, name: &str, priority: Priority) -> Result<ThreadId, SpawnError> {
        if name.is_empty() {
            return Err(SpawnError::InvalidName(String::from(name)));
        }
        if priority > priority::MAX {
            return Err(SpawnError::InvalidPriority(priority));
        }
        if self.live_threads >= self.config.max_threads {
            return Err(SpawnError::TooManyThreads);
        }

        let id = ThreadId::from_index(self.threads.len());
        self.threads.push(Some(ThreadRecord::new(String::from(name), priority)));
        self.live_threads += 1;
        Ok(id)
    }

    /// Mark a thread finished and drop its record. Any lock it still holds
    /// stays held (by nobody that can release it), as on a real kernel.
    pub fn retire_thread(&mut self, id: ThreadId) {
        let record = self.thread_mut(id);
        record.state = ThreadState::Finished;
        if !record.held_locks.is_empty() {
            log::warn!("thread {} ({}) exited holding {} lock(s)", id, record.name, record.held_locks.len());
        }
        self.threads[id.index()] = None;
        self.live_threads -= 1;
    }

    pub fn thread(&self, id: ThreadId) -> &ThreadRecord {
        match self.threads.get(id.index()).and_then(Option::as_ref) {
            Some(record) => record,
            None => fatal(ContractViolation::UnknownThread(id)),
        }
    }

    pub fn thread_mut(&mut self, id: ThreadId) -> &mut ThreadRecord {
        match self.threads.get_mut(id.index()).and_then(Option::as_mut) {
            Some(record) => record,
            None => fatal(ContractViolation::UnknownThread(id)),
        }
    }

    pub fn is_live(&self, id: ThreadId) -> bool {
        matches!(self.threads.get(id.index()), Some(Some(_)))
    }

    pub fn live_threads(&self) -> usize {
        self.live_threads
    }

    /// Iterate over live threads in registration order.
    pub fn threads(&self) -> impl Iterator<Item = (ThreadId, &ThreadRecord)> + '_ {
        self.threads
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|record| (ThreadId::from_index(index), record)))
    }

    pub fn effective_priority(&self, id: ThreadId) -> Priority {
        self.thread(id).effective_priority()
    }

    pub fn set_state(&mut self, id: ThreadId, state: ThreadState) {
        self.thread_mut(id).state = state;
    }

    /// Change a thread's base priority. Donations stay in effect.
    pub fn set_base_priority(&mut self, id: ThreadId, priority: Priority) {
        let priority = priority.min(priority::MAX);
        self.thread_mut(id).base_priority = priority;
    }

    /// Register a free lock.
    pub fn register_lock(&mut self) -> LockId {
        match self.free_locks.pop() {
            Some(index) => {
                self.locks[index] = Some(LockRecord::default());
                LockId::from_index(index)
            }
            None => {
                self.locks.push(Some(LockRecord::default()));
                LockId::from_index(self.locks.len() - 1)
            }
        }
    }

    /// Drop a lock's record, detaching it from its holder if it is held.
    pub fn retire_lock(&mut self, id: LockId) {
        if let Some(holder) = self.lock_record(id).holder {
            log::warn!("lock {} dropped while held by thread {}", id, holder);
            if self.is_live(holder) {
                self.thread_mut(holder).held_locks.remove(&id);
                self.refresh_donation(holder);
            }
        }
        self.locks[id.index()] = None;
        self.free_locks.push(id.index());
    }

    pub fn lock_record(&self, id: LockId) -> &LockRecord {
        match self.locks.get(id.index()).and_then(Option::as_ref) {
            Some(record) => record,
            None => fatal(ContractViolation::UnknownLock(id)),
        }
    }

    pub(crate) fn lock_record_mut(&mut self, id: LockId) -> &mut LockRecord {
        match self.locks.get_mut(id.index()).and_then(Option::as_mut) {
            Some(record) => record,
            None => fatal(ContractViolation::UnknownLock(id)),
        }
    }
}

impl Default for SyncTable {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}
