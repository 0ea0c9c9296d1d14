//! Host simulation of a single-CPU priority kernel.
//!
//! [`SimKernel`] implements [`Kernel`] on top of OS threads so the
//! synchronization core can be exercised on a development machine. Every
//! simulated thread is backed by one OS thread, but only the thread whose ID
//! is stored in `current` ever executes; the others park on a condition
//! variable until the scheduler hands them the CPU. This reproduces the
//! uniprocessor model exactly: interleaving happens only at blocking calls,
//! yields and simulated interrupts.
//!
//! The scheduler is strict priority with FIFO among equals, reading
//! effective priorities from the shared [`SyncTable`] so donations take
//! effect immediately.
//!
//! # Example
//!
//! ```ignore
//! let kernel = SimKernel::new();
//! let sema = Semaphore::new(&kernel, 0);
//! kernel.scope(|s| {
//!     kernel.spawn(s, "waiter", 40, || sema.down()).unwrap();
//!     sema.up();
//! });
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::Scope;
use std::vec::Vec;

use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::arch::IntrLevel;
use crate::config::SyncConfig;
use crate::errors::{fatal, ContractViolation, SyncResult};
use crate::kernel::Kernel;
use crate::sched::{priority, RunQueue};
use crate::sync::SyncTable;
use crate::thread::{Priority, ThreadId, ThreadState};

struct SimState {
    /// Threads waiting for the CPU.
    ready: RunQueue,
    /// Thread parked in [`SimKernel::wait_idle`], resumed once nothing is ready.
    idle_waiter: Option<ThreadId>,
    /// A handler asked for a yield; performed when it returns.
    yield_on_return: bool,
}

/// A uniprocessor kernel simulated with host threads.
pub struct SimKernel {
    state: Mutex<SimState>,
    /// Signaled whenever `current` changes.
    turn: Condvar,
    current: AtomicUsize,
    intr_enabled: AtomicBool,
    in_interrupt: AtomicBool,
    /// Set when the simulation cannot continue; parked threads unwind.
    poisoned: AtomicBool,
    table: spin::Mutex<SyncTable>,
}

impl SimKernel {
    /// Create a kernel whose only thread is the caller, registered as
    /// `main` at the default priority.
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> Self {
        let mut table = SyncTable::new(config);
        let main = match table.register_thread("main", priority::DEFAULT) {
            Ok(id) => id,
            Err(e) => panic!("cannot register the main thread: {}", e),
        };
        table.set_state(main, ThreadState::Running);

        Self {
            state: Mutex::new(SimState {
                ready: RunQueue::new(),
                idle_waiter: None,
                yield_on_return: false,
            }),
            turn: Condvar::new(),
            current: AtomicUsize::new(main.index()),
            intr_enabled: AtomicBool::new(true),
            in_interrupt: AtomicBool::new(false),
            poisoned: AtomicBool::new(false),
            table: spin::Mutex::new(table),
        }
    }

    /// Run `f` with a thread scope for [`spawn`](SimKernel::spawn), then let
    /// the spawned threads run until none is ready.
    ///
    /// # Panics
    ///
    /// Panics if a spawned thread is still blocked once the others are done,
    /// or if any spawned thread panicked.
    pub fn scope<'env, F, T>(&'env self, f: F) -> T
    where
        F: for<'scope> FnOnce(&'scope Scope<'scope, 'env>) -> T,
    {
        std::thread::scope(|s| {
            let result = f(s);
            self.wait_idle();

            let me = self.current();
            let stuck: Vec<ThreadId> = self
                .table
                .lock()
                .threads()
                .filter(|&(id, record)| id != me && record.state() == ThreadState::Blocked)
                .map(|(id, _)| id)
                .collect();
            if !stuck.is_empty() {
                self.poison();
                panic!("simulated threads {:?} are still blocked", stuck);
            }
            result
        })
    }

    /// Create a simulated thread running `f`.
    ///
    /// # Arguments
    ///
    /// * `scope` - Scope handed out by [`SimKernel::scope`]
    /// * `name` - Thread name, for diagnostics
    /// * `priority` - Base priority, `priority::MIN..=priority::MAX`
    /// * `f` - Thread body
    ///
    /// # Returns
    ///
    /// The new thread's ID, or [`SyncError::Spawn`] if the thread cannot be
    /// registered. The thread is ready at once and preempts the caller if it
    /// has a higher priority.
    ///
    /// [`SyncError::Spawn`]: crate::errors::SyncError::Spawn
    pub fn spawn<'scope, 'env, F>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        name: &str,
        priority: Priority,
        f: F,
    ) -> SyncResult<ThreadId>
    where
        F: FnOnce() + Send + 'scope,
    {
        let id = self.table.lock().register_thread(name, priority)?;
        log::debug!("spawned thread {} ({}) at priority {}", id, name, priority);

        scope.spawn(move || self.run_thread(id, f));
        self.lock_state().ready.push(id);
        self.maybe_yield();
        Ok(id)
    }

    /// Give up the CPU to another thread of equal or higher priority.
    pub fn yield_now(&self) {
        let mut state = self.lock_state();
        if self.in_interrupt() {
            state.yield_on_return = true;
            return;
        }
        let me = self.current();
        self.table.lock().set_state(me, ThreadState::Ready);
        state.ready.push(me);
        self.switch_away(state, me, true);
    }

    /// Set the running thread's base priority, yielding if it no longer
    /// has the highest priority.
    pub fn set_priority(&self, priority: Priority) {
        let me = self.current();
        self.table.lock().set_base_priority(me, priority);
        self.maybe_yield();
    }

    /// Effective priority of any live thread.
    pub fn priority_of(&self, thread: ThreadId) -> Priority {
        self.table.lock().effective_priority(thread)
    }

    pub fn intr_level(&self) -> IntrLevel {
        if self.intr_enabled.load(Ordering::Acquire) {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    /// Run `handler` as an external interrupt handler on the current thread.
    ///
    /// Preemption is off inside the handler. A yield requested by the
    /// handler happens after it returns, as on real hardware.
    pub fn interrupt<R, F>(&self, handler: F) -> R
    where
        F: FnOnce() -> R,
    {
        let level = self.suppress();
        let outer = self.in_interrupt.swap(true, Ordering::AcqRel);
        let result = handler();
        self.in_interrupt.store(outer, Ordering::Release);
        self.restore(level);

        if !outer {
            let pending = core::mem::take(&mut self.lock_state().yield_on_return);
            if pending {
                self.yield_now();
            }
        }
        result
    }

    /// Park the running thread until no other thread is ready.
    pub fn wait_idle(&self) {
        let me = self.current();
        loop {
            let mut state = self.lock_state();
            if state.ready.is_empty() {
                return;
            }
            state.idle_waiter = Some(me);
            self.table.lock().set_state(me, ThreadState::Ready);
            self.switch_away(state, me, true);
        }
    }

    fn run_thread<F: FnOnce()>(&self, id: ThreadId, f: F) {
        {
            let mut state = self.lock_state();
            while self.current.load(Ordering::Acquire) != id.index() {
                if self.poisoned.load(Ordering::Acquire) {
                    return;
                }
                state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
            }
        }
        self.intr_enabled.store(true, Ordering::Release);
        log::trace!("thread {} started", id);

        let result = panic::catch_unwind(AssertUnwindSafe(f));
        self.exit_current(id, result.is_err());
        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }

    fn exit_current(&self, id: ThreadId, panicked: bool) {
        let state = self.lock_state();
        if panicked {
            drop(state);
            self.poison();
            return;
        }
        if self.poisoned.load(Ordering::Acquire) {
            return;
        }
        self.table.lock().retire_thread(id);
        log::debug!("thread {} exited", id);
        self.switch_away(state, id, false);
    }

    /// Hand the CPU to the best ready thread and, if `wait`, sleep until
    /// `me` is scheduled again.
    fn switch_away(&self, mut state: MutexGuard<'_, SimState>, me: ThreadId, wait: bool) {
        let level = self.intr_level();
        let next = self.pick_next(&mut state);
        self.table.lock().set_state(next, ThreadState::Running);
        if next != me {
            log::trace!("switch {} -> {}", me, next);
        }
        self.current.store(next.index(), Ordering::Release);
        self.turn.notify_all();
        if !wait {
            return;
        }

        while self.current.load(Ordering::Acquire) != me.index() {
            if self.poisoned.load(Ordering::Acquire) {
                drop(state);
                panic!("simulated kernel stopped while thread {} was parked", me);
            }
            state = self.turn.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        drop(state);
        self.intr_enabled.store(level.is_enabled(), Ordering::Release);
    }

    fn pick_next(&self, state: &mut SimState) -> ThreadId {
        {
            let table = self.table.lock();
            if let Some(next) = state.ready.pop_highest(|t| table.effective_priority(t)) {
                return next;
            }
        }
        if let Some(idle) = state.idle_waiter.take() {
            return idle;
        }
        self.poison();
        panic!("every simulated thread is blocked");
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::Release);
        self.turn.notify_all();
    }

    fn lock_state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for SimKernel {
    fn suppress(&self) -> IntrLevel {
        if self.intr_enabled.swap(false, Ordering::AcqRel) {
            IntrLevel::On
        } else {
            IntrLevel::Off
        }
    }

    fn restore(&self, level: IntrLevel) {
        self.intr_enabled.store(level.is_enabled(), Ordering::Release);
    }

    fn in_interrupt(&self) -> bool {
        self.in_interrupt.load(Ordering::Acquire)
    }

    fn current(&self) -> ThreadId {
        ThreadId::from_index(self.current.load(Ordering::Acquire))
    }

    fn block_current(&self) {
        let state = self.lock_state();
        let me = self.current();
        self.table.lock().set_state(me, ThreadState::Blocked);
        self.switch_away(state, me, true);
    }

    fn unblock(&self, thread: ThreadId) {
        let mut state = self.lock_state();
        {
            let mut table = self.table.lock();
            if table.thread(thread).state() != ThreadState::Blocked {
                drop(table);
                drop(state);
                fatal(ContractViolation::NotBlocked(thread));
            }
            table.set_state(thread, ThreadState::Ready);
        }
        state.ready.push(thread);
    }

    fn maybe_yield(&self) {
        let mut state = self.lock_state();
        let me = self.current();
        let preempted = {
            let table = self.table.lock();
            let mine = table.effective_priority(me);
            state
                .ready
                .highest_priority(|t| table.effective_priority(t))
                .map_or(false, |best| best > mine)
        };
        if !preempted {
            return;
        }
        if self.in_interrupt() {
            state.yield_on_return = true;
            return;
        }
        self.table.lock().set_state(me, ThreadState::Ready);
        state.ready.push(me);
        self.switch_away(state, me, true);
    }

    fn table(&self) -> &spin::Mutex<SyncTable> {
        &self.table
    }
}
