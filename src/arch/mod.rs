//! Preemption control.
//!
//! On a single CPU, masking interrupts is the only mutual exclusion the core
//! uses: while they are off no timer tick can preempt the running thread and
//! no handler can touch shared state. [`InterruptGuard`] turns the kernel's
//! `suppress`/`restore` pair into a scoped token so every exit path, early
//! returns and unwinding included, restores the level that was in effect
//! before.

use crate::kernel::Kernel;

/// Interrupt (preemption) level of the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrLevel {
    /// Interrupts enabled, the running thread may be preempted
    On,
    /// Interrupts disabled
    Off,
}

impl IntrLevel {
    pub fn is_enabled(self) -> bool {
        self == IntrLevel::On
    }
}

/// Scoped preemption suppression.
///
/// Guards nest: an inner guard taken while preemption is already off
/// restores `Off` when dropped, leaving the outer section intact.
#[must_use = "preemption is restored as soon as the guard is dropped"]
pub struct InterruptGuard<'k, K: Kernel + ?Sized> {
    kernel: &'k K,
    previous: IntrLevel,
}

impl<'k, K: Kernel + ?Sized> InterruptGuard<'k, K> {
    /// Suppress preemption until the guard is dropped.
    pub fn new(kernel: &'k K) -> Self {
        let previous = kernel.suppress();
        Self { kernel, previous }
    }

    /// Level that will be restored on drop.
    pub fn previous(&self) -> IntrLevel {
        self.previous
    }
}

impl<K: Kernel + ?Sized> Drop for InterruptGuard<'_, K> {
    fn drop(&mut self) {
        self.kernel.restore(self.previous);
    }
}

/// Run `f` with preemption suppressed.
pub fn without_preemption<K, R, F>(kernel: &K, f: F) -> R
where
    K: Kernel + ?Sized,
    F: FnOnce() -> R,
{
    let _guard = InterruptGuard::new(kernel);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimKernel;

    #[test]
    fn test_guards_nest_and_restore() {
        let kernel = SimKernel::new();
        assert!(kernel.intr_level().is_enabled());

        {
            let outer = InterruptGuard::new(&kernel);
            assert_eq!(outer.previous(), IntrLevel::On);
            assert_eq!(kernel.intr_level(), IntrLevel::Off);

            {
                let inner = InterruptGuard::new(&kernel);
                assert_eq!(inner.previous(), IntrLevel::Off);
            }
            assert_eq!(kernel.intr_level(), IntrLevel::Off);
        }
        assert_eq!(kernel.intr_level(), IntrLevel::On);
    }

    #[test]
    fn test_without_preemption_restores_on_return() {
        let kernel = SimKernel::new();
        let level = without_preemption(&kernel, || kernel.intr_level());
        assert_eq!(level, IntrLevel::Off);
        assert_eq!(kernel.intr_level(), IntrLevel::On);
    }
}
