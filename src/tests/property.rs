//! Property-based tests for verifying wake-order and donation invariants.

#[cfg(test)]
mod property_tests {
    use crate::sim::SimKernel;
    use crate::sync::{Lock, Semaphore};
    use crate::tests::helpers::{priority_order, EventLog, SimpleRng};
    use crate::thread::Priority;
    use crate::{priority, Kernel};
    use alloc::vec::Vec;

    fn random_priorities(rng: &mut SimpleRng, count: usize) -> Vec<Priority> {
        // Few distinct values so ties are common
        (0..count)
            .map(|_| rng.gen_range(priority::DEFAULT as u64 + 1, priority::DEFAULT as u64 + 5) as Priority)
            .collect()
    }

    #[test]
    fn property_semaphore_wakes_highest_first_fifo_among_equals() {
        let mut rng = SimpleRng::new(0x5eed);
        for _ in 0..20 {
            let count = rng.gen_range(1, 8) as usize;
            let priorities = random_priorities(&mut rng, count);

            let kernel = SimKernel::new();
            let sema = Semaphore::new(&kernel, 0);
            let woken = EventLog::new();

            kernel.scope(|s| {
                for (index, &priority) in priorities.iter().enumerate() {
                    let (sema, woken) = (&sema, &woken);
                    kernel
                        .spawn(s, "waiter", priority, move || {
                            sema.down();
                            woken.push(index);
                        })
                        .unwrap();
                }
                for _ in 0..count {
                    sema.up();
                }
            });
            assert_eq!(woken.snapshot(), priority_order(&priorities), "priorities {:?}", priorities);
        }
    }

    #[test]
    fn property_holder_runs_at_highest_waiter_priority() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..20 {
            let count = rng.gen_range(1, 8) as usize;
            let priorities = random_priorities(&mut rng, count);

            let kernel = SimKernel::new();
            let lock = Lock::new(&kernel);
            let acquired = EventLog::new();

            lock.acquire();
            kernel.scope(|s| {
                for (index, &priority) in priorities.iter().enumerate() {
                    let (lock, acquired) = (&lock, &acquired);
                    kernel
                        .spawn(s, "waiter", priority, move || {
                            lock.acquire();
                            acquired.push(index);
                            lock.release();
                        })
                        .unwrap();
                }

                let best = priorities.iter().copied().max();
                assert_eq!(Some(kernel.current_priority()), best);
                assert_eq!(lock.max_priority(), best);

                lock.release();
                assert_eq!(kernel.current_priority(), priority::DEFAULT);
            });

            // Every waiter got the lock exactly once and nothing leaked
            let mut seen = acquired.snapshot();
            seen.sort_unstable();
            assert_eq!(seen, (0..count).collect::<Vec<_>>());
            assert_eq!(lock.holder(), None);
            assert_eq!(kernel.table().lock().thread(kernel.current()).held_locks().count(), 0);
        }
    }
}
