//! Condition variable scenarios.

#[cfg(test)]
mod condvar_tests {
    use crate::sim::SimKernel;
    use crate::sync::{Condvar, Lock};
    use crate::tests::helpers::EventLog;
    use alloc::collections::VecDeque;
    use portable_atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_signal_wakes_in_wait_order() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        let cond = Condvar::new(&kernel);
        let woken = EventLog::new();

        kernel.scope(|s| {
            for priority in [40, 45, 42] {
                let (lock, cond, woken) = (&lock, &cond, &woken);
                kernel
                    .spawn(s, "waiter", priority, move || {
                        lock.acquire();
                        cond.wait(lock);
                        assert!(lock.held_by_current());
                        woken.push(priority);
                        lock.release();
                    })
                    .unwrap();
            }
            assert_eq!(cond.waiters(), 3);

            for _ in 0..3 {
                lock.acquire();
                cond.signal(&lock);
                lock.release();
            }
        });
        assert_eq!(woken.snapshot(), [40, 45, 42]);
        assert_eq!(cond.waiters(), 0);
    }

    #[test]
    fn test_broadcast_wakes_every_waiter_once() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        let cond = Condvar::new(&kernel);
        let wakeups = AtomicUsize::new(0);

        kernel.scope(|s| {
            for priority in [35, 40, 45] {
                kernel
                    .spawn(s, "waiter", priority, || {
                        lock.acquire();
                        cond.wait(&lock);
                        wakeups.fetch_add(1, Ordering::SeqCst);
                        lock.release();
                    })
                    .unwrap();
            }

            lock.acquire();
            cond.broadcast(&lock);
            assert_eq!(cond.waiters(), 0);
            lock.release();

            // Nobody is left to wake
            lock.acquire();
            cond.broadcast(&lock);
            lock.release();
        });
        assert_eq!(wakeups.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_bounded_buffer() {
        const ITEMS: usize = 6;
        const CAPACITY: usize = 2;

        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        let not_empty = Condvar::new(&kernel);
        let not_full = Condvar::new(&kernel);
        let buffer = spin::Mutex::new(VecDeque::new());
        let consumed = EventLog::new();

        kernel.scope(|s| {
            kernel
                .spawn(s, "consumer", 40, || {
                    for _ in 0..ITEMS {
                        lock.acquire();
                        not_empty.wait_while(&lock, || buffer.lock().is_empty());
                        let item = buffer.lock().pop_front();
                        consumed.push(item);
                        not_full.signal(&lock);
                        lock.release();
                    }
                })
                .unwrap();

            for item in 0..ITEMS {
                lock.acquire();
                not_full.wait_while(&lock, || buffer.lock().len() >= CAPACITY);
                buffer.lock().push_back(item);
                not_empty.signal(&lock);
                lock.release();
            }
        });

        let expected: std::vec::Vec<Option<usize>> = (0..ITEMS).map(Some).collect();
        assert_eq!(consumed.snapshot(), expected);
    }

    #[test]
    fn test_signal_is_not_remembered() {
        let kernel = SimKernel::new();
        let lock = Lock::new(&kernel);
        let cond = Condvar::new(&kernel);
        let events = EventLog::new();

        lock.acquire();
        cond.signal(&lock);
        lock.release();

        kernel.scope(|s| {
            kernel
                .spawn(s, "late waiter", 40, || {
                    lock.acquire();
                    cond.wait(&lock);
                    events.push("woken");
                    lock.release();
                })
                .unwrap();
            // The earlier signal did not let the waiter through
            assert_eq!(cond.waiters(), 1);
            assert_eq!(events.len(), 0);

            lock.acquire();
            cond.signal(&lock);
            lock.release();
        });
        assert_eq!(events.snapshot(), ["woken"]);
    }
}
