//! Test helper utilities and common functionality.

use alloc::vec::Vec;

/// Ordered record of what simulated threads did, in execution order.
pub(crate) struct EventLog<T> {
    events: spin::Mutex<Vec<T>>,
}

impl<T: Clone> EventLog<T> {
    pub(crate) fn new() -> Self {
        Self {
            events: spin::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, event: T) {
        self.events.lock().push(event);
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.events.lock().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.lock().len()
    }
}

/// Simple linear congruential generator for property testing.
pub(crate) struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform-ish value in `min..max`.
    pub(crate) fn gen_range(&mut self, min: u64, max: u64) -> u64 {
        min + ((self.next_u64() >> 33) % (max - min))
    }
}

/// Expected wake order for waiters that queued in `arrival` order: highest
/// priority first, arrival order among equals.
pub(crate) fn priority_order(arrival: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..arrival.len()).collect();
    order.sort_by(|&a, &b| arrival[b].cmp(&arrival[a]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_is_stable() {
        assert_eq!(priority_order(&[40, 50, 40, 45]), [1, 3, 0, 2]);
    }

    #[test]
    fn test_rng_stays_in_range() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            let value = rng.gen_range(32, 64);
            assert!((32..64).contains(&value));
        }
    }
}
