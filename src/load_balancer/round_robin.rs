//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through instances; the counter
/// advances on every selection regardless of the call's outcome.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn pick(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(count % len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        assert_eq!(lb.pick(2), Some(0));
        assert_eq!(lb.pick(2), Some(1));
        assert_eq!(lb.pick(2), Some(0));
    }

    #[test]
    fn test_empty_has_no_pick() {
        let lb = RoundRobin::new();
        assert_eq!(lb.pick(0), None);
        // An empty pick does not consume a turn.
        assert_eq!(lb.pick(3), Some(0));
    }

    #[test]
    fn test_concurrent_picks_are_evenly_spread() {
        let lb = Arc::new(RoundRobin::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lb = lb.clone();
                std::thread::spawn(move || {
                    let mut seen = [0usize; 3];
                    for _ in 0..300 {
                        seen[lb.pick(3).unwrap()] += 1;
                    }
                    seen
                })
            })
            .collect();

        let mut totals = [0usize; 3];
        for handle in handles {
            for (i, n) in handle.join().unwrap().iter().enumerate() {
                totals[i] += n;
            }
        }
        assert_eq!(totals, [400, 400, 400]);
    }
}
