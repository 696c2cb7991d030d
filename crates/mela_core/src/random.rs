//! Seeded uniform selection.

use crate::capabilities::RngAlgorithm;

/// An `RngAlgorithm` paired with the state word it advances.
pub struct Rng<'a> {
    algo: &'a dyn RngAlgorithm,
    state: &'a mut u64,
}

impl<'a> Rng<'a> {
    pub fn new(algo: &'a dyn RngAlgorithm, state: &'a mut u64) -> Self {
        Self { algo, state }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.algo.next_u64(self.state)
    }

    /// Uniform index in `0..n`. Returns 0 when `n == 0`.
    pub fn below(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        let n = n as u64;
        // Reject the top partial bucket so every index is equally likely.
        let zone = u64::MAX - (u64::MAX % n);
        loop {
            let raw = self.next_u64();
            if raw < zone {
                return (raw % n) as usize;
            }
        }
    }

    pub fn pick<'s, T>(&mut self, items: &'s [T]) -> Option<&'s T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.below(items.len());
        items.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Lcg64;

    struct Counter;
    impl RngAlgorithm for Counter {
        fn next_u64(&self, state: &mut u64) -> u64 {
            *state = state.wrapping_add(1);
            *state
        }
    }

    #[test]
    fn below_stays_in_range() {
        let mut state = 42;
        let mut rng = Rng::new(&Lcg64, &mut state);
        for n in 1..50 {
            assert!(rng.below(n) < n);
        }
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn pick_follows_the_algorithm() {
        let mut state = 0;
        let mut rng = Rng::new(&Counter, &mut state);
        let items = ["a", "b", "c"];
        assert_eq!(rng.pick(&items), Some(&"b"));
        assert_eq!(rng.pick(&items), Some(&"c"));
        assert_eq!(rng.pick(&items), Some(&"a"));
        assert_eq!(rng.pick::<u8>(&[]), None);
    }
}
