//! System capability traits for dependency injection.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock source, millisecond resolution.
pub trait Clock: Send + Sync {
    fn unix_millis(&self) -> i64;

    fn unix_secs(&self) -> i64 {
        self.unix_millis().div_euclid(1000)
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Stateless random step; the caller owns the state word.
pub trait RngAlgorithm: Send + Sync {
    fn next_u64(&self, state: &mut u64) -> u64;
}

pub struct Lcg64;

impl RngAlgorithm for Lcg64 {
    fn next_u64(&self, state: &mut u64) -> u64 {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        // The low bits of a power-of-two LCG are weak; fold the high half in.
        *state ^ (*state >> 33)
    }
}

#[derive(Clone)]
pub struct Capabilities {
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn RngAlgorithm>,
}

impl Capabilities {
    pub fn new(clock: Arc<dyn Clock>, rng: Arc<dyn RngAlgorithm>) -> Self {
        Self { clock, rng }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: Arc<dyn RngAlgorithm>) -> Self {
        self.rng = rng;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            rng: Arc::new(Lcg64),
        }
    }
}
