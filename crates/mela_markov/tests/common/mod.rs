#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use mela_core::{Capabilities, Clock, Lcg64, RngAlgorithm};
use mela_markov::{Format, MarkovConfig, MarkovGenerator};

/// 2023-11-14T22:13:20Z
pub const T0: i64 = 1_700_000_000_000;

pub struct MockClock {
    now: AtomicI64,
}

impl MockClock {
    pub fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(millis),
        })
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn unix_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// `state + 1` per draw, with a call counter.
#[derive(Default)]
pub struct MockRng {
    pub calls: AtomicU64,
}

impl RngAlgorithm for MockRng {
    fn next_u64(&self, state: &mut u64) -> u64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *state = state.wrapping_add(1);
        *state
    }
}

pub fn generator_at(clock: &Arc<MockClock>, config: MarkovConfig) -> MarkovGenerator {
    let caps = Capabilities::new(clock.clone(), Arc::new(Lcg64));
    MarkovGenerator::with_capabilities(config, caps)
}

pub fn seeded(text: &str, seed: u64) -> MarkovGenerator {
    let generator = generator_at(&MockClock::at(T0), MarkovConfig::default());
    generator.add_text(text);
    generator.set_rng_seed(seed);
    generator
}

/// The stored transitions as `(a, b, word, terminal)` rows, lower-cased.
pub fn rows(generator: &MarkovGenerator) -> Vec<(String, String, String, bool)> {
    let mut out = Vec::new();
    generator.store(&mut out, Format::TextPlain).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| {
            let f: Vec<&str> = line.split('\t').collect();
            (
                f[0].to_ascii_lowercase(),
                f[1].to_ascii_lowercase(),
                f[2].to_ascii_lowercase(),
                f[3] == "1",
            )
        })
        .collect()
}

pub fn contains_run(haystack: &[String], needle: &[&str]) -> bool {
    needle.is_empty()
        || haystack
            .windows(needle.len())
            .any(|w| w.iter().zip(needle).all(|(a, b)| a == b))
}
