//! Shared helpers for the mela crates.
//!
//! This crate holds the small pieces both cores lean on:
//! - `Capabilities` - injectable clock and random number algorithm
//! - `Rng` - seeded uniform selection on top of an `RngAlgorithm`
//! - `fold_hash64` - FNV-1a hashing with ASCII case folded
//! - `str_util` - line and word tokenization with ASCII case folding
//! - `duration` - duration units used by the age caps

pub mod capabilities;
pub mod duration;
pub mod hash;
pub mod random;
pub mod str_util;

pub use capabilities::{Capabilities, Clock, Lcg64, RngAlgorithm, SystemClock};
pub use hash::{FastHashMap, fast_hasher, fast_map_new, fold_hash64};
pub use random::Rng;
pub use str_util::{ascii_eq_ignore_case, is_sentence_end, lines, words};
