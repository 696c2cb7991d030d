use ahash::RandomState;
use hashbrown::HashMap;
use std::hash::Hash;

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

/// Fixed seeds keep iteration order stable from run to run.
pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

const FNV_OFFSET: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// FNV-1a over ASCII-lowered bytes; non-ASCII bytes hash raw.
pub fn fold_hash64(s: &str) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in s.as_bytes() {
        h ^= b.to_ascii_lowercase() as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}
