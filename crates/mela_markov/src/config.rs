//! Generator configuration.

use std::time::Duration;

use mela_core::duration;
use serde::{Deserialize, Serialize};

/// Size and age caps applied by the eviction sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkovConfig {
    /// Upper bound on stored suffix records.
    pub max_size: usize,
    /// Records older than this are dropped by the next age pass.
    #[serde(with = "secs")]
    pub max_age: Duration,
}

impl MarkovConfig {
    pub const DEFAULT_MAX_SIZE: usize = 65535;
    pub const DEFAULT_MAX_AGE: Duration = duration::days(30);

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

impl Default for MarkovConfig {
    fn default() -> Self {
        Self {
            max_size: Self::DEFAULT_MAX_SIZE,
            max_age: Self::DEFAULT_MAX_AGE,
        }
    }
}

/// Whole seconds on the wire.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
