//! Markov-chain text generator over word triples.
//!
//! A [`MarkovGenerator`] learns `(w-2, w-1) -> w` transitions from text,
//! keeps at most [`MarkovConfig::max_size`] records, forgets records older
//! than [`MarkovConfig::max_age`], and can be stored in and loaded from the
//! formats listed in [`Format`].

mod config;
mod error;
mod evict;
pub mod format;
mod generator;
mod graph;
mod stats;
mod token;
mod walk;
mod weights;

pub use config::MarkovConfig;
pub use error::{MarkovError, MarkovResult};
pub use format::Format;
pub use generator::MarkovGenerator;
pub use stats::Stats;
pub use token::{Prefix, Suffix, Word};
