//! The thread-safe generator front end.

use std::io::{BufRead, Write};
use std::time::Duration;

use mela_core::{Capabilities, Rng, is_sentence_end, lines, words};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::MarkovConfig;
use crate::error::MarkovResult;
use crate::evict::{self, Sweep};
use crate::format::{self, Format};
use crate::graph::Graph;
use crate::stats::Stats;
use crate::token::{Prefix, Suffix, Word};
use crate::walk;

/// A bounded, aging word-triple model.
///
/// Every public method holds the instance lock for its whole duration, so a
/// generator can be shared across threads behind an `Arc`.
pub struct MarkovGenerator {
    state: Mutex<State>,
    caps: Capabilities,
}

struct State {
    graph: Graph,
    config: MarkovConfig,
    rng_state: u64,
    // Unix ms of the last age pass.
    last_cleanup: i64,
}

impl State {
    fn ingest_line(&mut self, caps: &Capabilities, line: &str, now: i64) {
        let mut tokens = words(line).peekable();
        let mut prefix = Prefix::START;
        while let Some(token) = tokens.next() {
            let word = Word::from(token);
            let terminal = tokens.peek().is_none() || is_sentence_end(token);
            self.graph.insert(
                prefix.clone(),
                Suffix {
                    word: word.clone(),
                    terminal,
                    created_at: now,
                },
            );
            if self.graph.len() > self.config.max_size {
                self.sweep(caps, now);
            }
            prefix = prefix.shift(word);
        }
    }

    fn sweep(&mut self, caps: &Capabilities, now: i64) -> Sweep {
        let mut rng = Rng::new(&*caps.rng, &mut self.rng_state);
        evict::sweep(
            &mut self.graph,
            &self.config,
            now,
            &mut self.last_cleanup,
            &mut rng,
        )
    }
}

impl Default for MarkovGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkovGenerator {
    pub fn new() -> Self {
        Self::with_config(MarkovConfig::default())
    }

    pub fn with_config(config: MarkovConfig) -> Self {
        Self::with_capabilities(config, Capabilities::default())
    }

    pub fn with_capabilities(config: MarkovConfig, caps: Capabilities) -> Self {
        let seed = caps.clock.unix_millis() as u64;
        Self {
            state: Mutex::new(State {
                graph: Graph::new(),
                config,
                rng_state: seed,
                last_cleanup: 0,
            }),
            caps,
        }
    }

    pub fn set_rng_seed(&self, seed: u64) {
        self.state.lock().rng_state = seed;
    }

    /// Learns every line of `text`. Each line starts from the empty prefix
    /// and its last word is terminal.
    pub fn add_text(&self, text: &str) {
        let mut state = self.state.lock();
        let now = self.caps.clock.unix_millis();
        for line in lines(text) {
            state.ingest_line(&self.caps, line, now);
        }
    }

    /// Like [`add_text`](Self::add_text), reading lines until EOF.
    pub fn add_reader<R: BufRead>(&self, reader: R) -> MarkovResult<()> {
        let mut state = self.state.lock();
        let now = self.caps.clock.unix_millis();
        for line in reader.lines() {
            let line = line?;
            state.ingest_line(&self.caps, line.strip_suffix('\r').unwrap_or(&line), now);
        }
        Ok(())
    }

    /// Walks from a random start prefix. `max < min` is read as `max = min`.
    pub fn generate_words(&self, min: usize, max: usize) -> Vec<String> {
        let max = max.max(min);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut rng = Rng::new(&*self.caps.rng, &mut state.rng_state);
        let graph = &state.graph;

        let idx = rng.below(graph.starts().len());
        let Some(start) = graph.starts().get_index(idx) else {
            return Vec::new();
        };
        let mut out: Vec<Word> = start.tokens().take(max).cloned().collect();
        walk::forward(graph, &mut rng, start.clone(), &mut out, min, max);
        into_strings(out)
    }

    /// Expands `prompt` backwards up to `max / 2` words, then forwards.
    ///
    /// The prompt always appears verbatim in the result, even when it is
    /// longer than `max`. A blank prompt behaves like
    /// [`generate_words`](Self::generate_words).
    pub fn generate_words_from(&self, prompt: &str, min: usize, max: usize) -> Vec<String> {
        let mut seq: Vec<Word> = words(prompt).map(Word::from).collect();
        if seq.is_empty() {
            return self.generate_words(min, max);
        }
        let max = max.max(min);
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut rng = Rng::new(&*self.caps.rng, &mut state.rng_state);
        let graph = &state.graph;

        walk::backward(graph, &mut rng, &mut seq, max / 2);
        let prefix = walk::resume_prefix(graph, &mut rng, &seq);
        walk::forward(graph, &mut rng, prefix, &mut seq, min, max);
        into_strings(seq)
    }

    pub fn generate_string(&self, min: usize, max: usize) -> String {
        self.generate_words(min, max).join(" ")
    }

    pub fn generate_string_from(&self, prompt: &str, min: usize, max: usize) -> String {
        self.generate_words_from(prompt, min, max).join(" ")
    }

    /// Runs an eviction sweep now; returns the number of records removed.
    pub fn cleanup(&self) -> usize {
        let mut state = self.state.lock();
        let now = self.caps.clock.unix_millis();
        let report = state.sweep(&self.caps, now);
        debug!(
            aged = report.aged,
            dropped = report.dropped,
            remaining = state.graph.len(),
            "cleanup"
        );
        report.aged + report.dropped
    }

    pub fn set_max_size(&self, max_size: usize) {
        let mut state = self.state.lock();
        state.config.max_size = max_size;
        let now = self.caps.clock.unix_millis();
        state.sweep(&self.caps, now);
    }

    pub fn set_max_age(&self, max_age: Duration) {
        let mut state = self.state.lock();
        state.config.max_age = max_age;
        let now = self.caps.clock.unix_millis();
        state.sweep(&self.caps, now);
    }

    pub fn config(&self) -> MarkovConfig {
        self.state.lock().config
    }

    pub fn stats(&self) -> Stats {
        self.state.lock().graph.stats()
    }

    /// Number of suffix records.
    pub fn len(&self) -> usize {
        self.state.lock().graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().graph.is_empty()
    }

    pub fn clear(&self) {
        self.state.lock().graph.clear();
    }

    /// Serializes the graph; returns the number of records written.
    pub fn store<W: Write>(&self, mut writer: W, format: Format) -> MarkovResult<usize> {
        let state = self.state.lock();
        let count = format::store(&state.graph, &mut writer, format)?;
        debug!(%format, records = count, "stored graph");
        Ok(count)
    }

    /// Replaces the graph with one read from `reader`, then sweeps it down to
    /// the configured caps. On error the current graph is kept.
    pub fn load<R: BufRead>(&self, mut reader: R, format: Format) -> MarkovResult<usize> {
        let mut state = self.state.lock();
        let now = self.caps.clock.unix_millis();
        let graph = format::load(&mut reader, format, now)?;
        let read = graph.len();
        state.graph = graph;
        state.sweep(&self.caps, now);
        debug!(%format, read, kept = state.graph.len(), "loaded graph");
        Ok(state.graph.len())
    }
}

fn into_strings(words: Vec<Word>) -> Vec<String> {
    words.into_iter().map(Word::into_string).collect()
}
