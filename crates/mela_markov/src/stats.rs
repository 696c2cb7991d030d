use serde::Serialize;

/// Snapshot of graph counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Distinct suffix words, case folded.
    pub word_count: usize,
    /// Distinct `(prefix, word)` pairs.
    pub transitions: usize,
    /// Suffix records, duplicates included.
    pub records: usize,
    pub prefixes: usize,
    pub start_prefixes: usize,
    /// The word with the most records; the earliest seen wins ties.
    pub most_common_word: Option<String>,
}
