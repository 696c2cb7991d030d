//! The transition graph: prefix -> bag of suffix records, plus the start set.

use ahash::RandomState;
use indexmap::{IndexMap, IndexSet};
use mela_core::fast_hasher;

use crate::stats::Stats;
use crate::token::{Prefix, Suffix, Word};
use crate::weights::Weights;

/// Insertion-ordered so a seeded generator replays the same walk.
#[derive(Clone, Debug)]
pub(crate) struct Graph {
    bags: IndexMap<Prefix, Vec<Suffix>, RandomState>,
    // weights[i] == bags[i].len()
    weights: Weights,
    starts: IndexSet<Prefix, RandomState>,
    records: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub(crate) fn new() -> Self {
        let mut starts = IndexSet::with_hasher(fast_hasher());
        starts.insert(Prefix::START);
        Self {
            bags: IndexMap::with_hasher(fast_hasher()),
            weights: Weights::default(),
            starts,
            records: 0,
        }
    }

    /// Number of suffix records.
    pub(crate) fn len(&self) -> usize {
        self.records
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub(crate) fn prefix_count(&self) -> usize {
        self.bags.len()
    }

    pub(crate) fn starts(&self) -> &IndexSet<Prefix, RandomState> {
        &self.starts
    }

    pub(crate) fn successors(&self, prefix: &Prefix) -> &[Suffix] {
        self.bags.get(prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The stored spelling of `prefix`; lookups ignore ASCII case.
    pub(crate) fn key_of(&self, prefix: &Prefix) -> Option<&Prefix> {
        self.bags.get_key_value(prefix).map(|(key, _)| key)
    }

    /// Appends a record; a new line-initial prefix joins the start set.
    pub(crate) fn insert(&mut self, prefix: Prefix, suffix: Suffix) {
        let (idx, created) = match self.bags.get_index_of(&prefix) {
            Some(idx) => (idx, false),
            None => {
                if prefix.begins_line() {
                    self.starts.insert(prefix.clone());
                }
                let (idx, _) = self.bags.insert_full(prefix, Vec::new());
                (idx, true)
            }
        };
        self.bags[idx].push(suffix);
        if created {
            self.weights.push(1);
        } else {
            self.weights.increment(idx);
        }
        self.records += 1;
    }

    /// Every record in bag order.
    pub(crate) fn records(&self) -> impl Iterator<Item = (&Prefix, &Suffix)> {
        self.bags
            .iter()
            .flat_map(|(prefix, bag)| bag.iter().map(move |s| (prefix, s)))
    }

    /// Removes the `k`-th record counting across all bags.
    pub(crate) fn remove_nth(&mut self, k: usize) -> Option<Suffix> {
        if k >= self.records {
            return None;
        }
        let (idx, offset) = self.weights.locate(k);
        let (_, bag) = self.bags.get_index_mut(idx)?;
        let removed = bag.swap_remove(offset);
        let emptied = bag.is_empty();
        self.weights.decrement(idx);
        self.records -= 1;
        if emptied {
            self.remove_bag(idx);
        }
        Some(removed)
    }

    /// Drops records created before `cutoff`; returns how many went.
    pub(crate) fn retain_younger(&mut self, cutoff: i64) -> usize {
        let before = self.records;
        for bag in self.bags.values_mut() {
            bag.retain(|s| s.created_at >= cutoff);
        }
        let starts = &mut self.starts;
        self.bags.retain(|prefix, bag| {
            if bag.is_empty() && !prefix.is_start() {
                starts.swap_remove(prefix);
            }
            !bag.is_empty()
        });
        self.reweigh();
        before - self.records
    }

    pub(crate) fn clear(&mut self) {
        *self = Graph::new();
    }

    pub(crate) fn stats(&self) -> Stats {
        // Keyed by folded spelling; the first spelling seen is reported.
        let mut counts: IndexMap<&Word, usize, RandomState> = IndexMap::with_hasher(fast_hasher());
        let mut transitions = 0;
        for bag in self.bags.values() {
            let mut seen: IndexSet<&Word, RandomState> = IndexSet::with_hasher(fast_hasher());
            for suffix in bag {
                *counts.entry(&suffix.word).or_default() += 1;
                if seen.insert(&suffix.word) {
                    transitions += 1;
                }
            }
        }
        let mut most_common: Option<(&Word, usize)> = None;
        for (word, &n) in &counts {
            if most_common.is_none_or(|(_, best)| n > best) {
                most_common = Some((word, n));
            }
        }
        Stats {
            word_count: counts.len(),
            transitions,
            records: self.records,
            prefixes: self.prefix_count(),
            start_prefixes: self.starts.len(),
            most_common_word: most_common.map(|(w, _)| w.to_string()),
        }
    }

    fn remove_bag(&mut self, idx: usize) {
        let last = self.bags.len() - 1;
        if idx != last {
            let moved = self.weights.get(last);
            self.weights.set(idx, moved);
        }
        self.weights.pop();
        if let Some((prefix, _)) = self.bags.swap_remove_index(idx) {
            if !prefix.is_start() {
                self.starts.swap_remove(&prefix);
            }
        }
    }

    fn reweigh(&mut self) {
        self.weights.clear();
        self.records = 0;
        for bag in self.bags.values() {
            self.weights.push(bag.len());
            self.records += bag.len();
        }
    }
}
