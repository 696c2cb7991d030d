//! Forward and backward walks over the graph.

use mela_core::{Rng, is_sentence_end};

use crate::graph::Graph;
use crate::token::{Prefix, Word};

/// Samples successors from `prefix` into `out` until a terminal word past
/// `min`, `max` words, or a dead end.
pub(crate) fn forward(
    graph: &Graph,
    rng: &mut Rng<'_>,
    mut prefix: Prefix,
    out: &mut Vec<Word>,
    min: usize,
    max: usize,
) {
    while out.len() < max {
        let Some(next) = rng.pick(graph.successors(&prefix)) else {
            break;
        };
        out.push(next.word.clone());
        if next.terminal && out.len() >= min {
            break;
        }
        prefix = prefix.shift(next.word.clone());
    }
}

/// Prepends observed predecessors to `seq` until it holds `limit` tokens.
///
/// With two or more tokens the leading pair must match a transition
/// `(w, seq[0]) -> seq[1]` and `w` is prepended; a single token matches any
/// transition ending in it and prepends the prefix's second token. The walk
/// stops at a line boundary, and before crossing a sentence end once the
/// sequence holds more than one token.
pub(crate) fn backward(graph: &Graph, rng: &mut Rng<'_>, seq: &mut Vec<Word>, limit: usize) {
    let mut candidates: Vec<&Word> = Vec::new();
    while !seq.is_empty() && seq.len() < limit {
        candidates.clear();
        if seq.len() >= 2 {
            candidates.extend(
                graph
                    .records()
                    .filter(|(p, s)| p.1 == seq[0] && s.word == seq[1])
                    .map(|(p, _)| &p.0),
            );
        } else {
            candidates.extend(
                graph
                    .records()
                    .filter(|(_, s)| s.word == seq[0])
                    .map(|(p, _)| &p.1),
            );
        }
        let Some(&token) = rng.pick(&candidates) else {
            break;
        };
        if token.is_empty() || (seq.len() > 1 && is_sentence_end(token.as_str())) {
            break;
        }
        seq.insert(0, token.clone());
    }
}

/// The prefix formed by the last two tokens of `seq`.
pub(crate) fn tail_prefix(seq: &[Word]) -> Prefix {
    match seq {
        [] => Prefix::START,
        [only] => Prefix(Word::EMPTY, only.clone()),
        [.., a, b] => Prefix(a.clone(), b.clone()),
    }
}

/// The prefix a generation continues `seq` from.
///
/// Usually [`tail_prefix`]. A lone token that never starts a line has no
/// `("", token)` bag, so a recorded prefix ending in it is sampled instead,
/// weighted by record count.
pub(crate) fn resume_prefix(graph: &Graph, rng: &mut Rng<'_>, seq: &[Word]) -> Prefix {
    let prefix = tail_prefix(seq);
    let [token] = seq else {
        return prefix;
    };
    if !graph.successors(&prefix).is_empty() {
        return prefix;
    }
    let candidates: Vec<&Prefix> = graph
        .records()
        .filter(|(p, _)| !p.0.is_empty() && p.1 == *token)
        .map(|(p, _)| p)
        .collect();
    match rng.pick(&candidates) {
        Some(&found) => found.clone(),
        None => prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Suffix;
    use mela_core::Lcg64;

    fn chain(words: &[&str]) -> Graph {
        let mut g = Graph::new();
        let mut prefix = Prefix::START;
        for (i, w) in words.iter().enumerate() {
            g.insert(prefix.clone(), Suffix::new(*w, i + 1 == words.len(), 0));
            prefix = prefix.shift(Word::from(*w));
        }
        g
    }

    fn strs(seq: &[Word]) -> Vec<&str> {
        seq.iter().map(Word::as_str).collect()
    }

    #[test]
    fn forward_follows_a_single_chain() {
        let g = chain(&["a", "b", "c", "d"]);
        let mut state = 3;
        let mut rng = Rng::new(&Lcg64, &mut state);
        let mut out = Vec::new();
        forward(&g, &mut rng, Prefix::START, &mut out, 0, 10);
        assert_eq!(strs(&out), ["a", "b", "c", "d"]);

        let mut out = Vec::new();
        forward(&g, &mut rng, Prefix::START, &mut out, 0, 2);
        assert_eq!(strs(&out), ["a", "b"]);
    }

    #[test]
    fn backward_stops_at_the_line_start() {
        let g = chain(&["a", "b", "c", "d"]);
        let mut state = 3;
        let mut rng = Rng::new(&Lcg64, &mut state);
        let mut seq = vec![Word::from("C")];
        backward(&g, &mut rng, &mut seq, 10);
        assert_eq!(strs(&seq), ["a", "b", "C"]);

        let mut seq = vec![Word::from("c"), Word::from("d")];
        backward(&g, &mut rng, &mut seq, 3);
        assert_eq!(strs(&seq), ["b", "c", "d"]);
    }

    #[test]
    fn backward_does_not_cross_a_sentence_end() {
        let g = chain(&["one.", "two", "three"]);
        let mut state = 3;
        let mut rng = Rng::new(&Lcg64, &mut state);
        let mut seq = vec![Word::from("three")];
        backward(&g, &mut rng, &mut seq, 10);
        assert_eq!(strs(&seq), ["two", "three"]);
    }

    #[test]
    fn lone_mid_line_token_resumes_from_a_recorded_prefix() {
        let g = chain(&["a", "b", "c"]);
        let mut state = 3;
        let mut rng = Rng::new(&Lcg64, &mut state);
        assert_eq!(resume_prefix(&g, &mut rng, &["B".into()]), Prefix::new("a", "b"));
        // A line-initial token keeps its own bag.
        assert_eq!(resume_prefix(&g, &mut rng, &["a".into()]), Prefix::new("", "a"));
        assert_eq!(resume_prefix(&g, &mut rng, &["zzz".into()]), Prefix::new("", "zzz"));
        assert_eq!(
            resume_prefix(&g, &mut rng, &["x".into(), "b".into()]),
            Prefix::new("x", "b")
        );
    }

    #[test]
    fn tail_prefix_pads_short_sequences() {
        assert_eq!(tail_prefix(&[]), Prefix::START);
        assert_eq!(tail_prefix(&["x".into()]), Prefix::new("", "x"));
        assert_eq!(tail_prefix(&["x".into(), "y".into(), "z".into()]), Prefix::new("y", "z"));
    }
}
