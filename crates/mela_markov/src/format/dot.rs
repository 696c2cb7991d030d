//! Graphviz export. Nodes are prefixes, edges are labelled with the word
//! and weighted by how often it was recorded.

use std::io::Write;

use ahash::RandomState;
use indexmap::IndexMap;
use mela_core::fast_hasher;

use crate::error::MarkovResult;
use crate::graph::Graph;
use crate::token::{Prefix, Word};

pub(crate) fn write(graph: &Graph, w: &mut dyn Write) -> MarkovResult<()> {
    writeln!(w, "digraph markov {{")?;
    writeln!(w, "  node [shape=box];")?;
    let mut edges: IndexMap<(&Prefix, &Word), (usize, bool), RandomState> =
        IndexMap::with_hasher(fast_hasher());
    for (prefix, suffix) in graph.records() {
        let edge = edges.entry((prefix, &suffix.word)).or_default();
        edge.0 += 1;
        edge.1 |= suffix.terminal;
    }
    for ((prefix, word), (count, terminal)) in edges {
        // Name the target the way its own bag is keyed so that case
        // variants of one prefix stay a single node.
        let next = prefix.shift(word.clone());
        let next = graph.key_of(&next).unwrap_or(&next);
        write!(
            w,
            "  \"{}\" -> \"{}\" [label=\"{}\", weight={count}",
            escape(&node_label(prefix)),
            escape(&node_label(next)),
            escape(word.as_str()),
        )?;
        if terminal {
            write!(w, ", style=bold")?;
        }
        writeln!(w, "];")?;
    }
    writeln!(w, "}}")?;
    Ok(())
}

fn node_label(prefix: &Prefix) -> String {
    if prefix.is_start() {
        return "^".to_owned();
    }
    prefix
        .tokens()
        .map(Word::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
