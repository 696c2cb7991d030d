//! `prefix.0 \t prefix.1 \t word \t flag`, one record per line.

use std::io::{BufRead, Write};

use crate::error::{MarkovError, MarkovResult};
use crate::graph::Graph;
use crate::token::{Prefix, Suffix};

pub(crate) fn write(graph: &Graph, w: &mut dyn Write) -> MarkovResult<()> {
    for (prefix, suffix) in graph.records() {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            prefix.0,
            prefix.1,
            suffix.word,
            suffix.terminal as u8
        )?;
    }
    Ok(())
}

pub(crate) fn read(r: &mut dyn BufRead, now: i64) -> MarkovResult<Graph> {
    let mut graph = Graph::new();
    let mut line = String::new();
    let mut lineno = 0;
    loop {
        line.clear();
        if r.read_line(&mut line)? == 0 {
            break;
        }
        lineno += 1;
        let record = line.trim_end_matches(['\n', '\r']);
        if record.is_empty() {
            continue;
        }
        let fields: Vec<&str> = record.split('\t').collect();
        let [a, b, word, flag] = fields[..] else {
            return Err(MarkovError::corrupt(format!(
                "line {lineno}: expected 4 fields, found {}",
                fields.len()
            )));
        };
        let terminal = match flag {
            "0" => false,
            "1" => true,
            _ => {
                return Err(MarkovError::corrupt(format!(
                    "line {lineno}: bad terminal flag {flag:?}"
                )));
            }
        };
        graph.insert(Prefix::new(a, b), Suffix::new(word, terminal, now));
    }
    Ok(graph)
}
