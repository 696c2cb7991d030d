//! Graph serialization.
//!
//! - [`Format::TextPlain`] - one tab-separated transition per line
//! - [`Format::Binary`] - length-prefixed records with timestamps, see [`binary`]
//! - [`Format::Dot`] - Graphviz export, write only

pub mod binary;
mod dot;
mod text;

use std::fmt;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, MarkovResult};
use crate::graph::Graph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    TextPlain,
    Binary,
    Dot,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::TextPlain => "text",
            Format::Binary => "binary",
            Format::Dot => "dot",
        }
    }

    pub fn can_load(self) -> bool {
        !matches!(self, Format::Dot)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes every record of `graph`; returns the record count.
pub(crate) fn store(graph: &Graph, w: &mut dyn Write, format: Format) -> MarkovResult<usize> {
    match format {
        Format::TextPlain => text::write(graph, w)?,
        Format::Binary => binary::write(graph, w)?,
        Format::Dot => dot::write(graph, w)?,
    }
    w.flush()?;
    Ok(graph.len())
}

/// Reads a complete graph. Text records are stamped with `now`; the start
/// set is re-derived from line-initial prefixes as records are inserted.
pub(crate) fn load(r: &mut dyn BufRead, format: Format, now: i64) -> MarkovResult<Graph> {
    let graph = match format {
        Format::TextPlain => text::read(r, now)?,
        Format::Binary => binary::read(r)?,
        Format::Dot => {
            return Err(MarkovError::UnsupportedFormat {
                format,
                operation: "load",
            });
        }
    };
    Ok(graph)
}
