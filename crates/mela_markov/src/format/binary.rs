//! Binary graph format.
//!
//! ```text
//! +-----------------------------------------------+
//! | Magic "MKV1" (4) | Version u16 (2) | Count u64 (8) |
//! +-----------------------------------------------+
//! | Record[Count]                                 |
//! |  len u16 | prefix.0 | len u16 | prefix.1       |
//! |  len u16 | word | terminal u8 | created_at i64 |
//! +-----------------------------------------------+
//! ```
//!
//! Integers are little-endian, strings UTF-8, timestamps Unix milliseconds.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{MarkovError, MarkovResult};
use crate::graph::Graph;
use crate::token::{Prefix, Suffix, Word};

pub const MAGIC: [u8; 4] = *b"MKV1";

pub const FORMAT_VERSION: u16 = 1;

pub(crate) fn write(graph: &Graph, w: &mut dyn Write) -> MarkovResult<()> {
    w.write_all(&MAGIC)?;
    w.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    w.write_u64::<LittleEndian>(graph.len() as u64)?;
    for (prefix, suffix) in graph.records() {
        write_str(w, prefix.0.as_str())?;
        write_str(w, prefix.1.as_str())?;
        write_str(w, suffix.word.as_str())?;
        w.write_u8(suffix.terminal as u8)?;
        w.write_i64::<LittleEndian>(suffix.created_at)?;
    }
    Ok(())
}

pub(crate) fn read<R: Read + ?Sized>(r: &mut R) -> MarkovResult<Graph> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(truncated)?;
    if magic != MAGIC {
        return Err(MarkovError::corrupt(format!("bad magic {magic:02x?}")));
    }
    let version = r.read_u16::<LittleEndian>().map_err(truncated)?;
    if version != FORMAT_VERSION {
        return Err(MarkovError::corrupt(format!(
            "unsupported version {version}"
        )));
    }
    let count = r.read_u64::<LittleEndian>().map_err(truncated)?;

    let mut graph = Graph::new();
    for idx in 0..count {
        let a = read_word(r)?;
        let b = read_word(r)?;
        let word = read_word(r)?;
        let terminal = match r.read_u8().map_err(truncated)? {
            0 => false,
            1 => true,
            flag => {
                return Err(MarkovError::corrupt(format!(
                    "record {idx}: bad terminal flag {flag}"
                )));
            }
        };
        let created_at = r.read_i64::<LittleEndian>().map_err(truncated)?;
        graph.insert(Prefix(a, b), Suffix { word, terminal, created_at });
    }
    Ok(graph)
}

fn write_str(w: &mut dyn Write, s: &str) -> io::Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("word of {} bytes does not fit a u16 length", s.len()),
        )
    })?;
    w.write_u16::<LittleEndian>(len)?;
    w.write_all(s.as_bytes())
}

fn read_word<R: Read + ?Sized>(r: &mut R) -> MarkovResult<Word> {
    let len = r.read_u16::<LittleEndian>().map_err(truncated)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(truncated)?;
    String::from_utf8(buf)
        .map(Word::from)
        .map_err(|e| MarkovError::corrupt(format!("invalid UTF-8: {e}")))
}

fn truncated(e: io::Error) -> MarkovError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        MarkovError::corrupt("truncated input")
    } else {
        MarkovError::Io(e)
    }
}
