mod common;

use std::io::{BufReader, BufWriter, Cursor, Seek, SeekFrom, Write};

use common::{MockClock, T0, generator_at, rows, seeded};
use mela_core::duration::{DAY, HOUR};
use mela_markov::format::binary::{FORMAT_VERSION, MAGIC};
use mela_markov::{Format, MarkovConfig, MarkovError, MarkovGenerator};

const TEXT: &str = "I am a pony\nyou are a pony\nThe end.";

fn stored(generator: &MarkovGenerator, format: Format) -> Vec<u8> {
    let mut out = Vec::new();
    generator.store(&mut out, format).unwrap();
    out
}

fn header(count: u64) -> Vec<u8> {
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&count.to_le_bytes());
    bytes
}

fn push_str(bytes: &mut Vec<u8>, s: &[u8]) {
    bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
    bytes.extend_from_slice(s);
}

fn assert_corrupt(result: Result<usize, MarkovError>) {
    match result {
        Err(err) => assert!(err.is_corrupt(), "{err}"),
        Ok(n) => panic!("loaded {n} records from corrupt input"),
    }
}

#[test]
fn binary_round_trip_is_exact() {
    let source = seeded(TEXT, 1);
    let bytes = stored(&source, Format::Binary);
    assert_eq!(&bytes[..4], b"MKV1");

    let target = seeded("", 1);
    assert_eq!(target.load(Cursor::new(&bytes), Format::Binary).unwrap(), source.len());
    assert_eq!(rows(&target), rows(&source));
    assert_eq!(stored(&target, Format::Binary), bytes);
    assert_eq!(target.stats(), source.stats());
}

#[test]
fn text_round_trip_keeps_transitions() {
    let source = seeded(TEXT, 1);
    let text = String::from_utf8(stored(&source, Format::TextPlain)).unwrap();
    assert!(text.lines().all(|line| line.split('\t').count() == 4));
    assert!(text.starts_with("\t\tI\t0\n"));

    let target = seeded("", 1);
    target.load(text.as_bytes(), Format::TextPlain).unwrap();
    assert_eq!(rows(&target), rows(&source));
    assert_eq!(target.stats().start_prefixes, source.stats().start_prefixes);
}

#[test]
fn only_text_loads_reset_ages() {
    let old = MockClock::at(T0);
    let source = generator_at(&old, MarkovConfig::default());
    source.add_text(TEXT);

    // A day later with a twelve hour age cap.
    let later = MockClock::at(T0 + DAY.as_millis() as i64);
    let config = MarkovConfig::default().with_max_age(12 * HOUR);

    let from_text = generator_at(&later, config);
    let kept = from_text
        .load(stored(&source, Format::TextPlain).as_slice(), Format::TextPlain)
        .unwrap();
    assert_eq!(kept, source.len());

    let from_binary = generator_at(&later, config);
    let kept = from_binary
        .load(stored(&source, Format::Binary).as_slice(), Format::Binary)
        .unwrap();
    assert_eq!(kept, 0);
}

#[test]
fn load_enforces_the_size_cap() {
    let source = seeded(TEXT, 1);
    let clock = MockClock::at(T0);
    let target = generator_at(&clock, MarkovConfig::default().with_max_size(4));
    let kept = target
        .load(stored(&source, Format::Binary).as_slice(), Format::Binary)
        .unwrap();
    assert_eq!(kept, 4);
    assert_eq!(target.len(), 4);
}

#[test]
fn dot_is_export_only() {
    let generator = seeded(TEXT, 1);
    let dot = String::from_utf8(stored(&generator, Format::Dot)).unwrap();
    assert!(dot.starts_with("digraph markov {"));
    assert!(dot.contains("[label=\"pony\", weight=1, style=bold];"));

    let before = generator.len();
    let err = generator.load(dot.as_bytes(), Format::Dot).unwrap_err();
    assert!(matches!(
        err,
        MarkovError::UnsupportedFormat {
            format: Format::Dot,
            operation: "load"
        }
    ));
    assert_eq!(err.to_string(), "dot format does not support load");
    assert_eq!(generator.len(), before);
    assert!(!Format::Dot.can_load());
}

#[test]
fn dot_nodes_ignore_word_case() {
    let generator = seeded("go Home\ngo home now", 1);
    let dot = String::from_utf8(stored(&generator, Format::Dot)).unwrap();
    assert!(dot.contains("\"go\" -> \"go home\" [label=\"Home\", weight=2, style=bold];"));
    assert!(dot.contains("\"go home\" -> \"home now\""));
    assert!(!dot.contains("\"go Home\""));
}

#[test]
fn bad_binary_headers_are_corrupt() {
    let generator = seeded(TEXT, 1);
    let before = rows(&generator);

    let mut bad_magic = header(0);
    bad_magic[0] = b'X';
    assert_corrupt(generator.load(bad_magic.as_slice(), Format::Binary));

    let mut bad_version = header(0);
    bad_version[4] = 2;
    assert_corrupt(generator.load(bad_version.as_slice(), Format::Binary));

    assert_corrupt(generator.load(&b"MKV"[..], Format::Binary));
    assert_corrupt(generator.load(&header(0)[..8], Format::Binary));

    assert_eq!(rows(&generator), before);
}

#[test]
fn bad_binary_records_are_corrupt() {
    let generator = seeded(TEXT, 1);
    let before = generator.len();

    let full = stored(&generator, Format::Binary);
    assert_corrupt(generator.load(&full[..full.len() - 3], Format::Binary));

    let mut bad_flag = header(1);
    push_str(&mut bad_flag, b"");
    push_str(&mut bad_flag, b"");
    push_str(&mut bad_flag, b"hi");
    bad_flag.push(7);
    bad_flag.extend_from_slice(&T0.to_le_bytes());
    assert_corrupt(generator.load(bad_flag.as_slice(), Format::Binary));

    let mut bad_utf8 = header(1);
    push_str(&mut bad_utf8, b"");
    push_str(&mut bad_utf8, b"");
    push_str(&mut bad_utf8, &[0xff, 0xfe]);
    bad_utf8.push(0);
    bad_utf8.extend_from_slice(&T0.to_le_bytes());
    assert_corrupt(generator.load(bad_utf8.as_slice(), Format::Binary));

    assert_eq!(generator.len(), before);
}

#[test]
fn empty_binary_graph_loads() {
    let generator = seeded(TEXT, 1);
    assert_eq!(generator.load(header(0).as_slice(), Format::Binary).unwrap(), 0);
    assert!(generator.is_empty());
}

#[test]
fn bad_text_rows_are_corrupt() {
    let generator = seeded(TEXT, 1);
    let before = generator.len();
    assert_corrupt(generator.load(&b"a\tb\tc\n"[..], Format::TextPlain));
    assert_corrupt(generator.load(&b"a\tb\tc\t2\n"[..], Format::TextPlain));
    assert_eq!(generator.len(), before);

    // Blank lines are skipped.
    let kept = generator
        .load(&b"\n\t\thello\t1\n\n"[..], Format::TextPlain)
        .unwrap();
    assert_eq!(kept, 1);
    assert_eq!(generator.generate_words(1, 3), vec!["hello"]);
}

#[test]
fn store_and_load_through_a_file() {
    let source = seeded(TEXT, 1);
    let mut file = tempfile::tempfile().unwrap();
    {
        let mut writer = BufWriter::new(&mut file);
        assert_eq!(source.store(&mut writer, Format::Binary).unwrap(), source.len());
        writer.flush().unwrap();
    }
    file.seek(SeekFrom::Start(0)).unwrap();

    let target = seeded("", 2);
    target.load(BufReader::new(file), Format::Binary).unwrap();
    assert_eq!(rows(&target), rows(&source));
}
