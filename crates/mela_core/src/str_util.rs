/// ASCII case-insensitive equality; bytes outside ASCII compare raw.
pub fn ascii_eq_ignore_case(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .all(|(x, y)| x.to_ascii_lowercase() == y.to_ascii_lowercase())
}

/// Splits on `\n`, dropping a trailing `\r` from each line.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Whitespace-separated tokens of a single line, case preserved.
pub fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace()
}

/// A token ending in `.` after trimming closes a sentence.
pub fn is_sentence_end(token: &str) -> bool {
    token.trim().ends_with('.')
}
