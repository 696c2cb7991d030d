//! Words, prefixes and suffix records.

use std::fmt;
use std::hash::{Hash, Hasher};

use mela_core::{ascii_eq_ignore_case, fold_hash64};

/// A token that compares and hashes ASCII-case-insensitively but keeps the
/// spelling it was created with.
#[derive(Clone, Default)]
pub struct Word(String);

impl Word {
    /// The start-of-line boundary token.
    pub const EMPTY: Word = Word(String::new());

    pub fn new(text: impl Into<String>) -> Self {
        Word(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        ascii_eq_ignore_case(&self.0, &other.0)
    }
}

impl Eq for Word {}

impl PartialEq<str> for Word {
    fn eq(&self, other: &str) -> bool {
        ascii_eq_ignore_case(&self.0, other)
    }
}

impl PartialEq<&str> for Word {
    fn eq(&self, other: &&str) -> bool {
        ascii_eq_ignore_case(&self.0, other)
    }
}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(fold_hash64(&self.0));
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Word(s.to_owned())
    }
}

impl From<String> for Word {
    fn from(s: String) -> Self {
        Word(s)
    }
}

/// The two tokens preceding a transition, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Prefix(pub Word, pub Word);

impl Prefix {
    /// `("", "")`, the state every line starts from.
    pub const START: Prefix = Prefix(Word::EMPTY, Word::EMPTY);

    pub fn new(a: impl Into<Word>, b: impl Into<Word>) -> Self {
        Prefix(a.into(), b.into())
    }

    pub fn is_start(&self) -> bool {
        self.0.is_empty() && self.1.is_empty()
    }

    /// True for prefixes produced by a line reset.
    pub fn begins_line(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops the older token and appends `next`.
    pub fn shift(&self, next: Word) -> Prefix {
        Prefix(self.1.clone(), next)
    }

    /// Non-empty tokens, oldest first.
    pub fn tokens(&self) -> impl Iterator<Item = &Word> {
        [&self.0, &self.1].into_iter().filter(|w| !w.is_empty())
    }
}

/// One observed outgoing word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suffix {
    pub word: Word,
    /// The word closed a sentence or ended its line.
    pub terminal: bool,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl Suffix {
    pub fn new(word: impl Into<Word>, terminal: bool, created_at: i64) -> Self {
        Self {
            word: word.into(),
            terminal,
            created_at,
        }
    }
}
