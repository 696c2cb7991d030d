//! Errors raised by the generator.

use std::io;

use thiserror::Error;

use crate::format::Format;

#[derive(Debug, Error)]
pub enum MarkovError {
    /// A stored graph failed validation; the live graph is left untouched.
    #[error("corrupt graph: {reason}")]
    CorruptGraph { reason: String },

    #[error("{format} format does not support {operation}")]
    UnsupportedFormat {
        format: Format,
        operation: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MarkovError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        MarkovError::CorruptGraph {
            reason: reason.into(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, MarkovError::CorruptGraph { .. })
    }
}

pub type MarkovResult<T> = Result<T, MarkovError>;
