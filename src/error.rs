use std::io;

use thiserror::Error;

/// Crate-wide error type. Every fallible operation in the engine
/// resolves to one of these variants.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("decode error: truncated input, expected at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("decode error: varint overflow (more than 5 continuation bytes)")]
    Overflow,

    #[error("lexicon missing entry for term {0:?}")]
    LexiconMissing(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
