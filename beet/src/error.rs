//! Error types for resolve, read, and write operations.

use thiserror::Error;

/// Error type for beet operations.
///
/// Every failure is local to the resolve/read/write call that produced it and is
/// returned to the immediate caller. Nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer: need {needed} bytes at offset {offset}, {remaining} remaining")]
    EndOfBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("buffer overflow: need {needed} bytes at offset {offset}, capacity {capacity}")]
    BufferOverflow {
        offset: usize,
        needed: usize,
        capacity: usize,
    },
    #[error("length mismatch in {context}: expected {expected}, found {found}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("map cardinality mismatch: expected {expected} entries, found {found}")]
    CardinalityMismatch { expected: usize, found: usize },
    #[error("invalid utf8 string")]
    InvalidUtf8,
    #[error("invalid bool: {0}")]
    InvalidBool(u8),
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("unexpected value: expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    #[error("zero-sized elements in {0}")]
    ZeroSizedElements(&'static str),
    #[error("incomplete write: wrote {written} of {expected} bytes")]
    IncompleteWrite { written: usize, expected: usize },
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
}
