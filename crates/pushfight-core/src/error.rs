//! Typed error classes for the engine, grouped by the taxonomy the solver's
//! fatal/transient distinction relies on.

use std::path::PathBuf;

/// Errors from decoding an on-disk or wire-format byte stream.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated Elias-Fano stream")]
    TruncatedEliasFano,
    #[error("Elias-Fano tail width {0} exceeds 63 bits")]
    TailWidthTooLarge(u8),
    #[error("truncated protocol frame")]
    TruncatedFrame,
    #[error("truncated dictionary/list payload")]
    TruncatedPayload,
    #[error("byte {0:#04x} is not a valid ternary-packed outcome digit")]
    InvalidTernaryDigit(u8),
}

/// Errors opening or validating a memory-mapped storage file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{path}: expected at least {expected} bytes, found {actual}")]
    FileTooShort {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors signaling that the phased state machine's non-regression invariant
/// would be violated.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error(
        "index {index} expected to be Tie before applying delta, found {found:?} (new value {new_value:?})"
    )]
    UnexpectedPriorOutcome {
        index: i64,
        found: crate::types::Outcome,
        new_value: crate::types::Outcome,
    },
    #[error("chunk {chunk} checksum mismatch for phase {phase}")]
    ChecksumMismatch { phase: u32, chunk: i64 },
}
