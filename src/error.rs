//! Error types for skipmem
//!
//! Every fault the memtable can raise is a caller contract violation: the
//! write path handed it an empty key, replayed the log out of order, or
//! inserted the same version twice. None of these are retryable.

use thiserror::Error;

/// Result type alias using MemTableError
pub type Result<T> = std::result::Result<T, MemTableError>;

/// Unified error type for memtable operations
#[derive(Debug, Error)]
pub enum MemTableError {
    // -------------------------------------------------------------------------
    // Contract Violations
    // -------------------------------------------------------------------------
    #[error("contract violation: empty key")]
    EmptyKey,

    #[error("contract violation: sequence number {seq_no} is below applied upper bound {upper}")]
    SequenceRegression { seq_no: i64, upper: i64 },

    #[error("contract violation: duplicate entry for key {key:?} at timestamp {timestamp}")]
    DuplicateEntry { key: String, timestamp: i64 },

    // -------------------------------------------------------------------------
    // Setup Errors
    // -------------------------------------------------------------------------
    #[error("Entropy error: {0}")]
    Entropy(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Codec error: {0}")]
    Codec(String),
}

impl MemTableError {
    /// True for faults caused by the caller breaking the memtable's contract.
    ///
    /// The structure is left untouched when one of these is returned, but the
    /// write path that produced it is broken and must not keep going.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::EmptyKey | Self::SequenceRegression { .. } | Self::DuplicateEntry { .. }
        )
    }

    pub(crate) fn duplicate(key: &[u8], timestamp: i64) -> Self {
        Self::DuplicateEntry {
            key: String::from_utf8_lossy(key).into_owned(),
            timestamp,
        }
    }
}

impl From<bincode::Error> for MemTableError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}

impl From<getrandom::Error> for MemTableError {
    fn from(e: getrandom::Error) -> Self {
        Self::Entropy(e.to_string())
    }
}
