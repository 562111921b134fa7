//! Mutation records
//!
//! The shape in which the write-ahead log hands applied mutations to the
//! memtable. A delete is stored as a version with an empty value, the same as
//! a put of an empty value; telling the two apart is left to the log format.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::memtable::MemTable;

/// A single mutation of one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Write a value at a timestamp
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        timestamp: i64,
    },

    /// Record a deletion at a timestamp
    Delete { key: Vec<u8>, timestamp: i64 },
}

impl Mutation {
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Put { timestamp, .. } | Self::Delete { timestamp, .. } => *timestamp,
        }
    }

    /// Value to store; empty for a delete.
    pub fn value(&self) -> &[u8] {
        match self {
            Self::Put { value, .. } => value,
            Self::Delete { .. } => &[],
        }
    }
}

/// A mutation together with the log sequence number it was assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedMutation {
    /// Log Sequence Number - monotonically increasing
    pub seq_no: i64,

    pub mutation: Mutation,
}

impl LoggedMutation {
    pub fn new(seq_no: i64, mutation: Mutation) -> Self {
        Self { seq_no, mutation }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl MemTable {
    /// Apply one logged mutation.
    pub fn apply(&self, record: &LoggedMutation) -> Result<()> {
        let mutation = &record.mutation;
        self.insert(
            record.seq_no,
            mutation.key().to_vec(),
            mutation.timestamp(),
            mutation.value().to_vec(),
        )
    }

    /// Apply logged mutations in order, stopping at the first fault.
    ///
    /// Returns how many records were applied.
    pub fn replay<'r, I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'r LoggedMutation>,
    {
        let mut applied = 0;
        for record in records {
            self.apply(record)?;
            applied += 1;
        }

        info!(
            applied,
            sequence_upper = self.sequence_upper(),
            size_bytes = self.size_bytes(),
            "replayed log into memtable"
        );
        Ok(applied)
    }
}
