//! MemTable integration tests
//!
//! Shared helpers live here; the test modules below pull them in with
//! `use crate::...`.

use skipmem::{LevelSource, MemTable, MemTableConfig};

mod concurrency_tests;

/// Level source that always draws the same value.
pub struct ConstantLevel(pub u32);

impl LevelSource for ConstantLevel {
    fn rand_u32(&mut self) -> u32 {
        self.0
    }
}

/// A memtable starting at sequence 0 whose every entry lands on `level`.
pub fn memtable_at_level(level: u32) -> MemTable {
    MemTable::with_level_source(0, MemTableConfig::default(), Box::new(ConstantLevel(1 << level)))
}

/// Collect `(key, timestamp, value)` for every entry, in iteration order.
pub fn collect_entries(memtable: &MemTable) -> Vec<(Vec<u8>, i64, Vec<u8>)> {
    memtable
        .iter()
        .map(|entry| (entry.key.to_vec(), entry.timestamp, entry.value.to_vec()))
        .collect()
}
