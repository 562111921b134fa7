//! MemTable implementation
//!
//! Multi-version skip list with a single serialized writer and lock-free
//! readers.

use bytes::Bytes;
use oorandom::Rand32;
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::config::{MemTableConfig, DEFAULT_LEVEL_SEED};
use crate::error::{MemTableError, Result};

use super::iterator::MemTableIterator;
use super::level::{pick_level, seeded_source, LevelSource, MAX_LEVEL};
use super::node::Node;

/// Fixed per-entry overhead counted for the timestamp.
const TIMESTAMP_BYTES: u64 = 8;

/// Counted once per forward link, approximating pointer overhead.
const LINK_BYTES: u64 = 8;

/// In-memory sorted table of `(key, timestamp) -> value`.
///
/// Keys sort ascending and, within a key, timestamps sort descending, so the
/// first entry seen for a key is its newest version.
///
/// ## Concurrency
/// - `insert`, `size_bytes`, `sequence_upper` and `len` take `writer`
/// - `find`, `find_at` and iteration never lock; they only load links
pub struct MemTable {
    /// Sentinel with links on all `MAX_LEVEL` levels
    head: Node,

    /// Everything an insert mutates apart from the links themselves
    writer: Mutex<WriterState>,

    config: MemTableConfig,
}

struct WriterState {
    /// Largest log sequence number applied so far
    seq_upper: i64,

    /// Approximate bytes held by the entries
    size_bytes: u64,

    entry_count: usize,

    levels: Box<dyn LevelSource>,
}

impl MemTable {
    /// Create an empty memtable whose watermark starts at `initial_seq`,
    /// using the default configuration (fixed level seed).
    pub fn new(initial_seq: i64) -> Self {
        let config = MemTableConfig::default();
        let levels = Box::new(Rand32::new(DEFAULT_LEVEL_SEED));
        Self::with_level_source(initial_seq, config, levels)
    }

    /// Create an empty memtable from a configuration.
    ///
    /// Fails only when the config asks for an OS-seeded level source and the
    /// OS cannot provide one.
    pub fn with_config(initial_seq: i64, config: MemTableConfig) -> Result<Self> {
        let levels = seeded_source(config.level_seed)?;
        Ok(Self::with_level_source(initial_seq, config, levels))
    }

    /// Create an empty memtable drawing levels from `levels`.
    pub fn with_level_source(
        initial_seq: i64,
        config: MemTableConfig,
        levels: Box<dyn LevelSource>,
    ) -> Self {
        debug!(
            initial_seq,
            flush_threshold_bytes = config.flush_threshold_bytes,
            "creating memtable"
        );

        Self {
            head: Node::head(MAX_LEVEL),
            writer: Mutex::new(WriterState {
                seq_upper: initial_seq,
                size_bytes: 0,
                entry_count: 0,
                levels,
            }),
            config,
        }
    }

    /// Insert `(key, timestamp) -> value` as applied log record `seq_no`.
    ///
    /// An empty `value` is a deletion marker.
    ///
    /// Returns a contract violation, leaving the memtable unchanged, if `key`
    /// is empty, `seq_no` is below [`sequence_upper`](Self::sequence_upper),
    /// or `(key, timestamp)` is already present.
    pub fn insert(
        &self,
        seq_no: i64,
        key: impl Into<Bytes>,
        timestamp: i64,
        value: impl Into<Bytes>,
    ) -> Result<()> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            error!(seq_no, "insert with empty key");
            return Err(MemTableError::EmptyKey);
        }

        let mut writer = self.writer.lock();

        if seq_no < writer.seq_upper {
            error!(seq_no, upper = writer.seq_upper, "insert below applied sequence upper bound");
            return Err(MemTableError::SequenceRegression {
                seq_no,
                upper: writer.seq_upper,
            });
        }

        let mut predecessors = [&self.head; MAX_LEVEL];
        let found = self.find_greater_or_equal(&key, timestamp, Some(&mut predecessors));

        if found.is_some_and(|node| node.matches(&key, timestamp)) {
            error!(seq_no, timestamp, key_len = key.len(), "duplicate insert");
            return Err(MemTableError::duplicate(&key, timestamp));
        }

        let level = pick_level(&mut *writer.levels);
        let height = level + 1;
        let added = key.len() as u64
            + value.len() as u64
            + TIMESTAMP_BYTES
            + LINK_BYTES * height as u64;

        Node::publish_after(Node::new(key, timestamp, value, height), &predecessors);

        writer.seq_upper = seq_no;
        writer.size_bytes += added;
        writer.entry_count += 1;

        trace!(seq_no, timestamp, level, size_bytes = writer.size_bytes, "inserted entry");
        Ok(())
    }

    /// Value of the newest version of `key`.
    ///
    /// `Some` with an empty value is a deletion marker and is not the same as
    /// `None` (no version of `key` in this memtable).
    pub fn find(&self, key: &[u8]) -> Result<Option<Bytes>> {
        self.find_at(key, i64::MAX)
    }

    /// Value of the newest version of `key` with timestamp `<= read_timestamp`.
    pub fn find_at(&self, key: &[u8], read_timestamp: i64) -> Result<Option<Bytes>> {
        if key.is_empty() {
            error!("lookup with empty key");
            return Err(MemTableError::EmptyKey);
        }

        let found = self
            .find_greater_or_equal(key, read_timestamp, None)
            .filter(|node| node.key() == key)
            .map(|node| node.value().clone());
        Ok(found)
    }

    /// Approximate memory used by the entries, in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.writer.lock().size_bytes
    }

    /// Largest log sequence number applied.
    pub fn sequence_upper(&self) -> i64 {
        self.writer.lock().seq_upper
    }

    /// Number of entries (versions, not distinct keys).
    pub fn len(&self) -> usize {
        self.writer.lock().entry_count
    }

    /// True if nothing has been published yet. Does not lock.
    pub fn is_empty(&self) -> bool {
        self.head.next(0).is_none()
    }

    /// Check if the size estimate has reached the configured flush threshold.
    pub fn should_flush(&self) -> bool {
        self.size_bytes() >= self.config.flush_threshold_bytes
    }

    pub fn config(&self) -> &MemTableConfig {
        &self.config
    }

    /// Cursor over every entry in `(key asc, timestamp desc)` order.
    ///
    /// Not a snapshot: entries published after the cursor has moved past
    /// their position are not seen, others may be.
    pub fn iter(&self) -> MemTableIterator<'_> {
        MemTableIterator::new(self)
    }

    pub(crate) fn head(&self) -> &Node {
        &self.head
    }

    /// First node at or after `(key, timestamp)`, or `None` past the end.
    ///
    /// If `predecessors` is given, it is filled with the last node visited on
    /// each level.
    pub(crate) fn find_greater_or_equal<'a>(
        &'a self,
        key: &[u8],
        timestamp: i64,
        mut predecessors: Option<&mut [&'a Node; MAX_LEVEL]>,
    ) -> Option<&'a Node> {
        let mut current = &self.head;
        let mut next = None;

        for level in (0..MAX_LEVEL).rev() {
            next = current.next(level);
            while let Some(candidate) = next {
                if !candidate.sorts_before(key, timestamp) {
                    break;
                }
                current = candidate;
                next = current.next(level);
            }

            if let Some(predecessors) = predecessors.as_deref_mut() {
                predecessors[level] = current;
            }
        }

        next
    }
}

impl Drop for MemTable {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no reader or iterator is borrowing any node.
        unsafe { Node::free_chain(&self.head) }
    }
}

impl std::fmt::Debug for MemTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let writer = self.writer.lock();
        f.debug_struct("MemTable")
            .field("seq_upper", &writer.seq_upper)
            .field("size_bytes", &writer.size_bytes)
            .field("entry_count", &writer.entry_count)
            .field("config", &self.config)
            .finish()
    }
}
