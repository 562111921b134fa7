//! MemTable Iterator
//!
//! Sequential walk over the level-0 chain, used by the flush path to write a
//! sorted file.

use bytes::Bytes;

use super::node::Node;
use super::table::MemTable;

/// Borrowed view of one published entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    pub key: &'a [u8],
    pub timestamp: i64,
    /// Empty for a deletion marker
    pub value: &'a Bytes,
    /// Number of levels the entry is linked into (level + 1)
    pub height: usize,
}

impl<'a> EntryRef<'a> {
    fn from_node(node: &'a Node) -> Self {
        Self {
            key: node.key(),
            timestamp: node.timestamp(),
            value: node.value(),
            height: node.height(),
        }
    }

    /// True if this version records a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }
}

/// Cursor over a memtable in `(key asc, timestamp desc)` order.
///
/// Starts before the first entry; call [`advance`](Self::advance) to position
/// it. Every step is a single acquire load, so entries are always seen fully
/// built, and because inserts only ever splice nodes in ahead of existing
/// links the cursor never revisits or skips an entry it had already reached.
///
/// Call [`close`](Self::close) when done.
pub struct MemTableIterator<'a> {
    memtable: &'a MemTable,

    /// The head while unpositioned, then the current entry. `None` once exhausted.
    cursor: Option<&'a Node>,

    positioned: bool,
}

impl<'a> MemTableIterator<'a> {
    pub(super) fn new(memtable: &'a MemTable) -> Self {
        Self {
            memtable,
            cursor: Some(memtable.head()),
            positioned: false,
        }
    }

    /// Move to the next entry. Returns false once the chain is exhausted.
    pub fn advance(&mut self) -> bool {
        self.cursor = self.cursor.and_then(|node| node.next(0));
        self.positioned = true;
        self.cursor.is_some()
    }

    /// Position on the newest version of the first key `>= key`.
    ///
    /// Returns false if no such entry exists.
    pub fn seek(&mut self, key: &[u8]) -> bool {
        self.cursor = self.memtable.find_greater_or_equal(key, i64::MAX, None);
        self.positioned = true;
        self.cursor.is_some()
    }

    /// The current entry, if positioned on one.
    pub fn entry(&self) -> Option<EntryRef<'a>> {
        if !self.positioned {
            return None;
        }
        self.cursor.map(EntryRef::from_node)
    }

    pub fn key(&self) -> Option<&'a [u8]> {
        self.entry().map(|entry| entry.key)
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.entry().map(|entry| entry.timestamp)
    }

    pub fn value(&self) -> Option<&'a Bytes> {
        self.entry().map(|entry| entry.value)
    }

    /// Release the iterator.
    pub fn close(self) {}
}

impl<'a> Iterator for MemTableIterator<'a> {
    type Item = EntryRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.entry()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for MemTableIterator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTableIterator")
            .field("positioned", &self.positioned)
            .field("current", &self.entry())
            .finish()
    }
}
