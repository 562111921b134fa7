//! Skip-list nodes and their atomic forward links.
//!
//! A node is fully built (key, timestamp, value and every forward link)
//! before any other node's link is pointed at it, and nothing about it changes
//! afterwards except its own links being redirected forward by later inserts.
//!
//! Nodes are never reclaimed while the owning memtable is alive; the memtable
//! frees the whole level-0 chain when it is dropped. That is why link loads
//! use `epoch::unprotected()`: there is no concurrent reclamation to guard
//! against.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use crossbeam::epoch::{self, Atomic, Owned, Shared};

pub(crate) struct Node {
    key: Bytes,
    timestamp: i64,
    value: Bytes,
    next: Box<[Atomic<Node>]>,
}

impl Node {
    /// The sentinel head: no key, links on every level.
    pub(crate) fn head(levels: usize) -> Self {
        Self::new(Bytes::new(), 0, Bytes::new(), levels)
    }

    pub(crate) fn new(key: Bytes, timestamp: i64, value: Bytes, height: usize) -> Self {
        Self {
            key,
            timestamp,
            value,
            next: (0..height).map(|_| Atomic::null()).collect(),
        }
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub(crate) fn value(&self) -> &Bytes {
        &self.value
    }

    /// Number of levels this node is linked into.
    pub(crate) fn height(&self) -> usize {
        self.next.len()
    }

    /// True if this node sorts strictly before `(key, timestamp)`:
    /// keys ascending, then timestamps descending.
    pub(crate) fn sorts_before(&self, key: &[u8], timestamp: i64) -> bool {
        match self.key().cmp(key) {
            CmpOrdering::Less => true,
            CmpOrdering::Equal => self.timestamp > timestamp,
            CmpOrdering::Greater => false,
        }
    }

    pub(crate) fn matches(&self, key: &[u8], timestamp: i64) -> bool {
        self.timestamp == timestamp && self.key() == key
    }

    /// Load the successor at `level` with acquire ordering, pairing with the
    /// release store in [`Node::publish_after`].
    pub(crate) fn next(&self, level: usize) -> Option<&Node> {
        // SAFETY: every non-null link points at a node allocated by
        // `Node::publish_after` and owned by the same memtable as `self`.
        // Nodes are only freed when the memtable is dropped, which cannot
        // happen while `&self` (borrowed from that memtable) is alive, so the
        // successor outlives the returned reference.
        unsafe {
            let guard = epoch::unprotected();
            self.next[level].load(Ordering::Acquire, guard).as_ref()
        }
    }

    /// Link a freshly built `node` in after `predecessors[level]` on every
    /// level the node spans.
    ///
    /// Must be called with the memtable's insert lock held; `predecessors`
    /// must come from a search made under that same lock.
    pub(crate) fn publish_after(node: Node, predecessors: &[&Node]) {
        // SAFETY: no other thread frees nodes (see module docs).
        let guard = unsafe { epoch::unprotected() };
        let height = node.height();
        let node = Owned::new(node).into_shared(guard);

        // SAFETY: `node` was just allocated above and is not null.
        let new_node = unsafe { node.deref() };

        // Populate every forward link of the new node while it is still
        // private to this thread.
        for (level, prev) in predecessors.iter().enumerate().take(height) {
            let successor = prev.next[level].load(Ordering::Relaxed, guard);
            new_node.next[level].store(successor, Ordering::Relaxed);
        }

        // Only now make it reachable, bottom level first.
        for (level, prev) in predecessors.iter().enumerate().take(height) {
            prev.next[level].store(node, Ordering::Release);
        }
    }

    /// Free every node reachable from `head` on level 0.
    ///
    /// # Safety
    /// Caller must have exclusive access to the whole structure, and no
    /// reference into it may outlive this call.
    pub(crate) unsafe fn free_chain(head: &Node) {
        let guard = unsafe { epoch::unprotected() };
        let mut current = head.next[0].swap(Shared::null(), Ordering::Relaxed, guard);
        while !current.is_null() {
            // SAFETY: each node on level 0 appears there exactly once and the
            // caller guarantees nobody else can reach it anymore.
            let owned = unsafe { current.into_owned() };
            current = owned.next[0].load(Ordering::Relaxed, guard);
            drop(owned);
        }
    }
}
