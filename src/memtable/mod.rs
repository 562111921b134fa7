//! MemTable Module
//!
//! In-memory buffer of recently applied mutations.
//!
//! ## Responsibilities
//! - Hold every version of every key, newest version first
//! - Single serialized writer, lock-free readers
//! - Enforce log replay order through the sequence watermark
//! - Track size for flush triggers
//! - Ordered iteration for sorted-file creation
//!
//! ## Data Structure
//! A skip list of up to 16 levels. Each level is a singly linked chain
//! of atomic forward links starting at a sentinel head:
//!
//! ```text
//! level 2: head ─────────────────────► (b,7) ─────────────────────► nil
//! level 1: head ──────► (a,9) ───────► (b,7) ──────────────────────► nil
//! level 0: head ──► (a,9) ──► (a,3) ──► (b,7) ──► (c,5) ──► (c,1) ──► nil
//! ```
//!
//! Entries are ordered by key ascending, then timestamp descending. An insert
//! fully builds its node, fills in the node's own links, and only then
//! redirects each predecessor's link to it with a release store. Readers load
//! links with acquire ordering and never take the writer lock.

mod iterator;
mod level;
mod node;
mod table;

pub use iterator::{EntryRef, MemTableIterator};
pub use level::{pick_level, seeded_source, LevelSource, MAX_LEVEL};
pub use table::MemTable;
