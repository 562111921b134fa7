//! # skipmem
//!
//! The in-memory write buffer of a log-structured, multi-versioned key-value
//! store:
//! - Concurrent skip list ordered by key ascending, timestamp descending
//! - Single serialized writer, any number of lock-free readers
//! - Sequence watermark enforcing write-ahead log replay order
//! - Size accounting for flush decisions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Write-ahead log (sequence numbers)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ LoggedMutation
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        MemTable                              │
//! │          insert (Mutex)      find / iter (lock-free)         │
//! └─────────────────────┬──────────────────────┬────────────────┘
//!                       │                      │
//!                       ▼                      ▼
//!               ┌───────────────┐      ┌───────────────┐
//!               │  Flush path   │      │  Point reads  │
//!               │ (iterator,    │      │  (find)       │
//!               │  size_bytes)  │      │               │
//!               └───────────────┘      └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod memtable;
pub mod mutation;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemTableError, Result};
pub use config::{LevelSeed, MemTableConfig};
pub use memtable::{EntryRef, LevelSource, MemTable, MemTableIterator, MAX_LEVEL};
pub use mutation::{LoggedMutation, Mutation};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of skipmem
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
