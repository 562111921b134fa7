//! Configuration for skipmem
//!
//! Centralized configuration with sensible defaults.

/// Seed used for level assignment when none is configured.
///
/// Keeping it fixed makes the shape of every memtable reproducible, which is
/// what tests and post-mortem diagnosis want.
pub const DEFAULT_LEVEL_SEED: u64 = 134787;

/// Main configuration for a memtable instance
#[derive(Debug, Clone)]
pub struct MemTableConfig {
    // -------------------------------------------------------------------------
    // Level Assignment
    // -------------------------------------------------------------------------
    /// Where the level source gets its seed
    pub level_seed: LevelSeed,

    // -------------------------------------------------------------------------
    // Flush Configuration
    // -------------------------------------------------------------------------
    /// Size estimate (in bytes) at which the memtable reports it should be flushed
    pub flush_threshold_bytes: u64,
}

/// Seed strategy for the level source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSeed {
    /// Deterministic shape, identical across runs
    Fixed(u64),

    /// Seed drawn from the operating system at construction
    Entropy,
}

impl Default for MemTableConfig {
    fn default() -> Self {
        Self {
            level_seed: LevelSeed::Fixed(DEFAULT_LEVEL_SEED),
            flush_threshold_bytes: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl MemTableConfig {
    /// Create a new config builder
    pub fn builder() -> MemTableConfigBuilder {
        MemTableConfigBuilder::default()
    }
}

/// Builder for MemTableConfig
#[derive(Default)]
pub struct MemTableConfigBuilder {
    config: MemTableConfig,
}

impl MemTableConfigBuilder {
    /// Set the level seed strategy
    pub fn level_seed(mut self, seed: LevelSeed) -> Self {
        self.config.level_seed = seed;
        self
    }

    /// Set the flush threshold (in bytes)
    pub fn flush_threshold_bytes(mut self, bytes: u64) -> Self {
        self.config.flush_threshold_bytes = bytes;
        self
    }

    pub fn build(self) -> MemTableConfig {
        self.config
    }
}
