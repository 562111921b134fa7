//! Level assignment
//!
//! Each new entry gets a level drawn from a geometric distribution: level 0
//! with probability 1/2, level 1 with probability 1/4, and so on, capped at
//! `MAX_LEVEL - 1`.

use oorandom::Rand32;

use crate::config::LevelSeed;
use crate::error::Result;

/// Number of levels spanned by the head node.
pub const MAX_LEVEL: usize = 16;

/// Mask selecting a uniform draw in `[0, 2^MAX_LEVEL)`.
const LEVEL_MASK: u32 = (1 << MAX_LEVEL) - 1;

/// Source of randomness for level assignment.
///
/// Implementations must eventually produce a value whose low `MAX_LEVEL` bits
/// are not all zero, otherwise `pick_level` never returns.
pub trait LevelSource: Send {
    /// Produces a random `u32` in the range `[0, u32::MAX]`.
    fn rand_u32(&mut self) -> u32;
}

impl LevelSource for Rand32 {
    #[inline]
    fn rand_u32(&mut self) -> u32 {
        Rand32::rand_u32(self)
    }
}

/// Build the default level source for a seed strategy.
pub fn seeded_source(seed: LevelSeed) -> Result<Box<dyn LevelSource>> {
    let seed = match seed {
        LevelSeed::Fixed(seed) => seed,
        LevelSeed::Entropy => getrandom::u64()?,
    };
    Ok(Box::new(Rand32::new(seed)))
}

/// Pick a zero-indexed level.
///
/// Draws a nonzero integer uniformly from `[1, 2^MAX_LEVEL)` and counts its
/// trailing zero bits, which is the closed form of flipping a coin until it
/// comes up heads.
pub fn pick_level<S: LevelSource + ?Sized>(source: &mut S) -> usize {
    loop {
        let draw = source.rand_u32() & LEVEL_MASK;
        if draw != 0 {
            return draw.trailing_zeros() as usize;
        }
    }
}
