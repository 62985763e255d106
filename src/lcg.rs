//! The linear congruential generator used for parameter initialization and sample shuffling.
//!
//! Trained models and the golden tests depend on the exact sequence, so the recurrence, its
//! constants and the 32-bit wraparound must not change.

use rand::{RngCore, SeedableRng};

/// Multiplier of the recurrence.
pub const LCG_A: u32 = 1103515245;
/// Increment of the recurrence.
pub const LCG_B: u32 = 12345;

/// `seed' = seed * A + B (mod 2^32)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// The current state.
    /// Feeding it into [`Lcg::new`] continues the sequence where this generator left off.
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// Advances the state and returns the new value.
    #[inline(always)]
    pub fn draw(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_A).wrapping_add(LCG_B);
        self.state
    }

    /// Next draw mapped into `[0, 1)`.
    pub fn draw_unit(&mut self) -> f64 {
        unit_interval(self.draw())
    }
}

/// Maps a raw draw into `[0, 1)` as `draw / 2^32`.
#[inline(always)]
pub fn unit_interval(draw: u32) -> f64 {
    draw as f64 / 4294967296.0
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        self.draw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.draw() as u64;
        let lo = self.draw() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.draw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Lcg {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    /// Keeps the low 32 bits, so `seed_from_u64(42)` is the same generator as `Lcg::new(42)`.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}
