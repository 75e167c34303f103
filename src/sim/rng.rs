//! Seeded random source for spawn rolls, placement jitter and voice line picks

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

#[derive(Debug, Clone)]
pub struct GameRng {
    rng: Pcg32,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform float in [lo, hi]; returns `lo` for an empty or inverted range
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Spawn roll in [0, 100]
    pub fn percent(&mut self) -> f32 {
        self.range_f32(0.0, 100.0)
    }

    /// Uniform index into a collection of `len` items
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.random_range(0..len))
    }

    /// Uniform pick from a slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }
}
