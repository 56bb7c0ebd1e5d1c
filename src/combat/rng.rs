//! Seedable random number generator for base damage/healing rolls.
//!
//! A seeded `GameRng` makes scenario runs reproducible.

use bevy::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

#[derive(Resource, Debug, Clone)]
pub struct GameRng {
    rng: StdRng,
    /// Seed for reproducible runs; None when drawn from entropy
    pub seed: Option<u64>,
}

impl GameRng {
    /// Reproducible generator: the same seed yields the same rolls
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Uniform in `[0, 1)`
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in `[min, max]`; returns `min` for an empty range.
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + self.random_f32() * (max - min)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GameRng::from_seed(42);
        let mut b = GameRng::from_seed(42);
        for _ in 0..10 {
            assert_eq!(a.random_range(10.0, 20.0), b.random_range(10.0, 20.0));
        }
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = GameRng::from_seed(7);
        for _ in 0..100 {
            let roll = rng.random_range(5.0, 6.0);
            assert!((5.0..=6.0).contains(&roll));
        }
        assert_eq!(rng.random_range(3.0, 3.0), 3.0);
    }
}
