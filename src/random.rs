// Scoped random source for conformance runs.
// Every configuration gets its own stream seeded from the run configuration,
// so a failure reproduces from the seed alone.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
    seed: u64,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        RandomStream {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The next 64 random bits.
    pub fn next_word(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Uniform draw from `[low, high]`.
    pub fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64 {
        debug_assert!(low <= high);
        self.rng.gen_range(low..=high)
    }

    pub fn coin(&mut self) -> bool {
        self.rng.gen()
    }
}
