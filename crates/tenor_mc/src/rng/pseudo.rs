//! Counter-seeded pseudo-random driver.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::splitmix64;

/// Pseudo-random Gaussian source for one path.
///
/// Each path gets its own generator, seeded from the engine seed and the
/// global path index. Draws therefore depend only on `(seed, path)`, never
/// on batching or thread scheduling.
pub struct PathRng {
    rng: StdRng,
}

impl PathRng {
    /// Creates the generator for one global path index.
    pub fn for_path(seed: u64, path: u64) -> Self {
        let mixed = splitmix64(seed ^ splitmix64(path));
        Self {
            rng: StdRng::seed_from_u64(mixed),
        }
    }

    /// Fills `out` with independent standard Gaussians.
    pub fn fill_gauss(&mut self, out: &mut [f64]) {
        for g in out.iter_mut() {
            *g = self.rng.sample(StandardNormal);
        }
    }
}
