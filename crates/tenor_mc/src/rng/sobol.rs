//! Low-discrepancy Sobol driver.
//!
//! 32-bit Gray-code implementation. Dimension 0 uses the canonical van der
//! Corput direction numbers; higher dimensions derive their odd initial
//! numbers from a SplitMix64 hash of `(dimension, bit)`, which keeps the
//! generator dependency-free and fully deterministic. Points are consumed
//! advance-then-output, so the degenerate all-zeros point never appears.

use tenor_core::math::gaussian::inverse_normal_cdf;

use super::splitmix64;

const BITS: usize = 32;

/// A Sobol sequence of fixed dimension.
pub struct Sobol {
    /// `directions[d][k]` is the k-th direction number of dimension d,
    /// already shifted into the top bits.
    directions: Vec<[u32; BITS]>,
    state: Vec<u32>,
    index: u64,
}

impl Sobol {
    /// Creates the sequence positioned before its first point.
    pub fn new(dimension: usize) -> Self {
        let mut directions = Vec::with_capacity(dimension);
        for d in 0..dimension {
            let mut dirs = [0u32; BITS];
            for (k, dir) in dirs.iter_mut().enumerate() {
                let m = if d == 0 {
                    1
                } else {
                    // Odd and below 2^(k+1)
                    let mask = (1u64 << (k + 1)) - 1;
                    ((splitmix64((d as u64) << 6 | k as u64) & mask) | 1) as u32
                };
                *dir = m << (BITS - 1 - k);
            }
            directions.push(dirs);
        }
        Self {
            state: vec![0; dimension],
            directions,
            index: 0,
        }
    }

    /// The number of coordinates per point.
    pub fn dimension(&self) -> usize {
        self.state.len()
    }

    /// Repositions the sequence so the next point is point `n + 1`.
    ///
    /// Rebuilds the state from the Gray code of `n` directly; cost is one
    /// pass over the set bits, independent of `n`.
    pub fn skip_to(&mut self, n: u64) {
        let gray = n ^ (n >> 1);
        for (d, state) in self.state.iter_mut().enumerate() {
            let mut s = 0u32;
            for (k, &dir) in self.directions[d].iter().enumerate() {
                if gray >> k & 1 == 1 {
                    s ^= dir;
                }
            }
            *state = s;
        }
        self.index = n;
    }

    /// Advances and writes the next point's coordinates as uniforms in
    /// (0, 1).
    pub fn next_uniform(&mut self, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.dimension());
        self.index += 1;
        let c = self.index.trailing_zeros() as usize;
        for (d, u) in out.iter_mut().enumerate() {
            self.state[d] ^= self.directions[d][c];
            *u = (self.state[d] as f64 + 0.5) * (1.0 / 4_294_967_296.0);
        }
    }

    /// Advances and writes the next point mapped to standard Gaussians.
    pub fn next_gauss(&mut self, out: &mut [f64]) {
        self.next_uniform(out);
        for g in out.iter_mut() {
            *g = inverse_normal_cdf(*g);
        }
    }
}
