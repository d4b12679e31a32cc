//! Parallel Monte Carlo pricing engine.
//!
//! Paths are priced in fixed-size batches fanned out over a rayon pool and
//! reduced sequentially in batch order, so a given configuration returns
//! bitwise-identical results regardless of thread count. The driver layer
//! supplies standardized Gaussians per path, either from a low-discrepancy
//! Sobol sequence or from a counter-seeded pseudo-random generator, with an
//! optional Brownian bridge reordering in between.

pub mod config;
pub mod engine;
pub mod error;
pub mod results;
pub mod rng;

pub use config::{OverflowPolicy, SequenceKind, SimConfig, DEFAULT_SMOOTHING_WIDTH};
pub use engine::{monte_carlo_value, simulate};
pub use error::{ConfigError, SimError};
pub use results::SimResults;
