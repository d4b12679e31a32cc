//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smoothing width applied to conditions without an explicit `: width`,
/// in units of the condition's spread.
pub const DEFAULT_SMOOTHING_WIDTH: f64 = 0.01;

/// Which driver supplies the Gaussian draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Low-discrepancy Sobol sequence, deterministic in the path index.
    Sobol,
    /// Counter-seeded pseudo-random draws, deterministic in the seed and
    /// path index.
    Pseudo,
}

/// What to do when a path's evaluation overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Abort the run with the offending path index.
    FailFast,
    /// Drop the path from the average and keep going.
    DiscardPath,
}

/// A validated simulation configuration.
///
/// Construct through [`SimConfig::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub n_paths: u64,
    pub sequence: SequenceKind,
    /// Reorder draws through a Brownian bridge so the leading sequence
    /// dimensions carry the large-scale shape of each path.
    pub use_bridge: bool,
    /// Seed for the pseudo-random driver; ignored by Sobol.
    pub seed: u64,
    pub smoothing_width: f64,
    /// Also compute first-order risk via the per-path adjoint tape.
    pub compute_risk: bool,
    pub overflow: OverflowPolicy,
}

impl SimConfig {
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.n_paths == 0 {
            return Err(ConfigError::ZeroPaths);
        }
        if !(self.smoothing_width > 0.0) {
            return Err(ConfigError::NonPositiveWidth(self.smoothing_width));
        }
        Ok(())
    }
}

/// Builder with engine defaults: 16384 Sobol paths with the Brownian
/// bridge, value only, fail fast on overflow.
#[derive(Debug, Clone)]
pub struct SimConfigBuilder {
    n_paths: u64,
    sequence: SequenceKind,
    use_bridge: bool,
    seed: u64,
    smoothing_width: f64,
    compute_risk: bool,
    overflow: OverflowPolicy,
}

impl Default for SimConfigBuilder {
    fn default() -> Self {
        Self {
            n_paths: 16_384,
            sequence: SequenceKind::Sobol,
            use_bridge: true,
            seed: 0,
            smoothing_width: DEFAULT_SMOOTHING_WIDTH,
            compute_risk: false,
            overflow: OverflowPolicy::FailFast,
        }
    }
}

impl SimConfigBuilder {
    pub fn n_paths(mut self, n_paths: u64) -> Self {
        self.n_paths = n_paths;
        self
    }

    pub fn sequence(mut self, sequence: SequenceKind) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn use_bridge(mut self, use_bridge: bool) -> Self {
        self.use_bridge = use_bridge;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn smoothing_width(mut self, width: f64) -> Self {
        self.smoothing_width = width;
        self
    }

    pub fn compute_risk(mut self, compute_risk: bool) -> Self {
        self.compute_risk = compute_risk;
        self
    }

    pub fn overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<SimConfig, ConfigError> {
        let config = SimConfig {
            n_paths: self.n_paths,
            sequence: self.sequence,
            use_bridge: self.use_bridge,
            seed: self.seed,
            smoothing_width: self.smoothing_width,
            compute_risk: self.compute_risk,
            overflow: self.overflow,
        };
        config.validate()?;
        Ok(config)
    }
}
