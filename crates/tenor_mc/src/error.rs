//! Engine errors.

use tenor_models::ModelError;
use tenor_script::ScriptError;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// At least one path is required.
    #[error("number of paths must be positive")]
    ZeroPaths,

    /// The default smoothing width must be positive.
    #[error("smoothing width must be positive, got {0}")]
    NonPositiveWidth(f64),
}

/// Errors raised by a simulation run.
///
/// Script and model errors convert into this type so a compile-then-price
/// pipeline propagates through one `?` chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A path overflowed under [`OverflowPolicy::FailFast`].
    ///
    /// [`OverflowPolicy::FailFast`]: crate::config::OverflowPolicy::FailFast
    #[error("numeric overflow on path {path}: {detail}")]
    NumericOverflow {
        /// Global path index
        path: u64,
        /// What overflowed
        detail: String,
    },

    /// Product compilation failed.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Model parameters failed validation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Every path overflowed under the discard policy; there is nothing to
    /// average.
    #[error("all paths were discarded")]
    AllPathsDiscarded,
}
