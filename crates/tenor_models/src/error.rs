//! Model construction errors.

use tenor_core::types::error::SurfaceError;
use thiserror::Error;

/// Errors raised while validating model parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A scalar parameter is out of range or not finite.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Which parameter
        name: &'static str,
        /// The offending value
        value: f64,
    },

    /// The local volatility surface is not a valid lattice.
    #[error("invalid volatility surface: {0}")]
    InvalidSurfaceShape(#[from] SurfaceError),
}
