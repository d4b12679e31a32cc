//! Simulation dynamics for the scripted Monte Carlo pricer.
//!
//! Models are generic over the arithmetic: built with a plain context they
//! simulate in `f64`, built with a recording context their parameters become
//! tape leaves and every simulated sample carries its dependency on them.
//! Building returns the leaf list in the same order as
//! [`ModelParams::bucket_labels`], so a gradient against those leaves is
//! already labelled.

pub mod analytic;
pub mod black_scholes;
pub mod dupire;
pub mod error;
pub mod model;
pub mod params;

pub use black_scholes::BlackScholes;
pub use dupire::Dupire;
pub use error::ModelError;
pub use model::Model;
pub use params::{BsParams, DupireParams, ModelParams};
