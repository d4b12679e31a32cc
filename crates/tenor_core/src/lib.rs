//! Core numerics shared by the scripted Monte Carlo pricing workspace.
//!
//! This crate provides:
//! - `types`: dates, day counts, schedule frequencies, path samples, errors
//! - `math`: smoothing primitives, surface interpolation, Gaussian helpers
//! - `aad`: the adjoint tape, tape-bound variables, and the `Value`/`Compute`
//!   abstraction that lets the same pricing code run on plain `f64` or on
//!   recorded adjoint variables

pub mod aad;
pub mod math;
pub mod types;

pub use aad::{Compute, Plain, Recorded, Tape, Value, Var};
pub use types::sample::Sample;
pub use types::time::{Date, DayCount, Tenor};
