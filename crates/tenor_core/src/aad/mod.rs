//! Adjoint algorithmic differentiation.
//!
//! The tape records every arithmetic operation performed on [`Var`] values
//! during a forward pass, caching local partial derivatives on each node. A
//! single reverse sweep then yields the gradient of one output with respect
//! to every leaf, at a cost independent of the number of leaves.
//!
//! The [`Value`] trait lets the same pricing code run either on plain `f64`
//! (no recording, for value-only runs) or on tape-bound [`Var`] (for risk
//! runs); the [`Compute`] context abstracts over how numbers enter the
//! calculation.

pub mod tape;
pub mod value;

pub use tape::{Tape, Var};
pub use value::{Compute, Plain, Recorded, Value};
