//! The `Value` abstraction and compute contexts.

use std::ops::{Add, Div, Mul, Neg, Sub};

use super::tape::{Tape, Var};

/// The arithmetic a pricing calculation is allowed to use.
///
/// Implemented by plain `f64` and by the tape-bound [`Var`]. Code written
/// against this trait runs unchanged in value-only and risk modes. The
/// operator bounds include mixed `f64` right-hand sides so literals can be
/// folded in without materialising them as tape nodes.
pub trait Value:
    Copy
    + Neg<Output = Self>
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Mul<Self, Output = Self>
    + Div<Self, Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    /// The forward value as a plain float.
    fn value(self) -> f64;
    /// `e^self`
    fn exp(self) -> Self;
    /// Natural logarithm.
    fn ln(self) -> Self;
    /// Square root.
    fn sqrt(self) -> Self;
    /// Absolute value.
    fn abs(self) -> Self;
    /// `self` raised to the power `exponent`.
    fn powf(self, exponent: Self) -> Self;
    /// The larger of the two values.
    fn maximum(self, other: Self) -> Self;
    /// The smaller of the two values.
    fn minimum(self, other: Self) -> Self;
    /// Clamps into [0, 1].
    fn clamp01(self) -> Self;
}

impl Value for f64 {
    fn value(self) -> f64 {
        self
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln(self) -> Self {
        f64::ln(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    fn maximum(self, other: Self) -> Self {
        f64::max(self, other)
    }

    fn minimum(self, other: Self) -> Self {
        f64::min(self, other)
    }

    fn clamp01(self) -> Self {
        self.clamp(0.0, 1.0)
    }
}

impl<'t> Value for Var<'t> {
    fn value(self) -> f64 {
        Var::value(self)
    }

    fn exp(self) -> Self {
        Var::exp(self)
    }

    fn ln(self) -> Self {
        Var::ln(self)
    }

    fn sqrt(self) -> Self {
        Var::sqrt(self)
    }

    fn abs(self) -> Self {
        Var::abs(self)
    }

    fn powf(self, exponent: Self) -> Self {
        Var::powf(self, exponent)
    }

    fn maximum(self, other: Self) -> Self {
        Var::maximum(self, other)
    }

    fn minimum(self, other: Self) -> Self {
        Var::minimum(self, other)
    }

    fn clamp01(self) -> Self {
        Var::clamp01(self)
    }
}

/// How numbers enter a calculation.
///
/// `constant` introduces a number the gradient will never be taken against;
/// `leaf` introduces a differentiation input. In value-only mode the two are
/// identical.
pub trait Compute: Copy {
    /// The number type this context produces.
    type Num: Value;

    /// Introduces a constant.
    fn constant(&self, x: f64) -> Self::Num;

    /// Introduces a differentiation input.
    fn leaf(&self, x: f64) -> Self::Num;
}

/// Value-only context: numbers are plain `f64`, nothing is recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Compute for Plain {
    type Num = f64;

    fn constant(&self, x: f64) -> f64 {
        x
    }

    fn leaf(&self, x: f64) -> f64 {
        x
    }
}

/// Recording context: every number lives on the given tape.
#[derive(Debug, Clone, Copy)]
pub struct Recorded<'t>(pub &'t Tape);

impl<'t> Compute for Recorded<'t> {
    type Num = Var<'t>;

    fn constant(&self, x: f64) -> Var<'t> {
        self.0.leaf(x)
    }

    fn leaf(&self, x: f64) -> Var<'t> {
        self.0.leaf(x)
    }
}
