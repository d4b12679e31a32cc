//! The adjoint tape and tape-bound variables.

use std::cell::RefCell;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// One recorded operation.
///
/// Local partial derivatives are evaluated and cached during the forward
/// pass, so the reverse sweep is a pure multiply-accumulate over the node
/// list and never revisits operand values.
#[derive(Debug, Clone, Copy)]
enum Node {
    /// An input to the calculation; the reverse sweep stops here.
    Leaf,
    /// Result of a one-operand operation.
    Unary {
        /// Index of the operand node
        arg: u32,
        /// Partial derivative with respect to the operand
        d: f64,
    },
    /// Result of a two-operand operation.
    Binary {
        /// Index of the left operand node
        lhs: u32,
        /// Index of the right operand node
        rhs: u32,
        /// Partial derivative with respect to the left operand
        dl: f64,
        /// Partial derivative with respect to the right operand
        dr: f64,
    },
}

/// A recording of one forward calculation.
///
/// The tape is single-threaded by construction (interior mutability through
/// `RefCell`); parallel risk runs hold one tape per worker. After a reverse
/// sweep the tape can be [`cleared`](Tape::clear) and reused for the next
/// path, which keeps the node buffer allocation warm.
///
/// # Examples
///
/// ```
/// use tenor_core::aad::Tape;
///
/// let tape = Tape::new();
/// let x = tape.leaf(2.0);
/// let y = tape.leaf(3.0);
/// let z = x * y + x.exp();
///
/// let grad = tape.gradient(z, &[x, y]);
/// assert!((grad[0] - (3.0 + 2.0f64.exp())).abs() < 1e-12);
/// assert!((grad[1] - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<Node>>,
}

impl Tape {
    /// Creates an empty tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tape with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: RefCell::new(Vec::with_capacity(capacity)),
        }
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Whether the tape holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Discards all recorded nodes, keeping the buffer allocation.
    ///
    /// Any [`Var`] created before the clear is invalidated and must not be
    /// used afterwards.
    pub fn clear(&self) {
        self.nodes.borrow_mut().clear();
    }

    /// Records an input variable.
    pub fn leaf(&self, value: f64) -> Var<'_> {
        let index = self.push(Node::Leaf);
        Var {
            tape: self,
            index,
            value,
        }
    }

    fn push(&self, node: Node) -> u32 {
        let mut nodes = self.nodes.borrow_mut();
        let index = nodes.len() as u32;
        nodes.push(node);
        index
    }

    /// Runs the reverse sweep from `target` and returns the derivative of
    /// `target` with respect to each entry of `wrt`, in order.
    ///
    /// Nodes whose accumulated adjoint is zero are skipped, so dead
    /// branches of the recording cost nothing on the way back.
    pub fn gradient(&self, target: Var<'_>, wrt: &[Var<'_>]) -> Vec<f64> {
        let nodes = self.nodes.borrow();
        let mut adjoint = vec![0.0; nodes.len()];
        adjoint[target.index as usize] = 1.0;
        for i in (0..=target.index as usize).rev() {
            let a = adjoint[i];
            if a == 0.0 {
                continue;
            }
            match nodes[i] {
                Node::Leaf => {}
                Node::Unary { arg, d } => {
                    adjoint[arg as usize] += a * d;
                }
                Node::Binary { lhs, rhs, dl, dr } => {
                    adjoint[lhs as usize] += a * dl;
                    adjoint[rhs as usize] += a * dr;
                }
            }
        }
        wrt.iter().map(|v| adjoint[v.index as usize]).collect()
    }
}

/// A number bound to a [`Tape`].
///
/// `Var` is `Copy` and carries its forward value, so reading a value never
/// touches the tape; only arithmetic does.
#[derive(Debug, Clone, Copy)]
pub struct Var<'t> {
    tape: &'t Tape,
    index: u32,
    value: f64,
}

impl<'t> Var<'t> {
    /// The forward value.
    pub fn value(self) -> f64 {
        self.value
    }

    fn unary(self, value: f64, d: f64) -> Var<'t> {
        let index = self.tape.push(Node::Unary {
            arg: self.index,
            d,
        });
        Var {
            tape: self.tape,
            index,
            value,
        }
    }

    fn binary(self, rhs: Var<'t>, value: f64, dl: f64, dr: f64) -> Var<'t> {
        let index = self.tape.push(Node::Binary {
            lhs: self.index,
            rhs: rhs.index,
            dl,
            dr,
        });
        Var {
            tape: self.tape,
            index,
            value,
        }
    }

    /// `e^self`
    pub fn exp(self) -> Var<'t> {
        let y = self.value.exp();
        self.unary(y, y)
    }

    /// Natural logarithm.
    pub fn ln(self) -> Var<'t> {
        self.unary(self.value.ln(), 1.0 / self.value)
    }

    /// Square root.
    pub fn sqrt(self) -> Var<'t> {
        let y = self.value.sqrt();
        self.unary(y, 0.5 / y)
    }

    /// Absolute value. The derivative at zero is taken as the right limit.
    pub fn abs(self) -> Var<'t> {
        let d = if self.value < 0.0 { -1.0 } else { 1.0 };
        self.unary(self.value.abs(), d)
    }

    /// `self` raised to the power `exponent`.
    ///
    /// The partial with respect to the exponent involves `ln(base)` and is
    /// taken as zero for non-positive bases.
    pub fn powf(self, exponent: Var<'t>) -> Var<'t> {
        let a = self.value;
        let b = exponent.value;
        let y = a.powf(b);
        let dl = b * a.powf(b - 1.0);
        let dr = if a > 0.0 { y * a.ln() } else { 0.0 };
        self.binary(exponent, y, dl, dr)
    }

    /// The larger of the two values, with pathwise (one-sided) derivative.
    pub fn maximum(self, other: Var<'t>) -> Var<'t> {
        if self.value >= other.value {
            self.binary(other, self.value, 1.0, 0.0)
        } else {
            self.binary(other, other.value, 0.0, 1.0)
        }
    }

    /// The smaller of the two values, with pathwise (one-sided) derivative.
    pub fn minimum(self, other: Var<'t>) -> Var<'t> {
        if self.value <= other.value {
            self.binary(other, self.value, 1.0, 0.0)
        } else {
            self.binary(other, other.value, 0.0, 1.0)
        }
    }

    /// Clamps into [0, 1]; the derivative is zero on the flat parts.
    pub fn clamp01(self) -> Var<'t> {
        let inside = self.value > 0.0 && self.value < 1.0;
        self.unary(
            self.value.clamp(0.0, 1.0),
            if inside { 1.0 } else { 0.0 },
        )
    }
}

impl<'t> Add for Var<'t> {
    type Output = Var<'t>;
    fn add(self, rhs: Var<'t>) -> Var<'t> {
        self.binary(rhs, self.value + rhs.value, 1.0, 1.0)
    }
}

impl<'t> Sub for Var<'t> {
    type Output = Var<'t>;
    fn sub(self, rhs: Var<'t>) -> Var<'t> {
        self.binary(rhs, self.value - rhs.value, 1.0, -1.0)
    }
}

impl<'t> Mul for Var<'t> {
    type Output = Var<'t>;
    fn mul(self, rhs: Var<'t>) -> Var<'t> {
        self.binary(rhs, self.value * rhs.value, rhs.value, self.value)
    }
}

impl<'t> Div for Var<'t> {
    type Output = Var<'t>;
    fn div(self, rhs: Var<'t>) -> Var<'t> {
        self.binary(
            rhs,
            self.value / rhs.value,
            1.0 / rhs.value,
            -self.value / (rhs.value * rhs.value),
        )
    }
}

impl<'t> Neg for Var<'t> {
    type Output = Var<'t>;
    fn neg(self) -> Var<'t> {
        self.unary(-self.value, -1.0)
    }
}

impl<'t> Add<f64> for Var<'t> {
    type Output = Var<'t>;
    fn add(self, rhs: f64) -> Var<'t> {
        self.unary(self.value + rhs, 1.0)
    }
}

impl<'t> Sub<f64> for Var<'t> {
    type Output = Var<'t>;
    fn sub(self, rhs: f64) -> Var<'t> {
        self.unary(self.value - rhs, 1.0)
    }
}

impl<'t> Mul<f64> for Var<'t> {
    type Output = Var<'t>;
    fn mul(self, rhs: f64) -> Var<'t> {
        self.unary(self.value * rhs, rhs)
    }
}

impl<'t> Div<f64> for Var<'t> {
    type Output = Var<'t>;
    fn div(self, rhs: f64) -> Var<'t> {
        self.unary(self.value / rhs, 1.0 / rhs)
    }
}
