//! Compiled statement tree.
//!
//! Every name is resolved at parse time: cells fold to [`Expr::Const`] and
//! state variables to [`Expr::Var`] indices into the product's variable
//! table. The tree carries no strings, no interior mutability and no parse
//! state, so compiled products are `Send + Sync` and evaluation is pure
//! index arithmetic.

/// An arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal, cell reference or folded `DCF(...)` call
    Const(f64),
    /// State variable, by index into the product's variable table
    Var(usize),
    /// The simulated underlying at the current event, `spot()`
    Spot,
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// `base ^ exponent`
    Pow(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Log(Box<Expr>),
    Sqrt(Box<Expr>),
    Exp(Box<Expr>),
    /// `MAX(...)`, two or more arguments
    Max(Vec<Expr>),
    /// `MIN(...)`, two or more arguments
    Min(Vec<Expr>),
}

/// Comparison flavour after normalisation.
///
/// `<` and `<=` are rewritten at parse time by negating the spread, so only
/// these flavours survive. Under smoothing, strict and non-strict
/// inequalities evaluate identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// spread > 0 (also covers >=)
    Gt,
    /// spread == 0
    Eq,
    /// spread != 0
    Neq,
}

/// A boolean condition, evaluated to a fuzzy degree in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// An atomic comparison on `spread = lhs - rhs`.
    Cmp {
        spread: Expr,
        op: CmpOp,
        /// Explicit smoothing width from `: width`, if given
        width: Option<f64>,
    },
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
    Not(Box<Cond>),
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var = expr`
    Assign { var: usize, expr: Expr },
    /// `var pays expr`: accumulates the deflated amount into a leg variable
    Pays { var: usize, expr: Expr },
    /// `if cond then ... [else ...] end`
    If {
        cond: Cond,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        /// Variables written anywhere under this node (both branches,
        /// nested ifs included), sorted. Used to snapshot state before
        /// running both branches of a fuzzy condition.
        affected: Vec<usize>,
    },
}
