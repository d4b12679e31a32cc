//! Compiled-product evaluation against a simulated path.
//!
//! Conditions evaluate to a fuzzy degree in [0, 1] rather than a boolean.
//! When the degree is interior, both branches of an `if` run and every
//! variable either branch touches is blended by the degree; this keeps the
//! per-path value continuous (and therefore differentiable) in the model
//! inputs. Degrees within `CUT` of 0 or 1 collapse to a single branch, so
//! paths far from the threshold pay no extra cost.

use tenor_core::math::smoothing::{butterfly, call_spread};
use tenor_core::{Compute, Sample, Value};

use crate::ast::{CmpOp, Cond, Expr, Stmt};
use crate::error::EvalError;
use crate::product::Product;

/// Degrees closer than this to 0 or 1 run one branch only.
const CUT: f64 = 1e-12;

/// Evaluation state for one product under one compute context.
///
/// Holds the variable store and the per-depth snapshot buffers used to run
/// both branches of a fuzzy condition. Create one per path in recording
/// mode (constants live on the tape); in plain mode an instance can be
/// reused across paths.
pub struct Evaluator<C: Compute> {
    cx: C,
    vars: Vec<C::Num>,
    snapshots: Vec<Vec<C::Num>>,
    default_width: f64,
}

impl<C: Compute> Evaluator<C> {
    /// Sizes the variable store and snapshot buffers for `product`.
    ///
    /// `default_width` is the smoothing width applied to conditions without
    /// an explicit `: width` annotation.
    pub fn new(cx: C, product: &Product, default_width: f64) -> Self {
        let zero = cx.constant(0.0);
        let n_vars = product.variables().len();
        Evaluator {
            cx,
            vars: vec![zero; n_vars],
            snapshots: vec![vec![zero; n_vars]; product.max_nested_ifs],
            default_width,
        }
    }

    /// Runs every event against the path and returns the sum of the leg
    /// variables.
    ///
    /// `path` carries one sample per event, in timeline order. Variables
    /// start at zero, so a read before the first write yields zero.
    ///
    /// # Errors
    ///
    /// [`EvalError::NonFinite`] as soon as any stored variable stops being
    /// finite.
    pub fn evaluate(
        &mut self,
        product: &Product,
        path: &[Sample<C::Num>],
    ) -> Result<C::Num, EvalError> {
        debug_assert_eq!(path.len(), product.event_count());
        let zero = self.cx.constant(0.0);
        for var in &mut self.vars {
            *var = zero;
        }
        for (stmts, sample) in product.events.iter().zip(path) {
            self.exec_block(product, stmts, sample, 0)?;
        }
        let mut total = zero;
        for (i, info) in product.variables().iter().enumerate() {
            if info.is_leg {
                total = total + self.vars[i];
            }
        }
        Ok(total)
    }

    fn exec_block(
        &mut self,
        product: &Product,
        stmts: &[Stmt],
        sample: &Sample<C::Num>,
        depth: usize,
    ) -> Result<(), EvalError> {
        for stmt in stmts {
            self.exec_stmt(product, stmt, sample, depth)?;
        }
        Ok(())
    }

    fn exec_stmt(
        &mut self,
        product: &Product,
        stmt: &Stmt,
        sample: &Sample<C::Num>,
        depth: usize,
    ) -> Result<(), EvalError> {
        match stmt {
            Stmt::Assign { var, expr } => {
                self.vars[*var] = self.eval_expr(expr, sample);
                self.check_finite(product, *var)
            }
            Stmt::Pays { var, expr } => {
                let amount = self.eval_expr(expr, sample);
                self.vars[*var] = self.vars[*var] + amount / sample.numeraire;
                self.check_finite(product, *var)
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                affected,
            } => {
                let degree = self.eval_cond(cond, sample);
                let d = degree.value();
                if d > 1.0 - CUT {
                    self.exec_block(product, then_branch, sample, depth)
                } else if d < CUT {
                    self.exec_block(product, else_branch, sample, depth)
                } else {
                    // Snapshot, run both branches, blend by the degree.
                    for &v in affected {
                        self.snapshots[depth][v] = self.vars[v];
                    }
                    self.exec_block(product, then_branch, sample, depth + 1)?;
                    for &v in affected {
                        std::mem::swap(&mut self.vars[v], &mut self.snapshots[depth][v]);
                    }
                    self.exec_block(product, else_branch, sample, depth + 1)?;
                    for &v in affected {
                        let then_value = self.snapshots[depth][v];
                        let else_value = self.vars[v];
                        self.vars[v] = then_value * degree + else_value * (-degree + 1.0);
                    }
                    Ok(())
                }
            }
        }
    }

    fn check_finite(&self, product: &Product, var: usize) -> Result<(), EvalError> {
        if self.vars[var].value().is_finite() {
            Ok(())
        } else {
            Err(EvalError::NonFinite {
                variable: product.variables()[var].name.clone(),
            })
        }
    }

    fn eval_cond(&self, cond: &Cond, sample: &Sample<C::Num>) -> C::Num {
        match cond {
            Cond::Cmp { spread, op, width } => {
                let x = self.eval_expr(spread, sample);
                let w = width.unwrap_or(self.default_width);
                match op {
                    CmpOp::Gt => call_spread(x, w),
                    CmpOp::Eq => butterfly(x, w),
                    CmpOp::Neq => -butterfly(x, w) + 1.0,
                }
            }
            Cond::And(a, b) => self.eval_cond(a, sample) * self.eval_cond(b, sample),
            Cond::Or(a, b) => {
                let da = self.eval_cond(a, sample);
                let db = self.eval_cond(b, sample);
                da + db - da * db
            }
            Cond::Not(a) => -self.eval_cond(a, sample) + 1.0,
        }
    }

    fn eval_expr(&self, expr: &Expr, sample: &Sample<C::Num>) -> C::Num {
        match expr {
            Expr::Const(c) => self.cx.constant(*c),
            Expr::Var(i) => self.vars[*i],
            Expr::Spot => sample.spot,
            Expr::Add(a, b) => self.eval_expr(a, sample) + self.eval_expr(b, sample),
            Expr::Sub(a, b) => self.eval_expr(a, sample) - self.eval_expr(b, sample),
            Expr::Mul(a, b) => self.eval_expr(a, sample) * self.eval_expr(b, sample),
            Expr::Div(a, b) => self.eval_expr(a, sample) / self.eval_expr(b, sample),
            Expr::Pow(a, b) => {
                let base = self.eval_expr(a, sample);
                let exponent = self.eval_expr(b, sample);
                base.powf(exponent)
            }
            Expr::Neg(a) => -self.eval_expr(a, sample),
            Expr::Log(a) => self.eval_expr(a, sample).ln(),
            Expr::Sqrt(a) => self.eval_expr(a, sample).sqrt(),
            Expr::Exp(a) => self.eval_expr(a, sample).exp(),
            Expr::Max(args) => self.fold_extremum(args, sample, Value::maximum),
            Expr::Min(args) => self.fold_extremum(args, sample, Value::minimum),
        }
    }

    fn fold_extremum(
        &self,
        args: &[Expr],
        sample: &Sample<C::Num>,
        pick: fn(C::Num, C::Num) -> C::Num,
    ) -> C::Num {
        let mut acc = self.eval_expr(&args[0], sample);
        for arg in &args[1..] {
            acc = pick(acc, self.eval_expr(arg, sample));
        }
        acc
    }
}
