//! Event-based payoff scripting.
//!
//! A product is a list of events: a date (or schedule) paired with a short
//! script that reads the simulated spot, updates state variables and pays
//! cashflows. This crate compiles those scripts into an index-resolved form
//! and evaluates them against simulated paths with smoothed conditionals, so
//! the same compiled product prices cleanly in both value and adjoint runs.
//!
//! ```
//! use tenor_core::{Plain, Sample};
//! use tenor_script::{EventSource, Evaluator, Product, ValuationContext};
//!
//! let events = vec![
//!     EventSource::marker("strike", "110"),
//!     EventSource::dated(
//!         "2026-08-25".parse().unwrap(),
//!         "opt pays MAX(spot() - strike, 0)",
//!     ),
//! ];
//! let ctx = ValuationContext {
//!     valuation_date: "2025-08-25".parse().unwrap(),
//! };
//! let product = Product::compile(&events, &ctx).unwrap();
//!
//! let path = vec![Sample { spot: 130.0, numeraire: 1.0 }];
//! let mut eval = Evaluator::new(Plain, &product, 0.01);
//! let value = eval.evaluate(&product, &path).unwrap();
//! assert!((value - 20.0).abs() < 1e-12);
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod product;

pub use error::{EvalError, ScriptError};
pub use evaluator::Evaluator;
pub use product::{EventDate, EventSource, Product, ValuationContext, VarInfo};
