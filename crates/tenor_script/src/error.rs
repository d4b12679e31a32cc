//! Script compilation and evaluation errors.

use thiserror::Error;

/// Errors raised while compiling a product.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// Malformed script text.
    #[error("syntax error on line {line}: {msg}")]
    Syntax {
        /// 1-based line within the event's script
        line: u32,
        /// What went wrong
        msg: String,
    },

    /// A name is read but never written and is not a cell.
    #[error("unbound identifier: {name}")]
    UnboundIdentifier {
        /// The offending name, lowercased
        name: String,
    },

    /// Event dates must be non-decreasing across the whole product.
    #[error("event dates not in order: {next} after {prev}")]
    NonMonotonicSchedule {
        /// The later of the out-of-order pair, ISO formatted
        prev: String,
        /// The date that broke the ordering, ISO formatted
        next: String,
    },

    /// An event is dated before the valuation date.
    #[error("event date {date} is before the valuation date")]
    EventBeforeValuation {
        /// The offending date, ISO formatted
        date: String,
    },

    /// A date range runs backwards (schedule bounds or DCF arguments).
    #[error("invalid date order: {start} is after {end}")]
    InvalidDateOrder {
        /// Range start, ISO formatted
        start: String,
        /// Range end, ISO formatted
        end: String,
    },

    /// A condition's explicit smoothing width is zero or negative.
    #[error("non-positive smoothing width on line {line}")]
    NonPositiveWidth {
        /// 1-based line within the event's script
        line: u32,
    },

    /// Wraps an error with the index of the event it occurred in.
    #[error("in event {index}: {source}")]
    Event {
        /// 0-based index into the product's event list
        index: usize,
        /// The underlying error
        #[source]
        source: Box<ScriptError>,
    },
}

impl ScriptError {
    /// Attaches an event index to an error, unless it already carries one.
    pub(crate) fn in_event(self, index: usize) -> Self {
        match self {
            err @ ScriptError::Event { .. } => err,
            err => ScriptError::Event {
                index,
                source: Box::new(err),
            },
        }
    }
}

/// Errors raised while evaluating a compiled product against a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A variable took a non-finite value (overflow, log of a non-positive
    /// number, division by zero).
    #[error("variable '{variable}' became non-finite")]
    NonFinite {
        /// Name of the variable that overflowed
        variable: String,
    },
}
