//! Error types shared across the workspace.

use thiserror::Error;

/// Date construction and parsing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid date components (e.g. February 30th).
    #[error("invalid date: {year}-{month:02}-{day:02}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse a date or tenor string.
    #[error("date parse error: {0}")]
    ParseError(String),

    /// Adding a tenor pushed the date outside the representable range.
    #[error("date arithmetic overflow: {date} + {tenor}")]
    Overflow {
        /// Starting date, ISO formatted
        date: String,
        /// Tenor that was being added
        tenor: String,
    },
}

/// Surface construction errors.
///
/// Raised when a two-dimensional grid (e.g. a local volatility surface)
/// does not form a valid rectangular, strictly increasing lattice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// An axis has fewer than two points.
    #[error("{axis} axis needs at least 2 points, got {len}")]
    AxisTooShort {
        /// Which axis ("spot" or "time")
        axis: &'static str,
        /// Number of points provided
        len: usize,
    },

    /// An axis is not strictly increasing.
    #[error("{axis} axis is not strictly increasing at index {index}")]
    AxisNotIncreasing {
        /// Which axis ("spot" or "time")
        axis: &'static str,
        /// Index of the first offending point
        index: usize,
    },

    /// The value grid does not match the axis lengths.
    #[error("surface grid is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        /// Rows provided
        rows: usize,
        /// Columns provided in the first mismatching row
        cols: usize,
        /// Expected rows (spot axis length)
        expected_rows: usize,
        /// Expected columns (time axis length)
        expected_cols: usize,
    },
}
