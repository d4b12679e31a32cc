//! Shared value types: dates, day counts, schedule frequencies, path samples.

pub mod error;
pub mod sample;
pub mod time;

pub use error::{DateError, SurfaceError};
pub use sample::Sample;
pub use time::{Date, DayCount, Tenor};
