//! Numerical building blocks: smoothing kernels, surface interpolation and
//! Gaussian distribution helpers.

pub mod gaussian;
pub mod interp;
pub mod smoothing;

pub use gaussian::{inverse_normal_cdf, norm_cdf, norm_pdf};
pub use interp::BilinearSurface;
pub use smoothing::{butterfly, call_spread};
