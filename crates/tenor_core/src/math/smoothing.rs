//! Smoothing kernels for discontinuous payoff logic.
//!
//! Sharp conditions (digitals, barriers) destroy pathwise sensitivities: the
//! sample derivative of an indicator is zero almost everywhere. These kernels
//! replace the indicator with a ramp of finite width so the condition degree
//! is differentiable in the model parameters.

use crate::aad::Value;

/// Call spread smoothing of the indicator `1{x > 0}`.
///
/// Returns a degree in [0, 1]: `0` for `x <= -width/2`, `1` for
/// `x >= width/2`, and a linear ramp in between. As `width -> 0` this
/// converges to the sharp indicator.
///
/// # Arguments
///
/// * `x` - The condition spread (left side minus right side)
/// * `width` - Total width of the ramp, must be positive
///
/// # Examples
///
/// ```
/// use tenor_core::math::smoothing::call_spread;
///
/// assert_eq!(call_spread(0.0_f64, 1.0), 0.5);
/// assert_eq!(call_spread(10.0_f64, 1.0), 1.0);
/// assert_eq!(call_spread(-10.0_f64, 1.0), 0.0);
/// ```
pub fn call_spread<V: Value>(x: V, width: f64) -> V {
    debug_assert!(width > 0.0, "smoothing width must be positive");
    (x * (1.0 / width) + 0.5).clamp01()
}

/// Butterfly smoothing of the indicator `1{x == 0}`.
///
/// Returns a degree in [0, 1]: `1` at `x = 0`, falling linearly to `0` at
/// `|x| = width/2`.
///
/// # Arguments
///
/// * `x` - The condition spread (left side minus right side)
/// * `width` - Total width of the butterfly, must be positive
pub fn butterfly<V: Value>(x: V, width: f64) -> V {
    debug_assert!(width > 0.0, "smoothing width must be positive");
    (x.abs() * (-2.0 / width) + 1.0).clamp01()
}
