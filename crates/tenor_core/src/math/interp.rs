//! Surface interpolation.

use crate::types::error::SurfaceError;

/// Locates `x` on a strictly increasing axis.
///
/// Returns `(i, w)` such that `x` sits between `axis[i]` and `axis[i + 1]`
/// with interpolation weight `w` on the upper point. Outside the axis range
/// the weight is clamped to 0 or 1, giving flat extrapolation.
///
/// The axis must have at least two points.
pub fn locate(axis: &[f64], x: f64) -> (usize, f64) {
    debug_assert!(axis.len() >= 2);
    if x <= axis[0] {
        return (0, 0.0);
    }
    let last = axis.len() - 1;
    if x >= axis[last] {
        return (last - 1, 1.0);
    }
    // partition_point returns the first index with axis[i] > x
    let hi = axis.partition_point(|&a| a <= x);
    let lo = hi - 1;
    let w = (x - axis[lo]) / (axis[hi] - axis[lo]);
    (lo, w)
}

/// A rectangular surface with bilinear interpolation and flat extrapolation.
///
/// Values are stored row-major: `values[i][j]` is the level at
/// `(spots[i], times[j])`.
///
/// # Examples
///
/// ```
/// use tenor_core::math::interp::BilinearSurface;
///
/// let surface = BilinearSurface::new(
///     vec![90.0, 110.0],
///     vec![0.0, 1.0],
///     vec![vec![0.2, 0.22], vec![0.18, 0.2]],
/// ).unwrap();
///
/// assert!((surface.value_at(100.0, 0.5) - 0.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct BilinearSurface {
    spots: Vec<f64>,
    times: Vec<f64>,
    values: Vec<Vec<f64>>,
}

impl BilinearSurface {
    /// Creates a surface, validating the lattice.
    ///
    /// # Errors
    ///
    /// Returns a `SurfaceError` if either axis has fewer than two points or
    /// is not strictly increasing, or if the value grid is not
    /// `spots.len() x times.len()`.
    pub fn new(
        spots: Vec<f64>,
        times: Vec<f64>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, SurfaceError> {
        Self::validate_axis("spot", &spots)?;
        Self::validate_axis("time", &times)?;
        if values.len() != spots.len() {
            return Err(SurfaceError::ShapeMismatch {
                rows: values.len(),
                cols: values.first().map_or(0, Vec::len),
                expected_rows: spots.len(),
                expected_cols: times.len(),
            });
        }
        for row in &values {
            if row.len() != times.len() {
                return Err(SurfaceError::ShapeMismatch {
                    rows: values.len(),
                    cols: row.len(),
                    expected_rows: spots.len(),
                    expected_cols: times.len(),
                });
            }
        }
        Ok(Self {
            spots,
            times,
            values,
        })
    }

    fn validate_axis(axis: &'static str, points: &[f64]) -> Result<(), SurfaceError> {
        if points.len() < 2 {
            return Err(SurfaceError::AxisTooShort {
                axis,
                len: points.len(),
            });
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(SurfaceError::AxisNotIncreasing { axis, index: i + 1 });
            }
        }
        Ok(())
    }

    /// The spot axis.
    pub fn spots(&self) -> &[f64] {
        &self.spots
    }

    /// The time axis.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The value at grid node `(i, j)`.
    pub fn node(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    /// Number of grid nodes, `spots.len() * times.len()`.
    pub fn node_count(&self) -> usize {
        self.spots.len() * self.times.len()
    }

    /// Bilinearly interpolated value at `(spot, time)`, flat outside the grid.
    pub fn value_at(&self, spot: f64, time: f64) -> f64 {
        let (i, ws) = locate(&self.spots, spot);
        let (j, wt) = locate(&self.times, time);
        let lo = self.values[i][j] + (self.values[i][j + 1] - self.values[i][j]) * wt;
        let hi = self.values[i + 1][j] + (self.values[i + 1][j + 1] - self.values[i + 1][j]) * wt;
        lo + (hi - lo) * ws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_surface() -> BilinearSurface {
        BilinearSurface::new(
            vec![80.0, 100.0, 120.0],
            vec![0.5, 1.0],
            vec![vec![0.25, 0.27], vec![0.20, 0.22], vec![0.18, 0.19]],
        )
        .unwrap()
    }

    #[test]
    fn test_locate_interior_and_clamped() {
        let axis = [0.0, 1.0, 3.0];
        assert_eq!(locate(&axis, 0.5), (0, 0.5));
        assert_eq!(locate(&axis, 2.0), (1, 0.5));
        assert_eq!(locate(&axis, -4.0), (0, 0.0));
        assert_eq!(locate(&axis, 9.0), (1, 1.0));
        assert_eq!(locate(&axis, 1.0), (1, 0.0));
    }

    #[test]
    fn test_value_at_recovers_nodes() {
        let s = sample_surface();
        assert_relative_eq!(s.value_at(100.0, 0.5), 0.20);
        assert_relative_eq!(s.value_at(120.0, 1.0), 0.19);
    }

    #[test]
    fn test_value_at_interpolates() {
        let s = sample_surface();
        // Midpoint in both directions of the lower-left cell
        let expected = 0.25 * (0.25 + 0.27 + 0.20 + 0.22);
        assert_relative_eq!(s.value_at(90.0, 0.75), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_value_at_flat_extrapolation() {
        let s = sample_surface();
        assert_relative_eq!(s.value_at(10.0, 0.1), 0.25);
        assert_relative_eq!(s.value_at(500.0, 5.0), 0.19);
    }

    #[test]
    fn test_new_rejects_bad_lattices() {
        assert!(matches!(
            BilinearSurface::new(vec![1.0], vec![0.0, 1.0], vec![vec![0.2, 0.2]]),
            Err(SurfaceError::AxisTooShort { axis: "spot", .. })
        ));
        assert!(matches!(
            BilinearSurface::new(
                vec![1.0, 2.0],
                vec![1.0, 1.0],
                vec![vec![0.2, 0.2], vec![0.2, 0.2]]
            ),
            Err(SurfaceError::AxisNotIncreasing { axis: "time", .. })
        ));
        assert!(matches!(
            BilinearSurface::new(vec![1.0, 2.0], vec![0.0, 1.0], vec![vec![0.2, 0.2]]),
            Err(SurfaceError::ShapeMismatch { .. })
        ));
    }

    #[cfg(test)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_value_stays_within_node_range(
                spot in 0.0f64..200.0,
                time in -1.0f64..3.0,
            ) {
                let s = sample_surface();
                let v = s.value_at(spot, time);
                assert!((0.18..=0.27).contains(&v));
            }
        }
    }
}
