//! Dupire local volatility dynamics.

use tenor_core::math::interp::locate;
use tenor_core::{Compute, Sample, Value};

use crate::params::DupireParams;

/// Local volatility simulator over a fixed timeline.
///
/// The spot follows a log-Euler step per timeline interval, with the
/// volatility read off the surface at the interval's start: bilinear inside
/// the lattice, flat outside. The surface nodes are individual leaves, so a
/// gradient against this model resolves into per-node vega buckets.
///
/// The spot interpolation weight is computed in path arithmetic, which
/// keeps the volatility's dependency on the running spot on the tape; the
/// time weight is deterministic and stays in `f64`.
#[derive(Debug, Clone)]
pub struct Dupire<V> {
    spot: V,
    /// `rate - div`
    carry: V,
    /// Surface nodes as leaves, `vols[i][j]` at `(spot_axis[i], time_axis[j])`
    vols: Vec<Vec<V>>,
    spot_axis: Vec<f64>,
    time_axis: Vec<f64>,
    /// `exp(rate * t_k)` per event
    numeraires: Vec<V>,
    /// `(interval start, dt, sqrt(dt))` per event, `None` when no time passes
    steps: Vec<Option<(f64, f64, f64)>>,
}

impl<V: Value> Dupire<V> {
    /// Builds the simulator, turning the parameters into leaves of the
    /// compute context.
    ///
    /// Returns the model and its leaves in bucket order: spot, rate, div,
    /// then the surface nodes spot-major.
    pub fn build<C: Compute<Num = V>>(
        params: &DupireParams,
        cx: C,
        timeline: &[f64],
    ) -> (Self, Vec<V>) {
        let spot = cx.leaf(params.spot);
        let rate = cx.leaf(params.rate);
        let div = cx.leaf(params.div);

        let mut leaves = vec![spot, rate, div];
        let surface = &params.surface;
        let mut vols = Vec::with_capacity(surface.spots().len());
        for i in 0..surface.spots().len() {
            let mut row = Vec::with_capacity(surface.times().len());
            for j in 0..surface.times().len() {
                let node = cx.leaf(surface.node(i, j));
                row.push(node);
                leaves.push(node);
            }
            vols.push(row);
        }

        let numeraires = timeline.iter().map(|&t| (rate * t).exp()).collect();
        let mut steps = Vec::with_capacity(timeline.len());
        let mut prev_t = 0.0;
        for &t in timeline {
            if t > prev_t {
                let dt = t - prev_t;
                steps.push(Some((prev_t, dt, dt.sqrt())));
                prev_t = t;
            } else {
                steps.push(None);
            }
        }

        let model = Self {
            spot,
            carry: rate - div,
            vols,
            spot_axis: surface.spots().to_vec(),
            time_axis: surface.times().to_vec(),
            numeraires,
            steps,
        };
        (model, leaves)
    }

    /// Number of Gaussian draws one path consumes.
    pub fn dimension(&self) -> usize {
        self.steps.iter().filter(|s| s.is_some()).count()
    }

    /// Local volatility at `(s, t)`.
    fn local_vol(&self, s: V, t: f64) -> V {
        let (j, wt) = locate(&self.time_axis, t);
        let i = locate(&self.spot_axis, s.value()).0;
        // V-valued spot weight; clamp01 flattens the extrapolation and
        // zeroes its derivative outside the lattice
        let ws = ((s - self.spot_axis[i])
            * (1.0 / (self.spot_axis[i + 1] - self.spot_axis[i])))
        .clamp01();
        let lo = self.vols[i][j] + (self.vols[i][j + 1] - self.vols[i][j]) * wt;
        let hi = self.vols[i + 1][j] + (self.vols[i + 1][j + 1] - self.vols[i + 1][j]) * wt;
        lo + (hi - lo) * ws
    }

    /// Simulates one path from standardized Gaussian draws, one sample per
    /// event.
    pub fn generate_path(&self, gauss: &[f64], path: &mut Vec<Sample<V>>) {
        debug_assert_eq!(gauss.len(), self.dimension());
        path.clear();
        let mut spot = self.spot;
        let mut draw = 0;
        for (k, step) in self.steps.iter().enumerate() {
            if let Some((t0, dt, sqrt_dt)) = *step {
                let vol = self.local_vol(spot, t0);
                let z = gauss[draw];
                draw += 1;
                let increment = (self.carry - vol * vol * 0.5) * dt + vol * (sqrt_dt * z);
                spot = spot * increment.exp();
            }
            path.push(Sample {
                spot,
                numeraire: self.numeraires[k],
            });
        }
    }
}
