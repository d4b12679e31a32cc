//! Black-Scholes dynamics.

use tenor_core::{Compute, Sample, Value};

use crate::params::BsParams;

/// Black-Scholes simulator over a fixed timeline.
///
/// The lognormal transition is exact, so each timeline interval takes a
/// single Gaussian draw regardless of its length. An event at time zero
/// consumes no draw and observes the initial spot.
#[derive(Debug, Clone)]
pub struct BlackScholes<V> {
    spot: V,
    vol: V,
    /// `rate - div - vol^2 / 2`
    drift: V,
    /// `exp(rate * t_k)` per event
    numeraires: Vec<V>,
    /// `(dt, sqrt(dt))` per event, `None` when no time passes
    steps: Vec<Option<(f64, f64)>>,
}

impl<V: Value> BlackScholes<V> {
    /// Builds the simulator, turning the parameters into leaves of the
    /// compute context.
    ///
    /// Returns the model and its leaves in bucket order: spot, vol, rate,
    /// div.
    pub fn build<C: Compute<Num = V>>(params: &BsParams, cx: C, timeline: &[f64]) -> (Self, Vec<V>) {
        let spot = cx.leaf(params.spot);
        let vol = cx.leaf(params.vol);
        let rate = cx.leaf(params.rate);
        let div = cx.leaf(params.div);

        let drift = rate - div - vol * vol * 0.5;
        let numeraires = timeline.iter().map(|&t| (rate * t).exp()).collect();

        let mut steps = Vec::with_capacity(timeline.len());
        let mut prev_t = 0.0;
        for &t in timeline {
            if t > prev_t {
                let dt = t - prev_t;
                steps.push(Some((dt, dt.sqrt())));
                prev_t = t;
            } else {
                steps.push(None);
            }
        }

        let model = Self {
            spot,
            vol,
            drift,
            numeraires,
            steps,
        };
        (model, vec![spot, vol, rate, div])
    }

    /// Number of Gaussian draws one path consumes.
    pub fn dimension(&self) -> usize {
        self.steps.iter().filter(|s| s.is_some()).count()
    }

    /// Simulates one path from standardized Gaussian draws, one sample per
    /// event.
    pub fn generate_path(&self, gauss: &[f64], path: &mut Vec<Sample<V>>) {
        debug_assert_eq!(gauss.len(), self.dimension());
        path.clear();
        let mut log_spot = self.spot.ln();
        let mut draw = 0;
        for (k, step) in self.steps.iter().enumerate() {
            if let Some((dt, sqrt_dt)) = *step {
                let z = gauss[draw];
                draw += 1;
                log_spot = log_spot + self.drift * dt + self.vol * (sqrt_dt * z);
            }
            path.push(Sample {
                spot: log_spot.exp(),
                numeraire: self.numeraires[k],
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BsParams;
    use approx::assert_relative_eq;
    use tenor_core::{Plain, Recorded, Tape};

    fn params() -> BsParams {
        BsParams::new(100.0, 0.2, 0.03, 0.01).unwrap()
    }

    #[test]
    fn test_exact_lognormal_step() {
        let timeline = [1.0];
        let (model, _) = BlackScholes::<f64>::build(&params(), Plain, &timeline);
        assert_eq!(model.dimension(), 1);

        let z = 0.7;
        let mut path = Vec::new();
        model.generate_path(&[z], &mut path);

        let drift = 0.03 - 0.01 - 0.5 * 0.2 * 0.2;
        let expected = 100.0 * (drift + 0.2 * z).exp();
        assert_relative_eq!(path[0].spot, expected, epsilon = 1e-12);
        assert_relative_eq!(path[0].numeraire, 0.03f64.exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_event_at_time_zero_consumes_no_draw() {
        let timeline = [0.0, 0.5, 1.0];
        let (model, _) = BlackScholes::<f64>::build(&params(), Plain, &timeline);
        assert_eq!(model.dimension(), 2);

        let mut path = Vec::new();
        model.generate_path(&[0.3, -0.4], &mut path);
        assert_relative_eq!(path[0].spot, 100.0, epsilon = 1e-12);
        assert_relative_eq!(path[0].numeraire, 1.0, epsilon = 1e-12);
        assert!(path[1].spot != path[0].spot);
    }

    #[test]
    fn test_zero_vol_gives_deterministic_forward() {
        let params = BsParams::new(100.0, 0.0, 0.03, 0.01).unwrap();
        let (model, _) = BlackScholes::<f64>::build(&params, Plain, &[2.0]);

        let mut path = Vec::new();
        model.generate_path(&[1.7], &mut path);
        assert_relative_eq!(path[0].spot, 100.0 * (0.02f64 * 2.0).exp(), epsilon = 1e-12);

        model.generate_path(&[-0.9], &mut path);
        assert_relative_eq!(path[0].spot, 100.0 * (0.02f64 * 2.0).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_two_steps_compose_to_one() {
        // With the same total variance of draws, stepping 0.5 + 0.5 must
        // land exactly where one step of 1.0 does.
        let (one, _) = BlackScholes::<f64>::build(&params(), Plain, &[1.0]);
        let (two, _) = BlackScholes::<f64>::build(&params(), Plain, &[0.5, 1.0]);

        let (z1, z2) = (0.9, -0.2);
        // Combined draw carrying the same terminal Brownian value
        let z = (0.5f64.sqrt() * z1 + 0.5f64.sqrt() * z2) / 1.0f64.sqrt();

        let mut path_one = Vec::new();
        one.generate_path(&[z], &mut path_one);
        let mut path_two = Vec::new();
        two.generate_path(&[z1, z2], &mut path_two);

        assert_relative_eq!(path_one[0].spot, path_two[1].spot, epsilon = 1e-12);
    }

    #[test]
    fn test_terminal_spot_gradient() {
        let tape = Tape::new();
        let cx = Recorded(&tape);
        let (model, leaves) = BlackScholes::build(&params(), cx, &[2.0]);

        let mut path = Vec::new();
        model.generate_path(&[0.45], &mut path);
        let terminal = path[0].spot;

        // d S_T / d S_0 = S_T / S_0 for lognormal dynamics
        let grad = tape.gradient(terminal, &leaves);
        assert_relative_eq!(grad[0], terminal.value() / 100.0, epsilon = 1e-10);
        // Vega direction: d S_T / d vol = S_T * (-vol * dt + sqrt(dt) * z)
        let expected_dvol = terminal.value() * (-0.2 * 2.0 + 2.0f64.sqrt() * 0.45);
        assert_relative_eq!(grad[1], expected_dvol, max_relative = 1e-10);
    }
}
