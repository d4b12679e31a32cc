//! Brownian bridge draw reordering.
//!
//! Low-discrepancy sequences are most uniform in their leading dimensions.
//! The bridge spends the first draw on the terminal Brownian value and each
//! subsequent draw on the midpoint of the widest remaining gap, so the
//! coordinates that matter most for a path's overall shape come first. The
//! output is re-expressed as standardized increments, which is exactly what
//! the step-based models consume, so bridged and unbridged runs share the
//! same model code.

/// Precomputed bridge over a fixed set of step-end times.
pub struct BrownianBridge {
    times: Vec<f64>,
    /// Which Brownian point draw i determines
    bridge_index: Vec<usize>,
    /// Left boundary: index into `times` of the first unset point of the
    /// gap; the conditioning value sits one before it (or at the origin)
    left_index: Vec<usize>,
    /// Right boundary: index of the set point closing the gap
    right_index: Vec<usize>,
    left_weight: Vec<f64>,
    right_weight: Vec<f64>,
    std_dev: Vec<f64>,
    /// Scratch Brownian path
    w: Vec<f64>,
}

impl BrownianBridge {
    /// Builds the bridge over strictly increasing, positive step-end times.
    pub fn new(times: &[f64]) -> Self {
        let n = times.len();
        debug_assert!(n > 0);
        debug_assert!(times.windows(2).all(|p| p[0] < p[1]));
        debug_assert!(times[0] > 0.0);

        let mut bridge_index = vec![0; n];
        let mut left_index = vec![0; n];
        let mut right_index = vec![0; n];
        let mut left_weight = vec![0.0; n];
        let mut right_weight = vec![0.0; n];
        let mut std_dev = vec![0.0; n];
        // set[l] marks Brownian points already determined
        let mut set = vec![false; n];

        // Draw 0 pins the terminal value
        bridge_index[0] = n - 1;
        std_dev[0] = times[n - 1].sqrt();
        set[n - 1] = true;

        let mut j = 0;
        for i in 1..n {
            while set[j] {
                j += 1;
            }
            let mut k = j;
            while !set[k] {
                k += 1;
            }
            // Midpoint of the unset run [j, k)
            let l = j + (k - 1 - j) / 2;
            set[l] = true;
            bridge_index[i] = l;
            left_index[i] = j;
            right_index[i] = k;

            let t_left = if j > 0 { times[j - 1] } else { 0.0 };
            let t_mid = times[l];
            let t_right = times[k];
            left_weight[i] = (t_right - t_mid) / (t_right - t_left);
            right_weight[i] = (t_mid - t_left) / (t_right - t_left);
            std_dev[i] = ((t_mid - t_left) * (t_right - t_mid) / (t_right - t_left)).sqrt();

            j = k + 1;
            if j >= n {
                j = 0;
            }
        }

        Self {
            times: times.to_vec(),
            bridge_index,
            left_index,
            right_index,
            left_weight,
            right_weight,
            std_dev,
            w: vec![0.0; n],
        }
    }

    /// Number of draws consumed and increments produced.
    pub fn dimension(&self) -> usize {
        self.times.len()
    }

    /// Turns `gauss_in` (bridge order) into standardized per-step
    /// increments in time order.
    pub fn transform(&mut self, gauss_in: &[f64], gauss_out: &mut [f64]) {
        let n = self.times.len();
        debug_assert_eq!(gauss_in.len(), n);
        debug_assert_eq!(gauss_out.len(), n);

        self.w[self.bridge_index[0]] = self.std_dev[0] * gauss_in[0];
        for i in 1..n {
            let j = self.left_index[i];
            let left = if j > 0 { self.w[j - 1] } else { 0.0 };
            let right = self.w[self.right_index[i]];
            self.w[self.bridge_index[i]] =
                self.left_weight[i] * left + self.right_weight[i] * right
                    + self.std_dev[i] * gauss_in[i];
        }

        let mut prev_t = 0.0;
        let mut prev_w = 0.0;
        for (k, out) in gauss_out.iter_mut().enumerate() {
            *out = (self.w[k] - prev_w) / (self.times[k] - prev_t).sqrt();
            prev_t = self.times[k];
            prev_w = self.w[k];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_step_is_identity() {
        let mut bridge = BrownianBridge::new(&[2.0]);
        let mut out = [0.0];
        bridge.transform(&[0.73], &mut out);
        assert_relative_eq!(out[0], 0.73, epsilon = 1e-15);
    }

    #[test]
    fn test_two_step_bridge_weights() {
        // Equal half-steps: W(1) = z0, W(0.5) = W(1)/2 + z1/2
        let mut bridge = BrownianBridge::new(&[0.5, 1.0]);
        let (z0, z1) = (1.2, -0.4);
        let mut out = [0.0; 2];
        bridge.transform(&[z0, z1], &mut out);

        let w1 = z0;
        let w0 = 0.5 * w1 + 0.5 * z1;
        assert_relative_eq!(out[0], w0 / 0.5f64.sqrt(), epsilon = 1e-14);
        assert_relative_eq!(out[1], (w1 - w0) / 0.5f64.sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn test_terminal_value_depends_only_on_first_draw() {
        let times = [0.25, 0.5, 0.75, 1.0, 1.5];
        let mut bridge = BrownianBridge::new(&times);
        let mut out = [0.0; 5];

        let reconstruct_terminal = |out: &[f64]| {
            let mut w = 0.0;
            let mut prev_t = 0.0;
            for (k, &z) in out.iter().enumerate() {
                w += (times[k] - prev_t).sqrt() * z;
                prev_t = times[k];
            }
            w
        };

        bridge.transform(&[0.9, 0.1, -0.3, 0.7, 0.2], &mut out);
        let terminal_a = reconstruct_terminal(&out);
        bridge.transform(&[0.9, -1.1, 0.6, 0.0, -0.8], &mut out);
        let terminal_b = reconstruct_terminal(&out);

        assert_relative_eq!(terminal_a, terminal_b, epsilon = 1e-12);
        assert_relative_eq!(terminal_a, 1.5f64.sqrt() * 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_output_increments_preserve_total_variance() {
        // The bridge is an orthogonal rotation of the draws: the sum of
        // squared standardized increments equals the sum of squared inputs.
        let times = [0.1, 0.4, 0.9, 1.3];
        let mut bridge = BrownianBridge::new(&times);
        let input = [0.5, -1.2, 0.8, 0.3];
        let mut out = [0.0; 4];
        bridge.transform(&input, &mut out);

        let in_norm: f64 = input.iter().map(|z| z * z).sum();
        let out_norm: f64 = out.iter().map(|z| z * z).sum();
        assert_relative_eq!(in_norm, out_norm, epsilon = 1e-10);
    }

    #[test]
    fn test_uneven_times_weights_are_conditional_mean() {
        // Three points, second draw pins the middle of [0, t2]
        let times = [1.0, 3.0];
        let mut bridge = BrownianBridge::new(&times);
        let (z0, z1) = (0.6, -0.2);
        let mut out = [0.0; 2];
        bridge.transform(&[z0, z1], &mut out);

        let w_end = 3.0f64.sqrt() * z0;
        // E[W(1) | W(3)] = (1/3) W(3); var = 1 * 2 / 3
        let w_mid = w_end / 3.0 + (2.0f64 / 3.0).sqrt() * z1;
        assert_relative_eq!(out[0], w_mid / 1.0f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(out[1], (w_end - w_mid) / 2.0f64.sqrt(), epsilon = 1e-12);
    }
}
