//! Dispatch over the supported dynamics.

use tenor_core::{Compute, Sample, Value};

use crate::black_scholes::BlackScholes;
use crate::dupire::Dupire;
use crate::params::ModelParams;

/// A built simulator of either dynamics.
///
/// The enum is closed on purpose: the pricing engine matches once per batch
/// and the two arms share no state.
#[derive(Debug, Clone)]
pub enum Model<V> {
    BlackScholes(BlackScholes<V>),
    Dupire(Dupire<V>),
}

impl<V: Value> Model<V> {
    /// Builds the simulator described by `params` over `timeline`.
    ///
    /// Returns the model and its parameter leaves, ordered to match
    /// [`ModelParams::bucket_labels`].
    pub fn build<C: Compute<Num = V>>(
        params: &ModelParams,
        cx: C,
        timeline: &[f64],
    ) -> (Self, Vec<V>) {
        match params {
            ModelParams::BlackScholes(p) => {
                let (model, leaves) = BlackScholes::build(p, cx, timeline);
                (Model::BlackScholes(model), leaves)
            }
            ModelParams::Dupire(p) => {
                let (model, leaves) = Dupire::build(p, cx, timeline);
                (Model::Dupire(model), leaves)
            }
        }
    }

    /// Number of Gaussian draws one path consumes.
    pub fn dimension(&self) -> usize {
        match self {
            Model::BlackScholes(m) => m.dimension(),
            Model::Dupire(m) => m.dimension(),
        }
    }

    /// Simulates one path from standardized Gaussian draws.
    pub fn generate_path(&self, gauss: &[f64], path: &mut Vec<Sample<V>>) {
        match self {
            Model::BlackScholes(m) => m.generate_path(gauss, path),
            Model::Dupire(m) => m.generate_path(gauss, path),
        }
    }
}
