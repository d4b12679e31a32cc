//! Simulation output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The aggregated result of a simulation run.
///
/// `values` always holds `"value"`; with risk enabled it also holds one
/// entry per model bucket label (`"d_spot"`, `"d_vol"`, ...). All entries
/// are averages over the non-discarded paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimResults {
    pub values: BTreeMap<String, f64>,
    /// Paths requested.
    pub n_paths: u64,
    /// Paths dropped under the discard overflow policy.
    pub discarded: u64,
}

impl SimResults {
    /// The price.
    pub fn value(&self) -> f64 {
        self.values["value"]
    }

    /// A named risk bucket, if risk was computed.
    pub fn risk(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied()
    }

    /// Paths that actually entered the average.
    pub fn effective_paths(&self) -> u64 {
        self.n_paths - self.discarded
    }
}
