//! Validated model parameters.
//!
//! Parameters are the serialisable, arithmetic-free description of a model;
//! the generic simulators in [`crate::black_scholes`] and [`crate::dupire`]
//! are built from them against a concrete compute context.

use serde::{Deserialize, Serialize};
use tenor_core::math::interp::BilinearSurface;

use crate::error::ModelError;

fn check_finite(name: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::InvalidParameter { name, value })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::InvalidParameter { name, value })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ModelError::InvalidParameter { name, value })
    }
}

/// Black-Scholes parameters: flat volatility, flat rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BsParams {
    pub(crate) spot: f64,
    pub(crate) vol: f64,
    pub(crate) rate: f64,
    pub(crate) div: f64,
}

impl BsParams {
    /// Validates and creates Black-Scholes parameters.
    ///
    /// # Errors
    ///
    /// `spot` must be positive, `vol` non-negative (zero gives the
    /// deterministic forward path), `rate` and `div` finite.
    pub fn new(spot: f64, vol: f64, rate: f64, div: f64) -> Result<Self, ModelError> {
        Ok(Self {
            spot: check_positive("spot", spot)?,
            vol: check_non_negative("vol", vol)?,
            rate: check_finite("rate", rate)?,
            div: check_finite("div", div)?,
        })
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn vol(&self) -> f64 {
        self.vol
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn div(&self) -> f64 {
        self.div
    }
}

/// Dupire local volatility parameters.
///
/// The surface holds local volatilities on a spot/time lattice; bilinear
/// interpolation inside, flat extrapolation outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DupireParams {
    pub(crate) spot: f64,
    pub(crate) rate: f64,
    pub(crate) div: f64,
    pub(crate) surface: BilinearSurface,
}

impl DupireParams {
    /// Validates and creates Dupire parameters.
    ///
    /// # Errors
    ///
    /// `spot` must be positive, `rate` and `div` finite, and every surface
    /// node a positive volatility.
    pub fn new(
        spot: f64,
        rate: f64,
        div: f64,
        surface: BilinearSurface,
    ) -> Result<Self, ModelError> {
        let spot = check_positive("spot", spot)?;
        let rate = check_finite("rate", rate)?;
        let div = check_finite("div", div)?;
        for i in 0..surface.spots().len() {
            for j in 0..surface.times().len() {
                check_positive("local_vol", surface.node(i, j))?;
            }
        }
        Ok(Self {
            spot,
            rate,
            div,
            surface,
        })
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn div(&self) -> f64 {
        self.div
    }

    pub fn surface(&self) -> &BilinearSurface {
        &self.surface
    }
}

/// The closed set of supported dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelParams {
    BlackScholes(BsParams),
    Dupire(DupireParams),
}

impl ModelParams {
    /// Validated Black-Scholes parameters; see [`BsParams::new`].
    pub fn black_scholes(spot: f64, vol: f64, rate: f64, div: f64) -> Result<Self, ModelError> {
        BsParams::new(spot, vol, rate, div).map(ModelParams::BlackScholes)
    }

    /// Validated Dupire parameters; see [`DupireParams::new`].
    pub fn dupire(
        spot: f64,
        rate: f64,
        div: f64,
        surface: BilinearSurface,
    ) -> Result<Self, ModelError> {
        DupireParams::new(spot, rate, div, surface).map(ModelParams::Dupire)
    }

    /// Dupire parameters with zero rate and dividend yield.
    pub fn dupire_zero_rates(spot: f64, surface: BilinearSurface) -> Result<Self, ModelError> {
        Self::dupire(spot, 0.0, 0.0, surface)
    }

    /// Names of the risk buckets a gradient against this model's leaves
    /// maps to, in leaf order.
    ///
    /// Black-Scholes: `d_spot`, `d_vol`, `d_rate`, `d_div`. Dupire:
    /// `d_spot`, `d_rate`, `d_div`, then one `d_lvol_{i}_{j}` per surface
    /// node, spot-major.
    pub fn bucket_labels(&self) -> Vec<String> {
        match self {
            ModelParams::BlackScholes(_) => ["d_spot", "d_vol", "d_rate", "d_div"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ModelParams::Dupire(p) => {
                let mut labels: Vec<String> = ["d_spot", "d_rate", "d_div"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                for i in 0..p.surface.spots().len() {
                    for j in 0..p.surface.times().len() {
                        labels.push(format!("d_lvol_{}_{}", i, j));
                    }
                }
                labels
            }
        }
    }
}
