//! Closed-form Black-Scholes references.
//!
//! Used as a yardstick for the Monte Carlo engine; the simulation under
//! Black-Scholes dynamics must converge to these values.

use tenor_core::math::gaussian::{norm_cdf, norm_pdf};

fn d1_d2(spot: f64, strike: f64, vol: f64, rate: f64, div: f64, expiry: f64) -> (f64, f64) {
    let std = vol * expiry.sqrt();
    let d1 = ((spot / strike).ln() + (rate - div + 0.5 * vol * vol) * expiry) / std;
    (d1, d1 - std)
}

/// European call price.
pub fn call_price(spot: f64, strike: f64, vol: f64, rate: f64, div: f64, expiry: f64) -> f64 {
    let (d1, d2) = d1_d2(spot, strike, vol, rate, div, expiry);
    spot * (-div * expiry).exp() * norm_cdf(d1) - strike * (-rate * expiry).exp() * norm_cdf(d2)
}

/// European call delta, `d price / d spot`.
pub fn call_delta(spot: f64, strike: f64, vol: f64, rate: f64, div: f64, expiry: f64) -> f64 {
    let (d1, _) = d1_d2(spot, strike, vol, rate, div, expiry);
    (-div * expiry).exp() * norm_cdf(d1)
}

/// European call vega, `d price / d vol`.
pub fn call_vega(spot: f64, strike: f64, vol: f64, rate: f64, div: f64, expiry: f64) -> f64 {
    let (d1, _) = d1_d2(spot, strike, vol, rate, div, expiry);
    spot * (-div * expiry).exp() * norm_pdf(d1) * expiry.sqrt()
}
