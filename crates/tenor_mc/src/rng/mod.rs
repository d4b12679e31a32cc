//! Gaussian draw drivers.

pub mod bridge;
pub mod pseudo;
pub mod sobol;

pub use bridge::BrownianBridge;
pub use pseudo::PathRng;
pub use sobol::Sobol;

/// SplitMix64 finalizer; used to hash seeds and direction numbers.
pub(crate) fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
