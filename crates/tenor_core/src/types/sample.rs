//! Simulated path samples.

/// One observation of a simulated path at an event date.
///
/// The numeraire is the accrued money-market account value at the event,
/// `exp(r * t)` under deterministic rates; cashflows are deflated by it to
/// express everything in valuation-date money.
#[derive(Clone, Copy, Debug)]
pub struct Sample<V> {
    /// Underlying level at the event date.
    pub spot: V,
    /// Numeraire at the event date.
    pub numeraire: V,
}

/// A full path: one sample per event date, in timeline order.
pub type Scenario<V> = Vec<Sample<V>>;
