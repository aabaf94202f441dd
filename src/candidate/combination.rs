use crate::prelude::{Candidate, Carrier};

/// Dual frequency code [Combination]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Combination {
    /// Reference (primary) signal
    pub reference: Carrier,
    /// Secondary signal
    pub secondary: Carrier,
    /// Combined range (meters)
    pub value: f64,
    /// Noise amplification factor, with respect to a single
    /// code measurement of identical quality.
    pub noise_factor: f64,
}

impl Candidate {
    /// Returns the ionosphere free code [Combination], formed
    /// from the two lowest (in [Carrier] order) frequency bands.
    pub(crate) fn code_if_combination(&self) -> Option<Combination> {
        let (c1, p1) = self.primary_pseudo_range()?;
        let (cj, pj) = self.secondary_pseudo_range()?;

        let f1_2 = c1.frequency_hz().powi(2);
        let fj_2 = cj.frequency_hz().powi(2);
        let denom = f1_2 - fj_2;

        if denom == 0.0 {
            return None;
        }

        Some(Combination {
            reference: c1,
            secondary: cj,
            value: (f1_2 * p1 - fj_2 * pj) / denom,
            noise_factor: (f1_2.powi(2) + fj_2.powi(2)).sqrt() / denom.abs(),
        })
    }
}
