use crate::prelude::Carrier;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signal [Observation] on a given frequency band.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// [Carrier] frequency.
    pub carrier: Carrier,
    /// Pseudo range observation, expressed in meters.
    pub pseudo_range_m: Option<f64>,
    /// Possible SNR indication (in dB/Hz).
    pub snr_dbhz: Option<f64>,
}

impl Observation {
    /// Creates new pseudo range [Observation] (in meters), with possible
    /// SNR in dB/Hz.
    pub fn pseudo_range(carrier: Carrier, range_m: f64, snr_dbhz: Option<f64>) -> Self {
        Self {
            carrier,
            snr_dbhz,
            pseudo_range_m: Some(range_m),
        }
    }

    /// Copies and returns [Observation] with updated SNR
    pub fn with_snr(&self, snr_dbhz: f64) -> Self {
        let mut s = self.clone();
        s.snr_dbhz = Some(snr_dbhz);
        s
    }
}
