//! External bias and correction collaborators
use crate::prelude::{Carrier, Epoch, Vector3, SV};

pub(crate) mod iono;
pub(crate) mod tropo;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A-priori zenith delays at the receiver location (meters of delay).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AtmosphereDelays {
    /// Zenith hydrostatic delay (m)
    pub zhd_m: f64,
    /// Zenith wet delay (m)
    pub zwd_m: f64,
    /// Vertical ionosphere delay (m) on [Carrier::L1]
    pub vertical_iono_m: f64,
}

/// Code bias table, consulted for each pseudo range when
/// [crate::prelude::Modeling::code_biases] is turned on.
pub trait BiasSource {
    /// Correction (m) to add to a pseudo range observed on the `target`
    /// signal, so it aligns with the `reference` signal of this [SV].
    /// None when no correction is published.
    fn code_bias(&self, epoch: Epoch, sv: SV, reference: Carrier, target: Carrier)
        -> Option<f64>;
}

/// A-priori atmosphere model. When not available or when returning None,
/// the corrections degrade to zero and are left to the estimation process.
pub trait AtmosphereModel {
    /// [AtmosphereDelays] at this ECEF position (m) and [Epoch].
    fn delays(&self, position_ecef_m: Vector3<f64>, epoch: Epoch) -> Option<AtmosphereDelays>;
}

/// Site displacement model (solid earth tides, ocean loading..)
pub trait TideModel {
    /// ECEF displacement (m) of the site at this [Epoch].
    fn displacement(&self, position_ecef_m: Vector3<f64>, epoch: Epoch) -> Vector3<f64>;
}
