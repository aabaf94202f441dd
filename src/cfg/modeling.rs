#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_earth_rot() -> bool {
    true
}

fn default_solid_tides() -> bool {
    false
}

fn default_code_biases() -> bool {
    true
}

fn default_atmosphere() -> bool {
    true
}

/// Physical and environmental modeling
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Modeling {
    /// Compensate for Earth rotation during signal propagation
    /// (static +5/+10m eastern error).
    #[cfg_attr(feature = "serde", serde(default = "default_earth_rot"))]
    pub earth_rotation: bool,
    /// Compensate for crust (solid body) deformation, when a
    /// [crate::prelude::TideModel] is provided.
    #[cfg_attr(feature = "serde", serde(default = "default_solid_tides"))]
    pub solid_tides: bool,
    /// Apply code biases, when a [crate::prelude::BiasSource] is provided.
    #[cfg_attr(feature = "serde", serde(default = "default_code_biases"))]
    pub code_biases: bool,
    /// Apply a-priori atmosphere, when a [crate::prelude::AtmosphereModel] is provided.
    #[cfg_attr(feature = "serde", serde(default = "default_atmosphere"))]
    pub atmosphere: bool,
}

impl Default for Modeling {
    fn default() -> Self {
        Self {
            earth_rotation: default_earth_rot(),
            solid_tides: default_solid_tides(),
            code_biases: default_code_biases(),
            atmosphere: default_atmosphere(),
        }
    }
}

impl Modeling {
    /// Turns every model off: pure geometric navigation
    pub fn no_modeling() -> Self {
        Self {
            earth_rotation: false,
            solid_tides: false,
            code_biases: false,
            atmosphere: false,
        }
    }
}
