//! Process noise and initial uncertainty preset

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Process noise magnitudes, per parameter class.
/// Random walks are expressed as spectral densities in mm/√h,
/// white noises as variances in m².
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessNoise {
    /// Static coordinates random walk (mm/√h)
    pub coordinates_mm_sqrt_h: f64,
    /// Kinematic coordinates white noise (m²)
    pub kinematic_coordinates_m2: f64,
    /// Receiver clock white noise (m²)
    pub clock_m2: f64,
    /// Zenith wet delay random walk (mm/√h)
    pub troposphere_mm_sqrt_h: f64,
    /// Slant ionosphere random walk (mm/√h)
    pub ionosphere_mm_sqrt_h: f64,
    /// Inter system bias random walk (mm/√h)
    pub isb_mm_sqrt_h: f64,
    /// Inter frequency bias random walk (mm/√h)
    pub ifb_mm_sqrt_h: f64,
}

impl Default for ProcessNoise {
    fn default() -> Self {
        Self {
            coordinates_mm_sqrt_h: 0.0,
            kinematic_coordinates_m2: 1.0E6,
            clock_m2: 1.0E10,
            troposphere_mm_sqrt_h: 10.0,
            ionosphere_mm_sqrt_h: 4000.0,
            isb_mm_sqrt_h: 1.0,
            ifb_mm_sqrt_h: 1.0,
        }
    }
}

/// Initial variance (m²) assigned to the covariance diagonal
/// when a parameter gets introduced.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InitialVariance {
    pub coordinates_m2: f64,
    pub clock_m2: f64,
    pub troposphere_m2: f64,
    pub ionosphere_m2: f64,
    pub isb_m2: f64,
    pub ifb_m2: f64,
}

impl Default for InitialVariance {
    fn default() -> Self {
        Self {
            coordinates_m2: 1.0E6,
            clock_m2: 1.0E10,
            troposphere_m2: 0.25,
            ionosphere_m2: 100.0,
            isb_m2: 1.0E6,
            ifb_m2: 1.0E4,
        }
    }
}
