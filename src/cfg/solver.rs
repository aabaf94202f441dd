//! Measurement weighting and outlier rejection preset

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const fn default_k0() -> f64 {
    3.0
}

const fn default_k1() -> f64 {
    7.0
}

const fn default_max_iterations() -> usize {
    10
}

/// Elevation dependent code noise model
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElevationMappingFunction {
    /// a + b * e-elev/c
    pub a: f64,
    /// a + b * e-elev/c
    pub b: f64,
    /// a + b * e-elev/c
    pub c: f64,
}

impl Default for ElevationMappingFunction {
    fn default() -> Self {
        Self {
            a: 0.3,
            b: 3.0,
            c: 15.0,
        }
    }
}

impl ElevationMappingFunction {
    /// Code noise standard deviation (m) at this elevation (°)
    pub(crate) fn sigma_m(&self, elev_deg: f64) -> f64 {
        self.a + self.b * (-elev_deg / self.c).exp()
    }

    /// Weight (1/σ²) at this elevation (°)
    pub(crate) fn weight(&self, elev_deg: f64) -> f64 {
        1.0 / self.sigma_m(elev_deg).powi(2)
    }
}

/// Residual based outlier rejection thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutlierOpts {
    /// Normalized residuals below k0 are accepted as is
    #[cfg_attr(feature = "serde", serde(default = "default_k0"))]
    pub k0: f64,
    /// Normalized residuals above k1 are rejected
    #[cfg_attr(feature = "serde", serde(default = "default_k1"))]
    pub k1: f64,
    /// Maximal number of reweighting iterations per epoch
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
}

impl Default for OutlierOpts {
    fn default() -> Self {
        Self {
            k0: default_k0(),
            k1: default_k1(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ElevationMappingFunction;

    #[test]
    fn elevation_weighting() {
        let mapf = ElevationMappingFunction::default();
        assert!(mapf.sigma_m(90.0) < mapf.sigma_m(10.0));
        assert!(mapf.weight(90.0) > mapf.weight(10.0));

        let flat = ElevationMappingFunction {
            a: 0.5,
            b: 0.0,
            c: 1.0,
        };
        assert_eq!(flat.weight(12.0), 4.0);
    }
}
