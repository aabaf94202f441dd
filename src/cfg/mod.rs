#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prelude::{Constellation, Error};

mod method;
mod modeling;
mod noise;
mod solver;

pub use method::{Combination, FilterMethod, Positioning};
pub use modeling::Modeling;
pub use noise::{InitialVariance, ProcessNoise};
pub use solver::{ElevationMappingFunction, OutlierOpts};

fn default_constellations() -> Vec<Constellation> {
    vec![Constellation::GPS]
}

fn default_min_sv_elev() -> f64 {
    10.0
}

fn default_min_sv() -> usize {
    4
}

fn default_eclipse_filter() -> bool {
    false
}

fn default_estimate_troposphere() -> bool {
    false
}

fn default_estimate_ionosphere() -> bool {
    false
}

/// Processor configuration, read once when deploying an [crate::prelude::EpochProcessor].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Constellations to navigate with. The receiver clock is
    /// expressed in the timescale of the first one, other
    /// constellations are connected through inter system biases.
    #[cfg_attr(feature = "serde", serde(default = "default_constellations"))]
    pub constellations: Vec<Constellation>,
    /// [FilterMethod] used in the measurement update.
    #[cfg_attr(feature = "serde", serde(default))]
    pub filter: FilterMethod,
    /// Signal [Combination]
    #[cfg_attr(feature = "serde", serde(default))]
    pub combination: Combination,
    /// Receiver [Positioning] mode
    #[cfg_attr(feature = "serde", serde(default))]
    pub positioning: Positioning,
    /// Elevation mask (°)
    #[cfg_attr(feature = "serde", serde(default = "default_min_sv_elev"))]
    pub min_sv_elev: f64,
    /// Minimal number of satellites to attempt and commit a solution
    #[cfg_attr(feature = "serde", serde(default = "default_min_sv"))]
    pub min_sv: usize,
    /// Minimal SNR (dB/Hz) for an observation to contribute
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_snr: Option<f64>,
    /// Drop satellites flagged in eclipse by the orbit source
    #[cfg_attr(feature = "serde", serde(default = "default_eclipse_filter"))]
    pub eclipse_filter: bool,
    /// Estimate the zenith wet delay
    #[cfg_attr(feature = "serde", serde(default = "default_estimate_troposphere"))]
    pub estimate_troposphere: bool,
    /// Estimate the slant ionosphere delay, per satellite ([Combination::Raw] only)
    #[cfg_attr(feature = "serde", serde(default = "default_estimate_ionosphere"))]
    pub estimate_ionosphere: bool,
    /// Physical [Modeling]
    #[cfg_attr(feature = "serde", serde(default))]
    pub modeling: Modeling,
    /// Code noise model
    #[cfg_attr(feature = "serde", serde(default))]
    pub weighting: ElevationMappingFunction,
    /// Outlier rejection
    #[cfg_attr(feature = "serde", serde(default))]
    pub outlier: OutlierOpts,
    /// Process noise
    #[cfg_attr(feature = "serde", serde(default))]
    pub noise: ProcessNoise,
    /// Initial variances
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial: InitialVariance,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constellations: default_constellations(),
            filter: FilterMethod::default(),
            combination: Combination::default(),
            positioning: Positioning::default(),
            min_sv_elev: default_min_sv_elev(),
            min_sv: default_min_sv(),
            min_snr: None,
            eclipse_filter: default_eclipse_filter(),
            estimate_troposphere: default_estimate_troposphere(),
            estimate_ionosphere: default_estimate_ionosphere(),
            modeling: Modeling::default(),
            weighting: ElevationMappingFunction::default(),
            outlier: OutlierOpts::default(),
            noise: ProcessNoise::default(),
            initial: InitialVariance::default(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with updated [FilterMethod]
    pub fn with_filter(&self, filter: FilterMethod) -> Self {
        let mut s = self.clone();
        s.filter = filter;
        s
    }

    /// Copies and returns [Config] with updated [Combination]
    pub fn with_combination(&self, combination: Combination) -> Self {
        let mut s = self.clone();
        s.combination = combination;
        s
    }

    /// Copies and returns [Config] with updated [Positioning]
    pub fn with_positioning(&self, positioning: Positioning) -> Self {
        let mut s = self.clone();
        s.positioning = positioning;
        s
    }

    /// Copies and returns [Config] with updated [Constellation]s
    pub fn with_constellations(&self, constellations: &[Constellation]) -> Self {
        let mut s = self.clone();
        s.constellations = constellations.to_vec();
        s
    }

    /// Copies and returns [Config] with updated [Modeling]
    pub fn with_modeling(&self, modeling: Modeling) -> Self {
        let mut s = self.clone();
        s.modeling = modeling;
        s
    }

    /// Copies and returns [Config] with updated weighting
    pub fn with_weighting(&self, weighting: ElevationMappingFunction) -> Self {
        let mut s = self.clone();
        s.weighting = weighting;
        s
    }

    /// Reference [Constellation] (receiver clock timescale)
    pub(crate) fn reference_constellation(&self) -> Option<Constellation> {
        self.constellations.first().copied()
    }

    /// Verifies this [Config] is consistent. Any error here is fatal.
    pub fn validate(&self) -> Result<(), Error> {
        if self.constellations.is_empty() {
            return Err(Error::InvalidConfig("no constellation selected"));
        }
        if self.min_sv == 0 {
            return Err(Error::InvalidConfig("minimal number of satellites is null"));
        }
        if !(-90.0..90.0).contains(&self.min_sv_elev) {
            return Err(Error::InvalidConfig("elevation mask out of range"));
        }
        if self.estimate_ionosphere && self.combination == Combination::IonoFree {
            return Err(Error::InvalidConfig(
                "ionosphere is cancelled by the iono free combination",
            ));
        }
        if self.outlier.k0 <= 0.0 || self.outlier.k1 <= self.outlier.k0 {
            return Err(Error::InvalidConfig("outlier thresholds must satisfy 0 < k0 < k1"));
        }
        if self.outlier.max_iterations == 0 {
            return Err(Error::InvalidConfig("outlier rejection needs one iteration"));
        }
        if self.weighting.sigma_m(90.0) <= 0.0 || self.weighting.c == 0.0 {
            return Err(Error::InvalidConfig("invalid code noise model"));
        }

        let initial = &self.initial;
        for variance in [
            initial.coordinates_m2,
            initial.clock_m2,
            initial.troposphere_m2,
            initial.ionosphere_m2,
            initial.isb_m2,
            initial.ifb_m2,
            self.noise.clock_m2,
            self.noise.kinematic_coordinates_m2,
        ] {
            if variance <= 0.0 || !variance.is_finite() {
                return Err(Error::InvalidConfig("variances must be strictly positive"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Combination, Config};
    use crate::prelude::{Constellation, Error};

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn invalid_configs() {
        let cfg = Config::default().with_constellations(&[]);
        assert_eq!(
            cfg.validate(),
            Err(Error::InvalidConfig("no constellation selected"))
        );

        let mut cfg = Config::default().with_combination(Combination::IonoFree);
        cfg.estimate_ionosphere = true;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.outlier.k1 = 2.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.initial.clock_m2 = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn reference_constellation() {
        let cfg =
            Config::default().with_constellations(&[Constellation::Galileo, Constellation::GPS]);
        assert_eq!(cfg.reference_constellation(), Some(Constellation::Galileo));
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());

        let cfg: Config =
            serde_json::from_str("{\"filter\": \"SquareRootInformation\", \"min_sv\": 5}").unwrap();
        assert_eq!(cfg.min_sv, 5);
        assert_eq!(cfg.filter, super::FilterMethod::SquareRootInformation);
    }
}
