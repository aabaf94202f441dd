use crate::prelude::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Measurement update algorithm. All of them share the same contract
/// and agree on well conditioned problems.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterMethod {
    /// Classical Kalman filter, Joseph form covariance update.
    #[default]
    Kalman,

    /// Square root covariance filter: propagates the Cholesky factor
    /// of the covariance through orthogonal triangularization.
    SquareRootCovariance,

    /// Square root information filter: works on the information
    /// (inverse covariance) factor. Prefered when the prior uncertainty is very large.
    SquareRootInformation,
}

impl std::fmt::Display for FilterMethod {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Kalman => write!(fmt, "Kalman"),
            Self::SquareRootCovariance => write!(fmt, "SRCF"),
            Self::SquareRootInformation => write!(fmt, "SRIF"),
        }
    }
}

impl std::str::FromStr for FilterMethod {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kalman" | "kf" => Ok(Self::Kalman),
            "srcf" | "square-root-covariance" => Ok(Self::SquareRootCovariance),
            "srif" | "square-root-information" => Ok(Self::SquareRootInformation),
            _ => Err(Error::InvalidFilterMethod(s.to_string())),
        }
    }
}

/// Signal combination, defines the design matrix row layout.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Combination {
    /// Ionosphere free combination of two code measurements,
    /// one row per satellite. Requires dual frequency observations.
    IonoFree,

    /// Raw (uncombined) code measurements, one row per satellite and
    /// frequency band. Ionosphere is either modeled or estimated.
    #[default]
    Raw,
}

impl std::fmt::Display for Combination {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::IonoFree => write!(fmt, "Iono-Free"),
            Self::Raw => write!(fmt, "Raw"),
        }
    }
}

impl std::str::FromStr for Combination {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "if" | "iono-free" | "ionofree" => Ok(Self::IonoFree),
            "raw" | "uncombined" => Ok(Self::Raw),
            _ => Err(Error::InvalidCombination(s.to_string())),
        }
    }
}

/// Receiver dynamics
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Positioning {
    /// Receiver held static: coordinates are carried over from one epoch to the next.
    #[default]
    Static,
    /// Moving receiver: coordinates are re-initialized every epoch.
    Kinematic,
}

impl std::str::FromStr for Positioning {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "kinematic" => Ok(Self::Kinematic),
            _ => Err(Error::InvalidPositioning(s.to_string())),
        }
    }
}
