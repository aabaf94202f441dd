//! Recursive estimation core
mod dop;
mod filter;
mod outlier;
mod params;
mod stochastic;

pub use dop::DilutionOfPrecision;
pub use filter::Filter;
pub use outlier::{downweight_factor, OutlierDetector};
pub use params::{Covariance, Parameter, ParameterClass, ParameterKind, ParameterSet};
pub use stochastic::{StochasticModel, TransitionModel};
