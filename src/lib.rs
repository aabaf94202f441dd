#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod averager;
mod bancroft;
mod bias;
mod candidate;
mod carrier;
mod cfg;
mod constants;
mod error;
mod navigation;
mod observation;
mod orbit;
mod position;
mod processor;
mod products;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::averager::Averager;
    pub use crate::bancroft::Bancroft;
    pub use crate::bias::{AtmosphereDelays, AtmosphereModel, BiasSource, TideModel};
    pub use crate::candidate::{Candidate, Combination as CodeCombination, Observation};
    pub use crate::carrier::Carrier;
    pub use crate::cfg::{
        Combination, Config, ElevationMappingFunction, FilterMethod, InitialVariance, Modeling,
        OutlierOpts, Positioning, ProcessNoise,
    };
    pub use crate::error::Error;
    pub use crate::navigation::{
        downweight_factor, Covariance, DilutionOfPrecision, Filter, OutlierDetector, Parameter,
        ParameterClass, ParameterKind, ParameterSet, StochasticModel, TransitionModel,
    };
    pub use crate::observation::ObservationSource;
    pub use crate::orbit::{OrbitSource, OrbitalState};
    pub use crate::position::Position;
    pub use crate::processor::{
        process_sites, BatchReport, EpochProcessor, EpochSolution, Sources,
    };
    pub use crate::products::{Product, ProductKey, ProductStore, ProductType};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::{DMatrix, DVector, Vector3, Vector4};
}

// pub export
pub use error::Error;
