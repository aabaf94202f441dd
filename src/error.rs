use thiserror::Error;

use crate::prelude::{Epoch, SV};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Unknown or unsupported filter name
    #[error("invalid filter method \"{0}\"")]
    InvalidFilterMethod(String),

    /// Unknown signal combination name
    #[error("invalid signal combination \"{0}\"")]
    InvalidCombination(String),

    /// Unknown positioning mode
    #[error("invalid positioning mode \"{0}\"")]
    InvalidPositioning(String),

    /// [Config] does not make sense and the processor may not be deployed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Observation source returned nothing for this epoch.
    #[error("no observations")]
    NoObservations,

    /// Not enough candidates were proposed, with respect to the navigation parameters.
    #[error("not enough candidates provided")]
    NotEnoughCandidates,

    /// PreFit criteria (constellation, signal quality, elevation, eclipse)
    /// have been applied but we're left with not enough vehicles.
    #[error("not enough candidates match pre-fit criteria")]
    NotEnoughPreFitCandidates,

    /// Outlier rejection left us with not enough vehicles.
    #[error("not enough candidates match post-fit criteria")]
    NotEnoughPostFitCandidates,

    /// Initialization without apriori requires at least 4 satellites.
    #[error("bancroft requires at least 4 fully resolved candidates")]
    BancroftError,

    /// Unrealistic signal observations or orbital states were forwarded.
    #[error("bancroft solver error: invalid input (imaginary solution)")]
    BancroftImaginarySolution,

    #[error("not enough observations to form the design matrix")]
    MatrixMinimalDimension,

    #[error("internal error: invalid matrix dimensions")]
    MatrixDimension,

    /// Invalid orbital states or bad signal data may cause the algebric calculations
    /// to wind up here.
    #[error("failed to invert matrix")]
    MatrixInversion,

    /// Covariance matrix is not positive definite (cholesky failure).
    #[error("covariance is not positive definite")]
    NonPositiveDefinite,

    /// Triangularization did not return a usable factor.
    #[error("orthogonal triangularization failure")]
    QrDecomposition,

    /// Filter converged to a non finite state.
    #[error("filter diverged (non finite correction)")]
    Divergence,

    /// Parameter lookup failed
    #[error("unknown parameter")]
    UnknownParameter,

    /// Parameter index is out of range or not contiguous
    #[error("parameter set is not indexed")]
    UnindexedParameters,

    #[error("{0} ({1}): missing pseudo range observation")]
    MissingPseudoRange(Epoch, SV),

    /// Iono free combination requires code observations on two frequencies.
    #[error("{0} ({1}): failed to form pseudo range combination")]
    PseudoRangeCombination(Epoch, SV),

    #[error("{0} ({1}): missing orbital state")]
    MissingOrbit(Epoch, SV),
}
