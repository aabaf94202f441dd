//! Position solving candidate
use itertools::Itertools;
use log::debug;

use crate::{
    orbit::OrbitalState,
    prelude::{Carrier, Epoch, SV},
};

mod combination;
mod signal;

pub use combination::Combination;
pub use signal::Observation;

/// Position solving candidate: one satellite observed at one [Epoch].
/// The geometry is resolved once per epoch, during the preparation phase,
/// and the post-fit residuals are recorded once the epoch is committed.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// [SV]
    pub sv: SV,

    /// Sampling [Epoch]
    pub epoch: Epoch,

    /// Signal [Observation]s
    pub(crate) observations: Vec<Observation>,

    /// [OrbitalState] at transmission time, rotated to reception frame
    pub(crate) orbit: Option<OrbitalState>,

    /// Elevation at reception time (°)
    pub(crate) elevation_deg: f64,

    /// Azimuth at reception time (°)
    pub(crate) azimuth_deg: f64,

    /// Geometric range (m)
    pub(crate) range_m: f64,

    /// Post-fit residuals (m), per row this candidate contributed
    pub(crate) residuals: Vec<(Carrier, f64)>,
}

impl Candidate {
    /// Basic candidate definition, to propose to the navigation filter.
    /// ## Input
    /// - sv: [SV] Identity
    /// - epoch: sampling [Epoch]
    /// - observations: signals observations. At least one pseudo range
    ///   is required, two of them in ionosphere free mode.
    pub fn new(sv: SV, epoch: Epoch, observations: Vec<Observation>) -> Self {
        Self {
            sv,
            epoch,
            observations,
            orbit: None,
            range_m: 0.0,
            elevation_deg: 0.0,
            azimuth_deg: 0.0,
            residuals: Vec::new(),
        }
    }

    /// Returns elevation angle (°), once resolved.
    pub fn elevation_deg(&self) -> f64 {
        self.elevation_deg
    }

    /// Returns azimuth angle (°), once resolved.
    pub fn azimuth_deg(&self) -> f64 {
        self.azimuth_deg
    }

    /// Returns the resolved [OrbitalState]
    pub fn orbit(&self) -> Option<&OrbitalState> {
        self.orbit.as_ref()
    }

    /// Returns post-fit residuals (m) once the epoch has been committed.
    pub fn residuals(&self) -> &[(Carrier, f64)] {
        &self.residuals
    }

    /// Signal [Observation]s
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Sorted and unique list of [Carrier]s that have a pseudo range.
    pub(crate) fn code_carriers(&self) -> Vec<Carrier> {
        self.observations
            .iter()
            .filter(|obs| obs.pseudo_range_m.is_some())
            .map(|obs| obs.carrier)
            .unique()
            .sorted()
            .collect()
    }

    /// Returns pseudo range observed on this [Carrier]
    pub(crate) fn pseudo_range(&self, carrier: Carrier) -> Option<f64> {
        self.observations
            .iter()
            .filter(|obs| obs.carrier == carrier)
            .find_map(|obs| obs.pseudo_range_m)
    }

    /// Primary pseudo range (lowest [Carrier] in order)
    pub(crate) fn primary_pseudo_range(&self) -> Option<(Carrier, f64)> {
        let carrier = *self.code_carriers().first()?;
        Some((carrier, self.pseudo_range(carrier)?))
    }

    /// Secondary pseudo range
    pub(crate) fn secondary_pseudo_range(&self) -> Option<(Carrier, f64)> {
        let carrier = *self.code_carriers().get(1)?;
        Some((carrier, self.pseudo_range(carrier)?))
    }

    /// Drops all [Observation]s that do not match the SNR criteria.
    /// Observations that do not come with SNR information are preserved.
    pub(crate) fn min_snr_mask(&mut self, min_snr_dbhz: f64) {
        let (sv, t) = (self.sv, self.epoch);
        self.observations.retain(|obs| match obs.snr_dbhz {
            Some(snr) if snr < min_snr_dbhz => {
                debug!("{} ({}) - {} snr mask: {:.1} dB/Hz", t, sv, obs.carrier, snr);
                false
            },
            _ => true,
        });
    }

    /// Sets the resolved [OrbitalState]
    pub(crate) fn set_orbit(&mut self, orbit: OrbitalState) {
        self.orbit = Some(orbit);
    }
}
