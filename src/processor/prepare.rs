use std::sync::Arc;

use log::{debug, info, warn};

use super::EpochProcessor;

use crate::{
    bancroft::Bancroft,
    bias::AtmosphereDelays,
    cfg::{Combination, Positioning},
    constants::SPEED_OF_LIGHT_M_S,
    navigation::ParameterKind,
    position::Position,
    prelude::{Candidate, Carrier, Duration, Epoch, Error},
};

/// Epoch wide context, resolved once during preparation
pub(crate) struct Context {
    /// Receiver position the geometry was resolved at
    pub rx: Position,
    /// A-priori [AtmosphereDelays], when available
    pub atmosphere: Option<AtmosphereDelays>,
}

impl EpochProcessor {
    /// Gathers the measurements, resolves orbits and geometry,
    /// and applies all pre-fit criteria.
    pub(crate) fn prepare(&mut self, t: Epoch) -> Result<(Vec<Candidate>, Context), Error> {
        let min_sv = self.cfg.min_sv;
        let modeling = self.cfg.modeling;

        let mut pool = self.sources.observations.observations(&self.site, t);

        if pool.is_empty() {
            return Err(Error::NoObservations);
        }
        if pool.len() < min_sv {
            return Err(Error::NotEnoughCandidates);
        }

        let constellations = &self.cfg.constellations;
        pool.retain(|cd| {
            let selected = constellations.contains(&cd.sv.constellation);
            if !selected {
                debug!("{} ({}) - rejected : constellation not selected", t, cd.sv);
            }
            selected
        });

        for cd in pool.iter_mut() {
            let (sv, constellation) = (cd.sv, cd.sv.constellation);
            cd.observations.retain(|obs| {
                let compatible = obs.carrier.is_compatible(constellation);
                if !compatible {
                    debug!("{} ({}) - {} not transmitted by {}", t, sv, obs.carrier, constellation);
                }
                compatible
            });
        }

        // signal quality
        if let Some(min_snr) = self.cfg.min_snr {
            for cd in pool.iter_mut() {
                cd.min_snr_mask(min_snr);
            }
        }

        // signal condition
        let combination = self.cfg.combination;
        pool.retain(|cd| {
            let nb_codes = cd.code_carriers().len();
            match combination {
                Combination::IonoFree if nb_codes < 2 => {
                    debug!("{} ({}) - {}", t, cd.sv, Error::PseudoRangeCombination(t, cd.sv));
                    false
                },
                Combination::Raw if nb_codes == 0 => {
                    debug!("{} ({}) - {}", t, cd.sv, Error::MissingPseudoRange(t, cd.sv));
                    false
                },
                _ => true,
            }
        });

        if modeling.code_biases {
            if let Some(biases) = &self.sources.biases {
                for cd in pool.iter_mut() {
                    let sv = cd.sv;
                    let reference = Carrier::reference(sv.constellation);
                    for obs in cd.observations.iter_mut() {
                        if let Some(pr) = obs.pseudo_range_m.as_mut() {
                            if let Some(bias) = biases.code_bias(t, sv, reference, obs.carrier) {
                                debug!("{} ({}) - {} code bias: {:.3}m", t, sv, obs.carrier, bias);
                                *pr += bias;
                            }
                        }
                    }
                }
            }
        }

        // orbits, at transmission time
        let orbits = Arc::clone(&self.sources.orbits);
        let eclipse_filter = self.cfg.eclipse_filter;

        let mut pool = pool
            .into_iter()
            .filter_map(|mut cd| {
                let (_, pr) = cd.primary_pseudo_range()?;
                let dt_tx = Duration::from_seconds(pr / SPEED_OF_LIGHT_M_S);
                match orbits.state_at(t - dt_tx, cd.sv) {
                    Some(orbit) => {
                        if eclipse_filter && orbit.eclipsed {
                            debug!("{} ({}) - rejected : eclipsed", t, cd.sv);
                            None
                        } else {
                            cd.set_orbit(orbit);
                            Some(cd)
                        }
                    },
                    None => {
                        debug!("{} ({}) - {}", t, cd.sv, Error::MissingOrbit(t, cd.sv));
                        None
                    },
                }
            })
            .collect::<Vec<_>>();

        if pool.len() < min_sv {
            return Err(Error::NotEnoughPreFitCandidates);
        }

        // linearization point
        let kinematic = self.cfg.positioning == Positioning::Kinematic;

        if !self.initialized || kinematic {
            match Bancroft::new(&pool).and_then(|solver| solver.resolve()) {
                Ok(solution) => {
                    if !self.initialized {
                        let geo = Position::from_ecef(solution.xyz()).geodetic();
                        info!(
                            "{} ({}) - initial position lat={:.6}°, lon={:.6}°",
                            t,
                            self.site,
                            geo[0].to_degrees(),
                            geo[1].to_degrees()
                        );
                    }
                    self.set_value(ParameterKind::CoordinateX, solution[0])?;
                    self.set_value(ParameterKind::CoordinateY, solution[1])?;
                    self.set_value(ParameterKind::CoordinateZ, solution[2])?;
                    self.set_value(ParameterKind::Clock, solution[3])?;
                    self.initialized = true;
                },
                Err(e) => {
                    if !self.initialized {
                        return Err(e);
                    }
                    warn!("{} ({}) - bancroft: {}", t, self.site, e);
                },
            }
        }

        let coordinates = self.coordinates()?;
        let mut rx_ecef = coordinates;

        if modeling.solid_tides {
            if let Some(tides) = &self.sources.tides {
                let displacement = tides.displacement(coordinates, t);
                debug!("{} ({}) - site displacement: {}", t, self.site, displacement.transpose());
                rx_ecef += displacement;
            }
        }

        let rx = Position::from_ecef(rx_ecef);
        let min_sv_elev = self.cfg.min_sv_elev;

        pool = pool
            .into_iter()
            .filter_map(|mut cd| {
                let mut orbit = *cd.orbit()?;

                if modeling.earth_rotation {
                    let tau = (orbit.position_m - rx_ecef).norm() / SPEED_OF_LIGHT_M_S;
                    orbit = orbit.rotate_earth(tau);
                }

                let range_m = (orbit.position_m - rx_ecef).norm();
                let (elevation_deg, azimuth_deg) = rx.elevation_azimuth_deg(orbit.position_m);

                if elevation_deg < min_sv_elev {
                    debug!(
                        "{} ({}) - rejected : below elevation mask ({:.2}°)",
                        t, cd.sv, elevation_deg
                    );
                    return None;
                }

                cd.set_orbit(orbit);
                cd.range_m = range_m;
                cd.elevation_deg = elevation_deg;
                cd.azimuth_deg = azimuth_deg;
                debug!(
                    "{} ({}) - elev={:.2}° azim={:.2}° range={:.3}m",
                    t, cd.sv, elevation_deg, azimuth_deg, range_m
                );
                Some(cd)
            })
            .collect();

        if pool.len() < min_sv {
            return Err(Error::NotEnoughPreFitCandidates);
        }

        let atmosphere = if modeling.atmosphere {
            self.sources
                .atmosphere
                .as_ref()
                .and_then(|model| model.delays(rx_ecef, t))
        } else {
            None
        };

        pool.sort_by_key(|cd| cd.sv);

        Ok((pool, Context { rx, atmosphere }))
    }
}
