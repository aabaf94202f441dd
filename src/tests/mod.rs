
use std::collections::HashMap;
use std::sync::{Arc, Once};

use log::LevelFilter;

use crate::{
    bias::{iono, tropo},
    constants::SPEED_OF_LIGHT_M_S,
    prelude::{
        AtmosphereDelays, AtmosphereModel, BiasSource, Candidate, Carrier, Constellation,
        Duration, Epoch, Observation, ObservationSource, OrbitSource, OrbitalState, Position,
        Sources, TideModel, Vector3, SV,
    },
};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Site coordinates used across the scenarios
pub const SITE_ECEF_M: (f64, f64, f64) = (4696989.6880, 723994.1970, 4239678.3040);

/// Satellite distance to the site (m)
const SV_DISTANCE_M: f64 = 22_000_000.0;

/// Nominal and degraded signal strength (dB/Hz)
const NOMINAL_SNR_DBHZ: f64 = 45.0;
const WEAK_SNR_DBHZ: f64 = 20.0;

pub fn site_ecef() -> Vector3<f64> {
    Vector3::new(SITE_ECEF_M.0, SITE_ECEF_M.1, SITE_ECEF_M.2)
}

pub fn t0() -> Epoch {
    Epoch::from_gregorian_utc_at_midnight(2020, 6, 25)
}

/// Sampling epochs, 30s apart
pub fn epochs(n: usize) -> Vec<Epoch> {
    (0..n)
        .map(|i| t0() + Duration::from_seconds(30.0 * i as f64))
        .collect()
}

/// Sky plot as seen from the test site: (PRN, azimuth °, elevation °)
pub const GPS_SKY: [(u8, f64, f64); 8] = [
    (1, 0.0, 80.0),
    (2, 60.0, 45.0),
    (3, 150.0, 30.0),
    (4, 240.0, 50.0),
    (5, 300.0, 25.0),
    (6, 200.0, 15.0),
    (7, 100.0, 20.0),
    (8, 20.0, 35.0),
];

pub const GAL_SKY: [(u8, f64, f64); 3] = [(1, 45.0, 60.0), (2, 170.0, 40.0), (3, 280.0, 20.0)];

/// Noise free observations of a static site, with exact
/// pseudo ranges. Also acts as the [OrbitSource] and as every
/// optional collaborator, so each physical effect injected in the
/// measurements can be compensated exactly.
pub struct SyntheticSite {
    pub site: String,
    pub truth: Vector3<f64>,
    /// Receiver clock offset (m)
    pub clock_m: f64,
    pub epochs: Vec<Epoch>,
    pub satellites: HashMap<SV, Vector3<f64>>,
    /// Onboard clock offsets (s)
    pub sv_clocks: HashMap<SV, f64>,
    /// Satellites that are not observed at some epochs
    pub hidden: Vec<(Epoch, SV)>,
    /// Pseudo range offsets (m)
    pub offsets: Vec<(Epoch, SV, f64)>,
    /// Signals received with a low SNR
    pub weak: Vec<(Epoch, SV, Carrier)>,
    /// Receiver hardware delays (m), per signal
    pub rx_biases: HashMap<Carrier, f64>,
    /// Satellite code biases (m), per signal
    pub code_biases: HashMap<(SV, Carrier), f64>,
    /// Atmosphere delays affecting the signals
    pub atmosphere: Option<AtmosphereDelays>,
    /// Antenna displacement with respect to the monument (m)
    pub displacement: Vector3<f64>,
    /// Satellites in Earth's shadow
    pub eclipsed: Vec<SV>,
    /// Signal propagation in the rotating Earth frame
    pub earth_rotation: bool,
}

impl SyntheticSite {
    pub fn new(site: &str, nb_epochs: usize) -> Self {
        Self {
            site: site.to_string(),
            truth: site_ecef(),
            clock_m: 0.0,
            epochs: epochs(nb_epochs),
            satellites: HashMap::new(),
            sv_clocks: HashMap::new(),
            hidden: Vec::new(),
            offsets: Vec::new(),
            weak: Vec::new(),
            rx_biases: HashMap::new(),
            code_biases: HashMap::new(),
            atmosphere: None,
            displacement: Vector3::zeros(),
            eclipsed: Vec::new(),
            earth_rotation: false,
        }
    }

    /// Places a satellite in the sky of this site
    pub fn with_satellite(mut self, sv: SV, azimuth_deg: f64, elevation_deg: f64) -> Self {
        let (sin_az, cos_az) = azimuth_deg.to_radians().sin_cos();
        let (sin_el, cos_el) = elevation_deg.to_radians().sin_cos();
        let enu = Vector3::new(cos_el * sin_az, cos_el * cos_az, sin_el);
        let rot = Position::from_ecef(self.truth).ecef_to_enu();
        let ecef = self.truth + rot.transpose() * enu * SV_DISTANCE_M;
        self.satellites.insert(sv, ecef);
        self
    }

    /// Places the first `n` GPS satellites of the test sky plot
    pub fn with_gps(self, n: usize) -> Self {
        GPS_SKY.iter().take(n).fold(self, |s, (prn, az, el)| {
            s.with_satellite(SV::new(Constellation::GPS, *prn), *az, *el)
        })
    }

    /// Places the Galileo satellites of the test sky plot
    pub fn with_galileo(self) -> Self {
        GAL_SKY.iter().fold(self, |s, (prn, az, el)| {
            s.with_satellite(SV::new(Constellation::Galileo, *prn), *az, *el)
        })
    }

    pub fn with_clock_offset(mut self, clock_m: f64) -> Self {
        self.clock_m = clock_m;
        self
    }

    pub fn with_sv_clock(mut self, sv: SV, offset_s: f64) -> Self {
        self.sv_clocks.insert(sv, offset_s);
        self
    }

    pub fn hide(mut self, t: Epoch, sv: SV) -> Self {
        self.hidden.push((t, sv));
        self
    }

    pub fn with_offset(mut self, t: Epoch, sv: SV, offset_m: f64) -> Self {
        self.offsets.push((t, sv, offset_m));
        self
    }

    /// Degrades this signal's SNR at this epoch
    pub fn weaken(mut self, t: Epoch, sv: SV, carrier: Carrier) -> Self {
        self.weak.push((t, sv, carrier));
        self
    }

    pub fn with_receiver_bias(mut self, carrier: Carrier, bias_m: f64) -> Self {
        self.rx_biases.insert(carrier, bias_m);
        self
    }

    pub fn with_code_bias(mut self, sv: SV, carrier: Carrier, bias_m: f64) -> Self {
        self.code_biases.insert((sv, carrier), bias_m);
        self
    }

    pub fn with_atmosphere(mut self, delays: AtmosphereDelays) -> Self {
        self.atmosphere = Some(delays);
        self
    }

    pub fn with_displacement(mut self, displacement: Vector3<f64>) -> Self {
        self.displacement = displacement;
        self
    }

    pub fn eclipse(mut self, sv: SV) -> Self {
        self.eclipsed.push(sv);
        self
    }

    pub fn with_earth_rotation(mut self) -> Self {
        self.earth_rotation = true;
        self
    }

    /// Antenna position (m)
    pub fn antenna(&self) -> Vector3<f64> {
        self.truth + self.displacement
    }

    /// Satellite position (m) in the frame of reception
    fn received_position(&self, sv: SV) -> Vector3<f64> {
        let position = self.satellites[&sv];
        if self.earth_rotation {
            let tau = (position - self.antenna()).norm() / SPEED_OF_LIGHT_M_S;
            OrbitalState::from_position(position)
                .rotate_earth(tau)
                .position_m
        } else {
            position
        }
    }

    fn code_bias_m(&self, sv: SV, carrier: Carrier) -> f64 {
        self.code_biases
            .get(&(sv, carrier))
            .copied()
            .unwrap_or_default()
    }

    /// Pseudo range (m) of this signal
    fn pseudo_range(&self, t: Epoch, sv: SV, carrier: Carrier) -> f64 {
        let antenna = self.antenna();
        let position = self.received_position(sv);

        let range = (position - antenna).norm();
        let dt_sv = self.sv_clocks.get(&sv).copied().unwrap_or_default();
        let offset = self
            .offsets
            .iter()
            .filter(|(epoch, target, _)| *epoch == t && *target == sv)
            .map(|(_, _, offset)| offset)
            .sum::<f64>();

        let mut pr = range + self.clock_m - dt_sv * SPEED_OF_LIGHT_M_S + offset;

        pr += self.rx_biases.get(&carrier).copied().unwrap_or_default();
        pr += self.code_bias_m(sv, carrier);

        if let Some(delays) = self.atmosphere {
            let (elevation, _) = Position::from_ecef(antenna).elevation_azimuth_deg(position);
            pr += (delays.zhd_m + delays.zwd_m) * tropo::mapping(elevation);
            pr += delays.vertical_iono_m
                * iono::mapping(elevation)
                * carrier.iono_scaling(Carrier::L1);
        }

        pr
    }

    /// Observed frequency bands
    fn carriers(constellation: Constellation) -> [Carrier; 2] {
        match constellation {
            Constellation::Galileo => [Carrier::E1, Carrier::E5a],
            _ => [Carrier::L1, Carrier::L2],
        }
    }

    /// Wraps into processor [Sources]
    pub fn sources(self) -> Sources {
        let site = Arc::new(self);
        Sources::new(site.clone(), site.clone())
            .with_biases(site.clone())
            .with_atmosphere(site.clone())
            .with_tides(site)
    }

    /// [Candidate]s with resolved orbits, as expected by the direct solver
    pub fn resolved_candidates(&self, t: Epoch) -> Vec<Candidate> {
        let mut pool = self.observations(&self.site, t);
        for cd in pool.iter_mut() {
            if let Some(state) = self.state_at(t, cd.sv) {
                cd.set_orbit(state);
            }
        }
        pool
    }
}

impl ObservationSource for SyntheticSite {
    fn epochs(&self, site: &str, begin: Epoch, end: Epoch) -> Vec<Epoch> {
        if site != self.site {
            return Vec::new();
        }
        self.epochs
            .iter()
            .filter(|t| **t >= begin && **t <= end)
            .copied()
            .collect()
    }

    fn observations(&self, site: &str, t: Epoch) -> Vec<Candidate> {
        if site != self.site || !self.epochs.contains(&t) {
            return Vec::new();
        }

        let mut svs = self
            .satellites
            .keys()
            .filter(|sv| !self.hidden.contains(&(t, **sv)))
            .copied()
            .collect::<Vec<_>>();

        svs.sort();

        svs.into_iter()
            .map(|sv| {
                let observations = Self::carriers(sv.constellation)
                    .into_iter()
                    .map(|carrier| {
                        let snr = if self.weak.contains(&(t, sv, carrier)) {
                            WEAK_SNR_DBHZ
                        } else {
                            NOMINAL_SNR_DBHZ
                        };
                        let pr = self.pseudo_range(t, sv, carrier);
                        Observation::pseudo_range(carrier, pr, Some(snr))
                    })
                    .collect();

                Candidate::new(sv, t, observations)
            })
            .collect()
    }
}

impl OrbitSource for SyntheticSite {
    fn state_at(&self, _: Epoch, sv: SV) -> Option<OrbitalState> {
        let position = self.satellites.get(&sv)?;
        let clock = self.sv_clocks.get(&sv).copied().unwrap_or_default();
        Some(
            OrbitalState::from_position(*position)
                .with_clock_offset(clock)
                .with_eclipse(self.eclipsed.contains(&sv)),
        )
    }
}

impl BiasSource for SyntheticSite {
    fn code_bias(&self, _: Epoch, sv: SV, reference: Carrier, target: Carrier) -> Option<f64> {
        Some(self.code_bias_m(sv, reference) - self.code_bias_m(sv, target))
    }
}

impl AtmosphereModel for SyntheticSite {
    fn delays(&self, _: Vector3<f64>, _: Epoch) -> Option<AtmosphereDelays> {
        self.atmosphere
    }
}

impl TideModel for SyntheticSite {
    fn displacement(&self, _: Vector3<f64>, _: Epoch) -> Vector3<f64> {
        self.displacement
    }
}

#[test]
fn synthetic_geometry() {
    let site = SyntheticSite::new("TEST", 1).with_gps(8);
    let rx = Position::from_ecef(site.truth);
    for (prn, az, el) in GPS_SKY.iter() {
        let sv = SV::new(Constellation::GPS, *prn);
        let (elev, azim) = rx.elevation_azimuth_deg(site.satellites[&sv]);
        assert!((elev - el).abs() < 1.0E-6, "{}: elevation {}", sv, elev);
        assert!(
            (azim - az).abs() < 1.0E-6 || (azim - az).abs() > 359.999,
            "{}: azimuth {}",
            sv,
            azim
        );
    }
}
