use crate::prelude::{Epoch, Vector3, SV};

/// Satellite state at signal transmission, as needed by the processor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitalState {
    /// Antenna phase center position, ECEF meters
    pub position_m: Vector3<f64>,
    /// Velocity, ECEF m.s⁻¹
    pub velocity_m_s: Vector3<f64>,
    /// Onboard clock offset to system time (s)
    pub clock_offset_s: f64,
    /// True when the satellite lies in Earth's shadow
    pub eclipsed: bool,
}

impl OrbitalState {
    /// Builds [OrbitalState] from position only (ECEF m).
    pub fn from_position(position_m: Vector3<f64>) -> Self {
        Self {
            position_m,
            ..Default::default()
        }
    }

    /// Copies and returns [OrbitalState] with onboard clock offset (s)
    pub fn with_clock_offset(&self, clock_offset_s: f64) -> Self {
        let mut s = *self;
        s.clock_offset_s = clock_offset_s;
        s
    }

    /// Copies and returns [OrbitalState] with eclipse flag
    pub fn with_eclipse(&self, eclipsed: bool) -> Self {
        let mut s = *self;
        s.eclipsed = eclipsed;
        s
    }

    /// Rotates this state by the Earth rotation accumulated during
    /// propagation time `dt_s`, so it is expressed in the ECEF frame at reception.
    pub(crate) fn rotate_earth(&self, dt_s: f64) -> Self {
        use crate::constants::EARTH_ANGULAR_VEL_RAD;
        let (sin, cos) = (EARTH_ANGULAR_VEL_RAD * dt_s).sin_cos();
        let rot = nalgebra::Matrix3::new(cos, sin, 0.0, -sin, cos, 0.0, 0.0, 0.0, 1.0);
        let mut s = *self;
        s.position_m = rot * self.position_m;
        s.velocity_m_s = rot * self.velocity_m_s;
        s
    }
}

/// Any orbit provider should implement the [OrbitSource] trait to provide
/// information that will contribute to the solving process.
pub trait OrbitSource {
    /// Provide [OrbitalState] for this [SV] at requested [Epoch].
    ///
    /// The processor is fully synchronous and expects measurements
    /// in chronological order. Because it follows your measurements,
    /// requests will then also be in chronological order.
    /// Returning None excludes this [SV] from the current epoch.
    fn state_at(&self, epoch: Epoch, sv: SV) -> Option<OrbitalState>;
}

#[cfg(test)]
mod test {
    use super::OrbitalState;
    use crate::prelude::Vector3;

    #[test]
    fn earth_rotation_preserves_radius() {
        let state = OrbitalState::from_position(Vector3::new(15.0E6, -12.0E6, 18.0E6));
        let rotated = state.rotate_earth(0.075);
        assert!((rotated.position_m.norm() - state.position_m.norm()).abs() < 1.0E-6);
        assert_eq!(rotated.position_m[2], state.position_m[2]);
        // eastward displacement in the order of 100m at GNSS altitude
        let shift = (rotated.position_m - state.position_m).norm();
        assert!(shift > 50.0 && shift < 200.0, "shift is {}", shift);
    }
}
