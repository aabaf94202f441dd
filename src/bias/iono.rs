use crate::constants::EARTH_SEMI_MAJOR_AXIS_WGS84;

/// Single layer ionosphere height (m)
const IONO_LAYER_HEIGHT_M: f64 = 350.0E3;

/// Single layer mapping function: vertical to slant ionosphere
/// delay ratio, for said elevation angle (°).
pub(crate) fn mapping(elevation_deg: f64) -> f64 {
    let ratio = EARTH_SEMI_MAJOR_AXIS_WGS84 / (EARTH_SEMI_MAJOR_AXIS_WGS84 + IONO_LAYER_HEIGHT_M);
    let sin_z = ratio * elevation_deg.max(0.0).to_radians().cos();
    1.0 / (1.0 - sin_z.powi(2)).sqrt()
}
