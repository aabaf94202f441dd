use crate::constants::MIN_MAPPING_ELEVATION_DEG;

/// Troposphere mapping function: zenith to slant delay ratio,
/// for said elevation angle (°). Shared by hydrostatic and wet components.
pub(crate) fn mapping(elevation_deg: f64) -> f64 {
    1.0 / elevation_deg
        .max(MIN_MAPPING_ELEVATION_DEG)
        .to_radians()
        .sin()
}

/// Slant hydrostatic delay (m) for this elevation (°).
pub(crate) fn slant_hydrostatic_m(zhd_m: f64, elevation_deg: f64) -> f64 {
    zhd_m * mapping(elevation_deg)
}
