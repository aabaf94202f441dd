/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// WGS84 Earth Frame Ellipsoid semi-major axis
pub const EARTH_SEMI_MAJOR_AXIS_WGS84: f64 = 6378137.0_f64;

/// Speed of light in m.s⁻¹
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Seconds per hour, used to convert random walk spectral densities
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Lowest elevation angle (°) allowed in the mapping functions,
/// prevents the 1/sin(e) singularity at the horizon.
pub const MIN_MAPPING_ELEVATION_DEG: f64 = 3.0;
