//! Receiver position and local topocentric geometry
use crate::prelude::Vector3;
use map_3d::{ecef2geodetic, geodetic2ecef, Ellipsoid};
use nalgebra::Matrix3;

/// [Position] is used as the linearization point and as the
/// origin of the local topocentric frame.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// ECEF coordinates in meters
    pub(crate) ecef: Vector3<f64>,
    /// Geodetic coordinates in radians
    pub(crate) geodetic: Vector3<f64>,
}

impl Position {
    /// Builds new [Position] from ECEF coordinates expressed in meter.
    pub fn from_ecef(ecef: Vector3<f64>) -> Self {
        let (x, y, z) = (ecef[0], ecef[1], ecef[2]);
        let (lat, lon, h) = ecef2geodetic(x, y, z, Ellipsoid::WGS84);
        Self {
            ecef,
            geodetic: Vector3::new(lat, lon, h),
        }
    }

    /// Builds new [Position] from Geodetic coordinates
    /// - latitude [rad]
    /// - longitude [rad]
    /// - altitude above sea level [m]
    pub fn from_geo(geodetic: Vector3<f64>) -> Self {
        let (lat, lon, alt) = (geodetic[0], geodetic[1], geodetic[2]);
        let (x, y, z) = geodetic2ecef(lat, lon, alt, Ellipsoid::WGS84);
        Self {
            geodetic,
            ecef: Vector3::new(x, y, z),
        }
    }

    /// Returns ECEF coordinates.
    pub fn ecef(&self) -> Vector3<f64> {
        self.ecef
    }

    /// Returns Geodetic coordinates
    /// - latitude [rad]
    /// - longitude [rad]
    /// - altitude above sea levl [m]
    pub fn geodetic(&self) -> Vector3<f64> {
        self.geodetic
    }

    /// ECEF to local ENU rotation matrix, at this [Position].
    pub fn ecef_to_enu(&self) -> Matrix3<f64> {
        ecef_to_enu(self.geodetic[0], self.geodetic[1])
    }

    /// Elevation and azimuth angles (both in degrees) of a target
    /// expressed in ECEF meters, as seen from this [Position].
    pub fn elevation_azimuth_deg(&self, target_ecef_m: Vector3<f64>) -> (f64, f64) {
        let enu = self.ecef_to_enu() * (target_ecef_m - self.ecef);
        let norm = enu.norm();
        if norm == 0.0 {
            return (0.0, 0.0);
        }
        let elev = (enu[2] / norm).asin().to_degrees();
        let mut azim = enu[0].atan2(enu[1]).to_degrees();
        if azim < 0.0 {
            azim += 360.0;
        }
        (elev, azim)
    }
}

/// ECEF to ENU rotation matrix, latitude and longitude in radians.
pub(crate) fn ecef_to_enu(lat_rad: f64, lon_rad: f64) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();
    Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}
