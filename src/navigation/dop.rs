use nalgebra::{DMatrix, Matrix3};

use crate::{position::ecef_to_enu, prelude::Error};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometry only [DilutionOfPrecision]
#[derive(Debug, Clone, Default, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DilutionOfPrecision {
    /// Geometric DOP
    pub gdop: f64,

    /// Position DOP
    pub pdop: f64,

    /// Horizontal DOP
    pub hdop: f64,

    /// Vertical DOP
    pub vdop: f64,

    /// Temporal DOP
    pub tdop: f64,
}

impl DilutionOfPrecision {
    /// Position block of Q, rotated to the local ENU frame.
    pub(crate) fn q_enu(q: &DMatrix<f64>, lat_rad: f64, lon_rad: f64) -> Matrix3<f64> {
        let r = ecef_to_enu(lat_rad, lon_rad);
        let q_3 = Matrix3::from_fn(|i, j| q[(i, j)]);
        r * q_3 * r.transpose()
    }

    /// Creates new [DilutionOfPrecision].
    ///
    /// ## Input
    /// - g: geometry matrix, one row per satellite: unit line of sight
    ///   (x, y, z) and clock (1) partial derivatives
    /// - lat_rad, lon_rad: receiver geodetic coordinates
    pub fn from_geometry(g: &DMatrix<f64>, lat_rad: f64, lon_rad: f64) -> Result<Self, Error> {
        let (nrows, ncols) = g.shape();

        if ncols != 4 {
            return Err(Error::MatrixDimension);
        }
        if nrows < 4 {
            return Err(Error::MatrixMinimalDimension);
        }

        let q = (g.transpose() * g)
            .try_inverse()
            .ok_or(Error::MatrixInversion)?;

        let q_enu = Self::q_enu(&q, lat_rad, lon_rad);

        Ok(Self {
            gdop: q.trace().sqrt(),
            pdop: (q[(0, 0)] + q[(1, 1)] + q[(2, 2)]).sqrt(),
            tdop: q[(3, 3)].sqrt(),
            vdop: q_enu[(2, 2)].sqrt(),
            hdop: (q_enu[(0, 0)] + q_enu[(1, 1)]).sqrt(),
        })
    }
}
