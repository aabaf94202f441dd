//! Bancroft solver: direct (non iterative) position and clock
//! estimate, used to initialize the navigation filter.
use log::debug;
use nalgebra::{DMatrix, DVector, Vector4};

use crate::{
    constants::{EARTH_SEMI_MAJOR_AXIS_WGS84, SPEED_OF_LIGHT_M_S},
    prelude::{Candidate, Error},
};

/// Two roots whose prefit residuals differ by less than this (m)
/// cannot be told apart from the measurements alone.
const RESIDUAL_TIE_M: f64 = 1.0;

pub struct Bancroft {
    /// One row per candidate: (x_sv, y_sv, z_sv, ρ + c.dt_sv)
    b: DMatrix<f64>,
}

/// Lorentz inner product
fn lorentz(a: &Vector4<f64>, b: &Vector4<f64>) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] - a[3] * b[3]
}

impl Bancroft {
    /// Builds new [Bancroft] solver. Requires 4 candidates with
    /// resolved orbital state and one pseudo range observation.
    pub fn new(cd: &[Candidate]) -> Result<Self, Error> {
        let rows = cd
            .iter()
            .filter_map(|cd| {
                let orbit = cd.orbit()?;
                let (_, pr) = cd.primary_pseudo_range()?;
                let pos = orbit.position_m;
                Some([
                    pos[0],
                    pos[1],
                    pos[2],
                    pr + orbit.clock_offset_s * SPEED_OF_LIGHT_M_S,
                ])
            })
            .collect::<Vec<_>>();

        if rows.len() < 4 {
            return Err(Error::BancroftError);
        }

        Ok(Self {
            b: DMatrix::from_fn(rows.len(), 4, |i, j| rows[i][j]),
        })
    }

    /// Residual RMS (m) of this (x, y, z, clock) solution
    fn residual_rms(&self, solution: &Vector4<f64>) -> f64 {
        let sum = self
            .b
            .row_iter()
            .map(|row| {
                let dx = row[0] - solution[0];
                let dy = row[1] - solution[1];
                let dz = row[2] - solution[2];
                let range = (dx * dx + dy * dy + dz * dz).sqrt();
                (row[3] - range - solution[3]).powi(2)
            })
            .sum::<f64>();
        (sum / self.b.nrows() as f64).sqrt()
    }

    /// Resolves (x, y, z) ECEF position (m) and receiver clock offset (m).
    pub fn resolve(&self) -> Result<Vector4<f64>, Error> {
        let m = self.b.nrows();

        let a = DVector::from_fn(m, |i, _| {
            let row = Vector4::new(
                self.b[(i, 0)],
                self.b[(i, 1)],
                self.b[(i, 2)],
                self.b[(i, 3)],
            );
            0.5 * lorentz(&row, &row)
        });

        let ones = DVector::from_element(m, 1.0);

        let svd = self.b.clone().svd(true, true);

        let u = svd
            .solve(&ones, 1.0E-9)
            .map_err(|_| Error::MatrixInversion)?;

        let v = svd.solve(&a, 1.0E-9).map_err(|_| Error::MatrixInversion)?;

        let u = Vector4::new(u[0], u[1], u[2], u[3]);
        let v = Vector4::new(v[0], v[1], v[2], v[3]);

        // E λ² + 2F λ + G = 0
        let e = lorentz(&u, &u);
        let f = lorentz(&u, &v) - 1.0;
        let g = lorentz(&v, &v);

        let delta = f * f - e * g;
        if delta < 0.0 {
            return Err(Error::BancroftImaginarySolution);
        }

        // e is usually tiny: stable root formulation
        let q = -(f + f.signum() * delta.sqrt());

        let lambdas = [q / e, g / q];

        let mut best: Option<(Vector4<f64>, f64)> = None;

        for lambda in lambdas {
            if !lambda.is_finite() {
                continue;
            }

            let mut y = u * lambda + v;
            y[3] = -y[3];

            let rms = self.residual_rms(&y);
            debug!("bancroft root: {} (rms={:.3}m)", y.transpose(), rms);

            best = match best {
                None => Some((y, rms)),
                Some((best_y, best_rms)) => {
                    if (rms - best_rms).abs() < RESIDUAL_TIE_M {
                        // undetermined: retain the root closest to the ground
                        let alt = (y.xyz().norm() - EARTH_SEMI_MAJOR_AXIS_WGS84).abs();
                        let best_alt =
                            (best_y.xyz().norm() - EARTH_SEMI_MAJOR_AXIS_WGS84).abs();
                        if alt < best_alt {
                            Some((y, rms))
                        } else {
                            Some((best_y, best_rms))
                        }
                    } else if rms < best_rms {
                        Some((y, rms))
                    } else {
                        Some((best_y, best_rms))
                    }
                },
            };
        }

        let (solution, _) = best.ok_or(Error::BancroftImaginarySolution)?;
        Ok(solution)
    }
}
