use nalgebra::{DMatrix, DVector};

use super::Update;
use crate::prelude::Error;

/// Classical Kalman measurement update.
/// - K = Qx Aᵀ (P⁻¹ + A Qx Aᵀ)⁻¹
/// - dx = K l
/// - Qx = (I - K A) Qx (I - K A)ᵀ + K P⁻¹ Kᵀ (Joseph form)
pub(super) fn update(
    a: &DMatrix<f64>,
    p: &DMatrix<f64>,
    l: &DVector<f64>,
    qx: &DMatrix<f64>,
) -> Result<Update, Error> {
    let n = qx.nrows();

    let r = p
        .clone()
        .cholesky()
        .ok_or(Error::NonPositiveDefinite)?
        .inverse();

    let qx_at = qx * a.transpose();
    let innovation = a * &qx_at + &r;

    let innovation_inv = innovation
        .cholesky()
        .ok_or(Error::MatrixInversion)?
        .inverse();

    let k = qx_at * innovation_inv;
    let dx = &k * l;

    let i_ka = DMatrix::<f64>::identity(n, n) - &k * a;
    let qx = &i_ka * qx * i_ka.transpose() + &k * r * k.transpose();

    Ok(Update { dx, qx })
}
