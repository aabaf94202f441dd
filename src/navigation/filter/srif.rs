use nalgebra::{DMatrix, DVector};

use super::{upper_cholesky, Update};
use crate::prelude::Error;

/// Square root information measurement update.
///
/// With Qx = L Lᵀ, the prior information factor is L⁻¹.
/// With P = WᵀW, the pre-array
///
/// | L⁻¹   0   |
/// | W.A   W.l |
///
/// is triangularized into
///
/// | R  z |
/// | 0  e |
///
/// from which R dx = z and Qx = R⁻¹ R⁻ᵀ.
pub(super) fn update(
    a: &DMatrix<f64>,
    p: &DMatrix<f64>,
    l: &DVector<f64>,
    qx: &DMatrix<f64>,
) -> Result<Update, Error> {
    let (m, n) = a.shape();

    let chol = qx.clone().cholesky().ok_or(Error::NonPositiveDefinite)?;

    let info = chol
        .l()
        .solve_lower_triangular(&DMatrix::identity(n, n))
        .ok_or(Error::MatrixInversion)?;

    let w = upper_cholesky(p)?;

    let mut pre = DMatrix::<f64>::zeros(n + m, n + 1);
    pre.view_mut((0, 0), (n, n)).copy_from(&info);
    pre.view_mut((n, 0), (m, n)).copy_from(&(&w * a));
    pre.view_mut((n, n), (m, 1)).copy_from(&(&w * l));

    let post = pre.qr().r();

    let r = post.view((0, 0), (n, n)).into_owned();
    let z = post.view((0, n), (n, 1)).into_owned();

    let dx = r.solve_upper_triangular(&z).ok_or(Error::QrDecomposition)?;

    let r_inv = r
        .solve_upper_triangular(&DMatrix::identity(n, n))
        .ok_or(Error::MatrixInversion)?;

    let qx = &r_inv * r_inv.transpose();

    Ok(Update {
        dx: dx.column(0).into_owned(),
        qx,
    })
}
