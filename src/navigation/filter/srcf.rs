use nalgebra::{DMatrix, DVector};

use super::{upper_cholesky, Update};
use crate::prelude::Error;

/// Square root covariance measurement update.
///
/// With Qx = SᵀS and P⁻¹ = RsᵀRs, the pre-array
///
/// | Rs    0 |
/// | S.Aᵀ  S |
///
/// is triangularized into
///
/// | X  Y |
/// | 0  Z |
///
/// where XᵀX = P⁻¹ + A Qx Aᵀ, Kᵀ = X⁻¹ Y and the updated factor is Z.
pub(super) fn update(
    a: &DMatrix<f64>,
    p: &DMatrix<f64>,
    l: &DVector<f64>,
    qx: &DMatrix<f64>,
) -> Result<Update, Error> {
    let (m, n) = a.shape();

    let s = upper_cholesky(qx)?;

    let r = p
        .clone()
        .cholesky()
        .ok_or(Error::NonPositiveDefinite)?
        .inverse();

    let rs = upper_cholesky(&r)?;

    let mut pre = DMatrix::<f64>::zeros(m + n, m + n);
    pre.view_mut((0, 0), (m, m)).copy_from(&rs);
    pre.view_mut((m, 0), (n, m)).copy_from(&(&s * a.transpose()));
    pre.view_mut((m, m), (n, n)).copy_from(&s);

    let post = pre.qr().r();

    let x = post.view((0, 0), (m, m)).into_owned();
    let y = post.view((0, m), (m, n)).into_owned();
    let z = post.view((m, m), (n, n)).into_owned();

    let kt = x.solve_upper_triangular(&y).ok_or(Error::QrDecomposition)?;

    let dx = kt.transpose() * l;
    let qx = z.transpose() * z;

    Ok(Update { dx, qx })
}
