//! Measurement update
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::{cfg::FilterMethod, prelude::Error};

mod kalman;
mod srcf;
mod srif;

/// Navigation [Filter]. Every variant implements the same contract:
/// from the design matrix A (m x n), the observation weight P (m x m),
/// the prefit residuals l (m) and the prior covariance Qx (n x n), it
/// produces the correction dx (n) and updates Qx in place.
/// On any failure, dx and Qx are left untouched.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Classical Kalman filter, Joseph form
    #[default]
    Kalman,
    /// Square root covariance filter
    SquareRootCovariance,
    /// Square root information filter
    SquareRootInformation,
}

impl From<FilterMethod> for Filter {
    fn from(method: FilterMethod) -> Self {
        match method {
            FilterMethod::Kalman => Self::Kalman,
            FilterMethod::SquareRootCovariance => Self::SquareRootCovariance,
            FilterMethod::SquareRootInformation => Self::SquareRootInformation,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Kalman => write!(f, "KF"),
            Self::SquareRootCovariance => write!(f, "SRCF"),
            Self::SquareRootInformation => write!(f, "SRIF"),
        }
    }
}

/// Output of one measurement update, prior to committing.
pub(crate) struct Update {
    pub dx: DVector<f64>,
    pub qx: DMatrix<f64>,
}

impl Filter {
    /// Runs the measurement update.
    pub fn update(
        &self,
        a: &DMatrix<f64>,
        p: &DMatrix<f64>,
        l: &DVector<f64>,
        dx: &mut DVector<f64>,
        qx: &mut DMatrix<f64>,
    ) -> Result<(), Error> {
        let (m, n) = a.shape();

        if m == 0 || n == 0 {
            return Err(Error::MatrixMinimalDimension);
        }
        if p.shape() != (m, m) || l.len() != m || qx.shape() != (n, n) {
            return Err(Error::MatrixDimension);
        }

        let update = match self {
            Self::Kalman => kalman::update(a, p, l, qx),
            Self::SquareRootCovariance => srcf::update(a, p, l, qx),
            Self::SquareRootInformation => srif::update(a, p, l, qx),
        };

        let update = update.map_err(|e| {
            warn!("{} update failure: {}", self, e);
            e
        })?;

        if update.dx.iter().any(|dx| !dx.is_finite()) {
            return Err(Error::Divergence);
        }

        debug!("{} update (m={}, n={}): dx={}", self, m, n, update.dx.transpose());

        *dx = update.dx;
        *qx = symmetrize(update.qx);
        Ok(())
    }
}

/// Forces exact symmetry, averaging both triangles.
pub(crate) fn symmetrize(mat: DMatrix<f64>) -> DMatrix<f64> {
    let t = mat.transpose();
    (mat + t) * 0.5
}

/// Upper triangular factor U of this symmetric positive definite matrix,
/// such that mat = Uᵀ U.
pub(crate) fn upper_cholesky(mat: &DMatrix<f64>) -> Result<DMatrix<f64>, Error> {
    let chol = mat.clone().cholesky().ok_or(Error::NonPositiveDefinite)?;
    Ok(chol.l().transpose())
}

#[cfg(test)]
mod test {
    use super::{upper_cholesky, Filter};
    use crate::prelude::Error;

    use nalgebra::{DMatrix, DVector};
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use rstest::*;

    struct Problem {
        a: DMatrix<f64>,
        p: DMatrix<f64>,
        l: DVector<f64>,
        qx: DMatrix<f64>,
    }

    /// Random well conditioned problem
    fn problem(seed: u64, m: usize, n: usize) -> Problem {
        let mut rng = SmallRng::seed_from_u64(seed);

        let a = DMatrix::from_fn(m, n, |_, _| rng.random_range(-1.0..1.0));
        let b = DMatrix::from_fn(n, n, |_, _| rng.random_range(-1.0..1.0));
        let qx = &b * b.transpose() + DMatrix::identity(n, n);
        let p = DMatrix::from_diagonal(&DVector::from_fn(m, |_, _| rng.random_range(0.5..4.0)));
        let l = DVector::from_fn(m, |_, _| rng.random_range(-10.0..10.0));

        Problem { a, p, l, qx }
    }

    fn relative_error(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
        (a - b).norm() / a.norm().max(1.0E-12)
    }

    #[rstest]
    #[case(1, 8, 5)]
    #[case(2, 4, 4)]
    #[case(3, 12, 7)]
    #[case(4, 2, 6)]
    fn variants_agree(#[case] seed: u64, #[case] m: usize, #[case] n: usize) {
        let problem = problem(seed, m, n);

        let mut solutions = Vec::new();

        for filter in [
            Filter::Kalman,
            Filter::SquareRootCovariance,
            Filter::SquareRootInformation,
        ] {
            let mut dx = DVector::zeros(n);
            let mut qx = problem.qx.clone();
            filter
                .update(&problem.a, &problem.p, &problem.l, &mut dx, &mut qx)
                .unwrap_or_else(|e| panic!("{} failure: {}", filter, e));
            solutions.push((filter, dx, qx));
        }

        let (_, dx_ref, qx_ref) = &solutions[0];
        let dx_ref = DMatrix::from_column_slice(n, 1, dx_ref.as_slice());

        for (filter, dx, qx) in solutions.iter().skip(1) {
            let dx = DMatrix::from_column_slice(n, 1, dx.as_slice());
            let err = relative_error(&dx_ref, &dx);
            assert!(err < 1.0E-6, "{} dx mismatch: {:e}", filter, err);
            let err = relative_error(qx_ref, qx);
            assert!(err < 1.0E-6, "{} Qx mismatch: {:e}", filter, err);
        }
    }

    #[test]
    fn variance_reduction() {
        let problem = problem(10, 6, 4);
        let mut dx = DVector::zeros(4);
        let mut qx = problem.qx.clone();
        Filter::Kalman
            .update(&problem.a, &problem.p, &problem.l, &mut dx, &mut qx)
            .unwrap();
        for i in 0..4 {
            assert!(qx[(i, i)] < problem.qx[(i, i)]);
        }
        assert_eq!(qx, qx.transpose());
    }

    #[rstest]
    #[case(Filter::SquareRootCovariance)]
    #[case(Filter::SquareRootInformation)]
    fn non_positive_definite_prior(#[case] filter: Filter) {
        let problem = problem(20, 5, 3);

        let mut qx = problem.qx.clone();
        qx[(1, 1)] = -1.0;
        let qx0 = qx.clone();

        let mut dx = DVector::from_element(3, 42.0);

        assert_eq!(
            filter.update(&problem.a, &problem.p, &problem.l, &mut dx, &mut qx),
            Err(Error::NonPositiveDefinite)
        );

        assert_eq!(qx, qx0, "covariance must be left untouched");
        assert_eq!(dx, DVector::from_element(3, 42.0));
    }

    #[test]
    fn dimension_checks() {
        let problem = problem(30, 5, 3);
        let mut dx = DVector::zeros(3);
        let mut qx = DMatrix::identity(4, 4);
        assert_eq!(
            Filter::Kalman.update(&problem.a, &problem.p, &problem.l, &mut dx, &mut qx),
            Err(Error::MatrixDimension)
        );

        let a = DMatrix::zeros(0, 3);
        let p = DMatrix::zeros(0, 0);
        let l = DVector::zeros(0);
        let mut qx = DMatrix::identity(3, 3);
        assert_eq!(
            Filter::Kalman.update(&a, &p, &l, &mut dx, &mut qx),
            Err(Error::MatrixMinimalDimension)
        );
    }

    #[test]
    fn cholesky_factor() {
        let problem = problem(40, 1, 5);
        let u = upper_cholesky(&problem.qx).unwrap();
        assert!((u.transpose() * &u - &problem.qx).norm() < 1.0E-9);
        for i in 0..5 {
            for j in 0..i {
                assert_eq!(u[(i, j)], 0.0);
            }
        }
    }
}
