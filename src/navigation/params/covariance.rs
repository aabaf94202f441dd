use nalgebra::DMatrix;

use crate::prelude::Error;

/// Symmetric state covariance, resized in lockstep with the
/// [super::ParameterSet]. Row and column splicing preserves
/// every other entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    mat: DMatrix<f64>,
}

impl Default for Covariance {
    fn default() -> Self {
        Self {
            mat: DMatrix::zeros(0, 0),
        }
    }
}

impl Covariance {
    /// Builds diagonal [Covariance] from these variances.
    pub fn from_diagonal(variances: &[f64]) -> Self {
        let n = variances.len();
        Self {
            mat: DMatrix::from_fn(n, n, |i, j| if i == j { variances[i] } else { 0.0 }),
        }
    }

    /// Dimension
    pub fn dim(&self) -> usize {
        self.mat.nrows()
    }

    /// Read access
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.mat
    }

    /// Write access, dimension must be preserved.
    pub(crate) fn matrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.mat
    }

    /// Appends a new row and column: off diagonal terms are null,
    /// diagonal term is this initial variance.
    pub fn grow(&mut self, variance: f64) {
        let n = self.dim();
        let mat = std::mem::replace(&mut self.mat, DMatrix::zeros(0, 0));
        let mut mat = mat.insert_row(n, 0.0).insert_column(n, 0.0);
        mat[(n, n)] = variance;
        self.mat = mat;
    }

    /// Converts this 1-based index to a matrix offset.
    fn offset(&self, index: usize) -> Result<usize, Error> {
        if index == 0 || index > self.dim() {
            Err(Error::UnknownParameter)
        } else {
            Ok(index - 1)
        }
    }

    /// Deletes row and column of this 1-based index.
    pub fn remove(&mut self, index: usize) -> Result<(), Error> {
        let i = self.offset(index)?;
        let mat = std::mem::replace(&mut self.mat, DMatrix::zeros(0, 0));
        self.mat = mat.remove_row(i).remove_column(i);
        Ok(())
    }

    /// Adds process noise to the diagonal term of this 1-based index.
    pub fn inject(&mut self, index: usize, q: f64) -> Result<(), Error> {
        let i = self.offset(index)?;
        self.mat[(i, i)] += q;
        Ok(())
    }

    /// Re-initializes this 1-based index: correlations are cancelled
    /// and the diagonal term is set to this variance.
    pub fn reset(&mut self, index: usize, variance: f64) -> Result<(), Error> {
        let i = self.offset(index)?;
        self.mat.row_mut(i).fill(0.0);
        self.mat.column_mut(i).fill(0.0);
        self.mat[(i, i)] = variance;
        Ok(())
    }

    /// Forces exact symmetry, averaging both triangles.
    pub fn symmetrize(&mut self) {
        let t = self.mat.transpose();
        self.mat = (&self.mat + t) * 0.5;
    }

    /// True when a Cholesky factorization exists.
    pub fn is_positive_definite(&self) -> bool {
        self.dim() > 0 && self.mat.clone().cholesky().is_some()
    }
}
