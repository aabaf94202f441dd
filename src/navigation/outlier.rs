//! Residual based outlier detection
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::cfg::OutlierOpts;

/// Down weighting factor γ, for this normalized residual.
/// - |v| <= k0: γ = 1, observation preserved
/// - k0 < |v| <= k1: γ = (|v|/k0) (k1 - k0) / (k1 - |v|)
/// - |v| > k1: γ = 100, observation practically rejected
pub fn downweight_factor(normalized: f64, k0: f64, k1: f64) -> f64 {
    if normalized <= k0 {
        1.0
    } else if normalized <= k1 {
        (normalized / k0) * (k1 - k0) / (k1 - normalized)
    } else {
        100.0
    }
}

/// [OutlierDetector] identifies the single worst observation of a
/// measurement update, from its normalized post-fit residual, and
/// reduces its weight accordingly.
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector {
    k0: f64,
    k1: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::from(OutlierOpts::default())
    }
}

impl From<OutlierOpts> for OutlierDetector {
    fn from(opts: OutlierOpts) -> Self {
        Self {
            k0: opts.k0,
            k1: opts.k1,
        }
    }
}

impl OutlierDetector {
    /// Normalized residuals |v_i| / sqrt(Qz_ii), with v = l - A dx
    /// and Qz = A Qx Aᵀ + P⁻¹, Qx being the prior covariance.
    pub fn normalized_residuals(
        a: &DMatrix<f64>,
        qx: &DMatrix<f64>,
        dx: &DVector<f64>,
        l: &DVector<f64>,
        p: &DMatrix<f64>,
    ) -> Option<DVector<f64>> {
        let v = l - a * dx;
        let p_inv = p.clone().try_inverse()?;
        let qz = a * qx * a.transpose() + p_inv;

        let mut normalized = DVector::zeros(v.len());
        for (i, v_i) in v.iter().enumerate() {
            let var = qz[(i, i)];
            if var <= 0.0 || !var.is_finite() {
                return None;
            }
            normalized[i] = v_i.abs() / var.sqrt();
        }
        Some(normalized)
    }

    /// Runs detection. When the largest normalized residual
    /// exceeds k0, the matching diagonal weight is divided by γ and
    /// its row is returned.
    pub fn detect(
        &self,
        a: &DMatrix<f64>,
        qx: &DMatrix<f64>,
        dx: &DVector<f64>,
        l: &DVector<f64>,
        p: &mut DMatrix<f64>,
    ) -> Option<usize> {
        let normalized = match Self::normalized_residuals(a, qx, dx, l, p) {
            Some(normalized) => normalized,
            None => {
                warn!("outlier detection: singular residual covariance");
                return None;
            },
        };

        let (row, max_res) = normalized.argmax();
        let gamma = downweight_factor(max_res, self.k0, self.k1);

        if gamma > 1.0 {
            debug!(
                "outlier detection: row #{} |v|={:.3} => weight reduced by {:.3}",
                row, max_res, gamma
            );
            p[(row, row)] /= gamma;
            Some(row)
        } else {
            None
        }
    }
}
