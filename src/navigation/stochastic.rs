//! Stochastic process models
use nalgebra::DMatrix;

use crate::{constants::SECONDS_PER_HOUR, prelude::Epoch};

/// [StochasticModel] generates the process noise variance of one
/// parameter class, for the time elapsed since its previous update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StochasticModel {
    /// Continuous random walk, discretized by elapsed time.
    RandomWalk {
        /// Spectral density (mm/√h)
        sigma_mm_sqrt_h: f64,
        /// Previous [Epoch]
        previous: Option<Epoch>,
        /// Current [Epoch]
        current: Option<Epoch>,
    },
    /// Uncorrelated from one epoch to the next:
    /// the parameter is re-initialized with this variance (m²).
    WhiteNoise { variance_m2: f64 },
}

impl StochasticModel {
    /// Builds new random walk from its spectral density (mm/√h).
    pub fn random_walk(sigma_mm_sqrt_h: f64) -> Self {
        Self::RandomWalk {
            sigma_mm_sqrt_h,
            previous: None,
            current: None,
        }
    }

    /// Builds new white noise, of said variance (m²).
    pub fn white_noise(variance_m2: f64) -> Self {
        Self::WhiteNoise { variance_m2 }
    }

    /// True for [StochasticModel::WhiteNoise]
    pub fn is_white_noise(&self) -> bool {
        matches!(self, Self::WhiteNoise { .. })
    }

    /// Shifts the time frame: previous ← current, current ← t.
    pub fn update_time(&mut self, t: Epoch) {
        if let Self::RandomWalk {
            previous, current, ..
        } = self
        {
            *previous = *current;
            *current = Some(t);
        }
    }

    /// Elapsed time (s) between previous and current [Epoch].
    /// Null until two epochs have been presented.
    pub fn elapsed_s(&self) -> f64 {
        match self {
            Self::RandomWalk {
                previous: Some(previous),
                current: Some(current),
                ..
            } => (*current - *previous).to_seconds(),
            _ => 0.0,
        }
    }

    /// Process noise variance (m²)
    pub fn q(&self) -> f64 {
        match self {
            Self::RandomWalk {
                sigma_mm_sqrt_h, ..
            } => {
                let diffusion = (sigma_mm_sqrt_h * 1.0E-3).powi(2) / SECONDS_PER_HOUR;
                TransitionModel::new(1, diffusion).noise(self.elapsed_s())[(0, 0)]
            },
            Self::WhiteNoise { variance_m2 } => *variance_m2,
        }
    }
}

/// Generalized (n-th order) state transition model: the n-th derivative
/// of the parameter is driven by a continuous white noise of
/// `diffusion` spectral density. Order 1 is the random walk,
/// order 2 the integrated random walk (value + rate), etc..
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionModel {
    /// Number of states (value and its successive derivatives)
    pub order: usize,
    /// Diffusion coefficient (spectral density of the driving noise)
    pub diffusion: f64,
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

impl TransitionModel {
    pub fn new(order: usize, diffusion: f64) -> Self {
        Self { order, diffusion }
    }

    /// Transition matrix Φ(dt): Φ[i][j] = dt^(j-i) / (j-i)! for j >= i.
    pub fn transition(&self, dt_s: f64) -> DMatrix<f64> {
        let n = self.order;
        DMatrix::from_fn(n, n, |i, j| {
            if j >= i {
                dt_s.powi((j - i) as i32) / factorial(j - i)
            } else {
                0.0
            }
        })
    }

    /// Discrete process noise covariance Q(dt), integrated
    /// from the continuous white noise driving the highest derivative:
    /// Q[i][j] = q dt^(2n-1-i-j) / ((n-1-i)! (n-1-j)! (2n-1-i-j))
    pub fn noise(&self, dt_s: f64) -> DMatrix<f64> {
        let n = self.order;
        let dt = dt_s.abs();
        DMatrix::from_fn(n, n, |i, j| {
            let p = 2 * n - 1 - i - j;
            self.diffusion * dt.powi(p as i32)
                / (factorial(n - 1 - i) * factorial(n - 1 - j) * p as f64)
        })
    }
}

#[cfg(test)]
mod test {
    use super::{StochasticModel, TransitionModel};
    use crate::prelude::{Duration, Epoch};
    use rstest::*;

    #[rstest]
    #[case(30.0)]
    #[case(300.0)]
    #[case(3600.0)]
    fn random_walk_is_linear(#[case] dt_s: f64) {
        let t0 = Epoch::from_gpst_seconds(1.0E9);
        let mut rw = StochasticModel::random_walk(10.0);

        assert_eq!(rw.q(), 0.0, "q is null prior two epochs");

        rw.update_time(t0);
        assert_eq!(rw.q(), 0.0, "q is null prior two epochs");

        rw.update_time(t0 + Duration::from_seconds(dt_s));

        let expected = (10.0E-3_f64).powi(2) / 3600.0 * dt_s;
        assert!((rw.q() - expected).abs() < 1.0E-15);

        let mut rw2 = StochasticModel::random_walk(10.0);
        rw2.update_time(t0);
        rw2.update_time(t0 + Duration::from_seconds(2.0 * dt_s));
        assert!((rw2.q() - 2.0 * rw.q()).abs() < 1.0E-15);
    }

    #[test]
    fn random_walk_null_interval() {
        let t0 = Epoch::from_gpst_seconds(1.0E9);
        let mut rw = StochasticModel::random_walk(25.0);
        rw.update_time(t0);
        rw.update_time(t0);
        assert_eq!(rw.q(), 0.0);
    }

    #[test]
    fn white_noise_is_time_independent() {
        let mut wn = StochasticModel::white_noise(9.0E8);
        let t0 = Epoch::from_gpst_seconds(1.0E9);
        assert_eq!(wn.q(), 9.0E8);
        wn.update_time(t0);
        wn.update_time(t0 + Duration::from_seconds(3600.0));
        assert_eq!(wn.q(), 9.0E8);
        assert!(wn.is_white_noise());
    }

    #[test]
    fn transition_first_order_is_random_walk() {
        let model = TransitionModel::new(1, 2.0);
        assert_eq!(model.transition(10.0)[(0, 0)], 1.0);
        assert_eq!(model.noise(10.0)[(0, 0)], 20.0);
    }

    #[test]
    fn transition_integrated_random_walk() {
        let model = TransitionModel::new(2, 1.0);
        let phi = model.transition(2.0);
        assert_eq!(phi[(0, 0)], 1.0);
        assert_eq!(phi[(0, 1)], 2.0);
        assert_eq!(phi[(1, 0)], 0.0);
        assert_eq!(phi[(1, 1)], 1.0);

        let q = model.noise(2.0);
        assert!((q[(0, 0)] - 8.0 / 3.0).abs() < 1.0E-12);
        assert!((q[(0, 1)] - 2.0).abs() < 1.0E-12);
        assert!((q[(1, 0)] - 2.0).abs() < 1.0E-12);
        assert!((q[(1, 1)] - 2.0).abs() < 1.0E-12);

        let phi3 = TransitionModel::new(3, 1.0).transition(2.0);
        assert!((phi3[(0, 2)] - 2.0).abs() < 1.0E-12);
    }
}
