use crate::prelude::Vector3;

/// Running mean of ECEF coordinates
#[derive(Debug, Clone)]
pub struct Averager {
    pub mean: Vector3<f64>,
    pub count: u64,
}

impl Default for Averager {
    fn default() -> Self {
        Self::new()
    }
}

impl Averager {
    /// Builds new [Averager]
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: Vector3::zeros(),
        }
    }

    /// Push new value into [Averager]
    pub fn add(&mut self, x: Vector3<f64>) {
        self.count += 1;
        let k = self.count as f64;
        self.mean = x / k + self.mean * (k - 1.0) / k;
    }

    /// Reset [Averager]
    pub fn reset(&mut self) {
        self.count = 0;
        self.mean = Vector3::zeros();
    }
}
