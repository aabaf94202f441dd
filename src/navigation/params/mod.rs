//! Dynamic parameter registry
use log::debug;
use nalgebra::DVector;

use crate::prelude::{Error, SV};

mod covariance;
mod parameter;

pub use covariance::Covariance;
pub use parameter::{Parameter, ParameterClass, ParameterKind};

/// Ordered registry of the estimated [Parameter]s. Entries are
/// identified by their 1-based index, which matches their row/column
/// in the [Covariance] once [ParameterSet::reindex] has been called.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Appends a new [Parameter] and returns its 1-based index.
    /// The [Covariance] must grow in lockstep.
    pub fn add(&mut self, mut param: Parameter) -> usize {
        param.index = self.params.len() + 1;
        debug!("new parameter {}", param);
        self.params.push(param);
        self.params.len()
    }

    /// Removes the [Parameter] at this 1-based position. Following
    /// entries are left with stale indexes until [Self::reindex].
    /// The matching [Covariance] row and column must be deleted as well.
    pub fn remove(&mut self, index: usize) -> Result<Parameter, Error> {
        if index == 0 || index > self.params.len() {
            return Err(Error::UnknownParameter);
        }
        let param = self.params.remove(index - 1);
        debug!("removed parameter {}", param);
        Ok(param)
    }

    /// Returns the 1-based index of the [Parameter] matching this key.
    pub fn get(&self, site: &str, kind: ParameterKind, sv: Option<SV>) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.matches(site, kind, sv))
            .map(|pos| pos + 1)
    }

    /// Renumbers all entries contiguously, 1..=N.
    pub fn reindex(&mut self) {
        for (pos, param) in self.params.iter_mut().enumerate() {
            param.index = pos + 1;
        }
    }

    /// True when all indexes match their position.
    pub fn is_indexed(&self) -> bool {
        self.params
            .iter()
            .enumerate()
            .all(|(pos, p)| p.index == pos + 1)
    }

    /// [Parameter] at this 1-based position
    pub fn param(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index.checked_sub(1)?)
    }

    pub(crate) fn param_mut(&mut self, index: usize) -> Option<&mut Parameter> {
        self.params.get_mut(index.checked_sub(1)?)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// Current values, as state vector
    pub fn values(&self) -> DVector<f64> {
        DVector::from_iterator(self.params.len(), self.params.iter().map(|p| p.value))
    }

    /// Applies this correction to each value.
    pub(crate) fn apply_correction(&mut self, dx: &DVector<f64>) -> Result<(), Error> {
        if dx.len() != self.params.len() {
            return Err(Error::MatrixDimension);
        }
        for (param, dx) in self.params.iter_mut().zip(dx.iter()) {
            param.value += dx;
        }
        Ok(())
    }

    /// 1-based indexes of parameters matching this predicate, in descending
    /// order, so they may be removed one after the other.
    pub(crate) fn select_descending<F: Fn(&Parameter) -> bool>(&self, predicate: F) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(pos, p)| if predicate(p) { Some(pos + 1) } else { None })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{Covariance, Parameter, ParameterKind, ParameterSet};
    use crate::prelude::{Constellation, SV};

    fn set_of(n_sv: u8) -> (ParameterSet, Covariance) {
        let mut params = ParameterSet::default();
        let mut cov = Covariance::default();
        for kind in [
            ParameterKind::CoordinateX,
            ParameterKind::CoordinateY,
            ParameterKind::CoordinateZ,
            ParameterKind::Clock,
        ] {
            params.add(Parameter::new(kind, "SITE", None, 0.0));
            cov.grow(1.0E6);
        }
        for prn in 1..=n_sv {
            let sv = SV::new(Constellation::GPS, prn);
            params.add(Parameter::new(ParameterKind::Ionosphere, "SITE", Some(sv), prn as f64));
            cov.grow(100.0);
        }
        (params, cov)
    }

    #[test]
    fn lookup() {
        let (params, _) = set_of(3);
        assert_eq!(params.get("SITE", ParameterKind::Clock, None), Some(4));
        let g02 = SV::new(Constellation::GPS, 2);
        assert_eq!(
            params.get("SITE", ParameterKind::Ionosphere, Some(g02)),
            Some(6)
        );
        assert_eq!(params.get("OTHR", ParameterKind::Clock, None), None);
        assert_eq!(params.get("SITE", ParameterKind::TroposphereWet, None), None);
        assert_eq!(params.param(6).map(|p| p.value), Some(2.0));
        assert!(params.param(0).is_none());
    }

    #[test]
    fn reindexing_is_contiguous() {
        let (mut params, mut cov) = set_of(6);
        assert!(params.is_indexed());

        let g02 = SV::new(Constellation::GPS, 2);
        let g05 = SV::new(Constellation::GPS, 5);
        let targets = params.select_descending(|p| p.sv == Some(g02) || p.sv == Some(g05));
        assert_eq!(targets, vec![9, 6]);

        for index in targets {
            params.remove(index).unwrap();
            cov.remove(index).unwrap();
        }
        assert!(!params.is_indexed());

        params.add(Parameter::new(
            ParameterKind::InterSystemBias(Constellation::Galileo),
            "SITE",
            None,
            0.0,
        ));
        cov.grow(1.0E6);

        params.reindex();
        assert!(params.is_indexed());
        assert_eq!(params.len(), 9);
        assert_eq!(cov.dim(), params.len());
        for (pos, param) in params.iter().enumerate() {
            assert_eq!(param.index(), pos + 1);
        }

        // untouched values
        let values = params.values();
        assert_eq!(values[4], 1.0);
        assert_eq!(values[5], 3.0);
        assert_eq!(values[6], 4.0);
        assert_eq!(values[7], 6.0);
    }

    #[test]
    fn invalid_removal() {
        let (mut params, _) = set_of(0);
        assert!(params.remove(0).is_err());
        assert!(params.remove(5).is_err());
        assert!(params.remove(4).is_ok());
        assert_eq!(params.len(), 3);
    }
}
