use itertools::Itertools;
use log::debug;

use super::{initial_variance, prepare::Context, EpochProcessor};

use crate::{
    bias::iono,
    cfg::Combination,
    navigation::{Parameter, ParameterClass, ParameterKind},
    prelude::{Candidate, Carrier, Epoch, Error, SV},
};

/// Parameters introduced and withdrawn with visibility
fn is_dynamic(kind: ParameterKind) -> bool {
    matches!(
        kind.class(),
        ParameterClass::Ionosphere
            | ParameterClass::InterSystemBias
            | ParameterClass::InterFrequencyBias
    )
}

impl EpochProcessor {
    /// Parameters this epoch's [Candidate]s call for.
    fn required_parameters(&self, pool: &[Candidate]) -> Vec<(ParameterKind, Option<SV>)> {
        let reference = self.cfg.reference_constellation();
        let raw = self.cfg.combination == Combination::Raw;

        let mut required = Vec::new();

        for cd in pool.iter() {
            let constellation = cd.sv.constellation;

            if Some(constellation) != reference {
                required.push((ParameterKind::InterSystemBias(constellation), None));
            }

            if raw {
                let reference = Carrier::reference(constellation);
                for carrier in cd.code_carriers() {
                    if carrier != reference {
                        required.push((
                            ParameterKind::InterFrequencyBias(constellation, carrier),
                            None,
                        ));
                    }
                }
                if self.cfg.estimate_ionosphere {
                    required.push((ParameterKind::Ionosphere, Some(cd.sv)));
                }
            }
        }

        required.into_iter().unique().collect()
    }

    /// A-priori value of a new parameter
    fn apriori_value(
        &self,
        kind: ParameterKind,
        sv: Option<SV>,
        pool: &[Candidate],
        ctx: &Context,
    ) -> f64 {
        match (kind, sv, ctx.atmosphere) {
            (ParameterKind::Ionosphere, Some(sv), Some(atmosphere)) => pool
                .iter()
                .find(|cd| cd.sv == sv)
                .map(|cd| {
                    let reference = Carrier::reference(cd.sv.constellation);
                    atmosphere.vertical_iono_m
                        * iono::mapping(cd.elevation_deg)
                        * reference.iono_scaling(Carrier::L1)
                })
                .unwrap_or_default(),
            _ => 0.0,
        }
    }

    /// Synchronizes the parameter set with current visibility,
    /// then propagates the covariance with the process noise.
    pub(crate) fn predict(
        &mut self,
        t: Epoch,
        pool: &[Candidate],
        ctx: &Context,
    ) -> Result<(), Error> {
        let required = self.required_parameters(pool);

        let obsolete = self
            .params
            .select_descending(|p| is_dynamic(p.kind) && !required.contains(&(p.kind, p.sv)));

        for index in obsolete {
            let param = self.params.remove(index)?;
            self.cov.remove(index)?;
            debug!("{} ({}) - {} no longer in view", t, self.site, param);
        }

        let nb_kept = self.params.len();

        for (kind, sv) in required {
            if self.params.get(&self.site, kind, sv).is_none() {
                let apriori = self.apriori_value(kind, sv, pool, ctx);
                self.params
                    .add(Parameter::new(kind, &self.site, sv, apriori));
                self.cov.grow(initial_variance(&self.cfg, kind.class()));
            }
        }

        self.params.reindex();

        if self.params.len() != self.cov.dim() {
            return Err(Error::MatrixDimension);
        }

        for model in self.models.values_mut() {
            model.update_time(t);
        }

        // new parameters keep their initial variance
        for index in 1..=nb_kept {
            let class = self
                .params
                .param(index)
                .map(|p| p.kind.class())
                .ok_or(Error::UnindexedParameters)?;

            let model = match self.models.get(&class) {
                Some(model) => model,
                None => continue,
            };

            let q = model.q();

            if model.is_white_noise() {
                self.cov.reset(index, q)?;
            } else if q > 0.0 {
                self.cov.inject(index, q)?;
            }
        }

        debug!(
            "{} ({}) - {} parameters ({} new)",
            t,
            self.site,
            self.params.len(),
            self.params.len() - nb_kept
        );

        Ok(())
    }
}
