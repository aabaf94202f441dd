use log::debug;
use nalgebra::{DMatrix, DVector};

use super::{prepare::Context, EpochProcessor};

use crate::{
    bias::{iono, tropo},
    cfg::Combination,
    constants::SPEED_OF_LIGHT_M_S,
    navigation::ParameterKind,
    prelude::{Candidate, Carrier, Epoch, Error, SV},
};

/// Identifies the observation behind one row
#[derive(Debug, Clone, Copy)]
pub(crate) struct RowId {
    /// Position in the candidates pool
    pub cd: usize,
    pub sv: SV,
    /// Observed (or reference, once combined) [Carrier]
    pub carrier: Carrier,
}

/// Linearized observation equations
pub(crate) struct Rows {
    /// Design matrix
    pub a: DMatrix<f64>,
    /// Prefit residuals: observed - computed
    pub l: DVector<f64>,
    /// Weight matrix
    pub p: DMatrix<f64>,
    /// Origin of each row
    pub layout: Vec<RowId>,
}

/// One observation prior linearization
struct Measurement {
    carrier: Carrier,
    value: f64,
    noise_factor: f64,
}

impl EpochProcessor {
    fn index(&self, kind: ParameterKind, sv: Option<SV>) -> Result<usize, Error> {
        self.params
            .get(&self.site, kind, sv)
            .ok_or(Error::UnknownParameter)
    }

    fn value_at(&self, index: usize) -> f64 {
        self.params.param(index).map(|p| p.value).unwrap_or_default()
    }

    fn measurements(&self, cd: &Candidate) -> Vec<Measurement> {
        match self.cfg.combination {
            Combination::IonoFree => cd
                .code_if_combination()
                .map(|comb| Measurement {
                    carrier: comb.reference,
                    value: comb.value,
                    noise_factor: comb.noise_factor,
                })
                .into_iter()
                .collect(),
            Combination::Raw => cd
                .code_carriers()
                .into_iter()
                .filter_map(|carrier| {
                    Some(Measurement {
                        carrier,
                        value: cd.pseudo_range(carrier)?,
                        noise_factor: 1.0,
                    })
                })
                .collect(),
        }
    }

    /// Forms the design matrix, the weight matrix and the prefit
    /// residuals at the current linearization point.
    pub(crate) fn build(&self, t: Epoch, pool: &[Candidate], ctx: &Context) -> Result<Rows, Error> {
        if !self.params.is_indexed() {
            return Err(Error::UnindexedParameters);
        }

        let n = self.params.len();
        let raw = self.cfg.combination == Combination::Raw;
        let reference = self.cfg.reference_constellation();

        let x = self.index(ParameterKind::CoordinateX, None)?;
        let y = self.index(ParameterKind::CoordinateY, None)?;
        let z = self.index(ParameterKind::CoordinateZ, None)?;
        let clk = self.index(ParameterKind::Clock, None)?;

        let zwd = if self.cfg.estimate_troposphere {
            Some(self.index(ParameterKind::TroposphereWet, None)?)
        } else {
            None
        };

        let (zhd_m, zwd_model_m) = ctx
            .atmosphere
            .map(|atm| (atm.zhd_m, atm.zwd_m))
            .unwrap_or_default();

        let rx = ctx.rx.ecef();

        let mut rows = Vec::<(Vec<(usize, f64)>, f64, f64, RowId)>::new();

        for (cd_index, cd) in pool.iter().enumerate() {
            let orbit = cd.orbit().ok_or(Error::MissingOrbit(t, cd.sv))?;

            let range = cd.range_m;
            let elev = cd.elevation_deg;
            let los = (rx - orbit.position_m) / range;

            let tropo_mapping = tropo::mapping(elev);
            let constellation = cd.sv.constellation;
            let reference_carrier = Carrier::reference(constellation);

            let isb = if Some(constellation) != reference {
                Some(self.index(ParameterKind::InterSystemBias(constellation), None)?)
            } else {
                None
            };

            let ion = if raw && self.cfg.estimate_ionosphere {
                Some(self.index(ParameterKind::Ionosphere, Some(cd.sv))?)
            } else {
                None
            };

            for meas in self.measurements(cd) {
                let mut partials = vec![(x, los[0]), (y, los[1]), (z, los[2]), (clk, 1.0)];

                let mut computed = range + self.value_at(clk)
                    - orbit.clock_offset_s * SPEED_OF_LIGHT_M_S
                    + tropo::slant_hydrostatic_m(zhd_m, elev)
                    + tropo_mapping * zwd_model_m;

                if let Some(zwd) = zwd {
                    partials.push((zwd, tropo_mapping));
                    computed += tropo_mapping * self.value_at(zwd);
                }

                if let Some(isb) = isb {
                    partials.push((isb, 1.0));
                    computed += self.value_at(isb);
                }

                if raw && meas.carrier != reference_carrier {
                    let ifb =
                        self.index(ParameterKind::InterFrequencyBias(constellation, meas.carrier), None)?;
                    partials.push((ifb, 1.0));
                    computed += self.value_at(ifb);
                }

                if raw {
                    match ion {
                        Some(ion) => {
                            let scaling = meas.carrier.iono_scaling(reference_carrier);
                            partials.push((ion, scaling));
                            computed += scaling * self.value_at(ion);
                        },
                        None => {
                            if let Some(atm) = ctx.atmosphere {
                                computed += atm.vertical_iono_m
                                    * iono::mapping(elev)
                                    * meas.carrier.iono_scaling(Carrier::L1);
                            }
                        },
                    }
                }

                let sigma = self.cfg.weighting.sigma_m(elev) * meas.noise_factor;
                let weight = self.cfg.weighting.weight(elev) / meas.noise_factor.powi(2);
                let residual = meas.value - computed;

                debug!(
                    "{} ({}) - {} prefit residual: {:.3}m (sigma={:.3}m)",
                    t, cd.sv, meas.carrier, residual, sigma
                );

                rows.push((
                    partials,
                    residual,
                    weight,
                    RowId {
                        cd: cd_index,
                        sv: cd.sv,
                        carrier: meas.carrier,
                    },
                ));
            }
        }

        let m = rows.len();
        if m == 0 {
            return Err(Error::MatrixMinimalDimension);
        }

        let mut a = DMatrix::<f64>::zeros(m, n);
        let mut l = DVector::<f64>::zeros(m);
        let mut p = DMatrix::<f64>::zeros(m, m);
        let mut layout = Vec::with_capacity(m);

        for (i, (partials, residual, weight, id)) in rows.into_iter().enumerate() {
            for (index, partial) in partials {
                a[(i, index - 1)] = partial;
            }
            l[i] = residual;
            p[(i, i)] = weight;
            layout.push(id);
        }

        Ok(Rows { a, l, p, layout })
    }
}
