//! Per site epoch processor
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use log::{debug, error, info, warn};
use nalgebra::{DMatrix, DVector};

use crate::{
    averager::Averager,
    bias::{AtmosphereModel, BiasSource, TideModel},
    cfg::Positioning,
    navigation::{
        Covariance, DilutionOfPrecision, Filter, OutlierDetector, Parameter, ParameterClass,
        ParameterKind, ParameterSet, StochasticModel,
    },
    observation::ObservationSource,
    orbit::OrbitSource,
    position::Position,
    prelude::{Candidate, Config, Epoch, Error, Vector3, SV},
    products::{Product, ProductStore},
};

mod batch;
mod build;
mod predict;
mod prepare;

pub use batch::{process_sites, BatchReport};

use build::Rows;
use prepare::Context;

/// External collaborators consulted by the [EpochProcessor].
/// Only observations and orbits are mandatory.
#[derive(Clone)]
pub struct Sources {
    /// [ObservationSource]
    pub observations: Arc<dyn ObservationSource + Send + Sync>,
    /// [OrbitSource]
    pub orbits: Arc<dyn OrbitSource + Send + Sync>,
    /// Code biases
    pub biases: Option<Arc<dyn BiasSource + Send + Sync>>,
    /// A-priori atmosphere
    pub atmosphere: Option<Arc<dyn AtmosphereModel + Send + Sync>>,
    /// Site displacement
    pub tides: Option<Arc<dyn TideModel + Send + Sync>>,
}

impl Sources {
    pub fn new(
        observations: Arc<dyn ObservationSource + Send + Sync>,
        orbits: Arc<dyn OrbitSource + Send + Sync>,
    ) -> Self {
        Self {
            observations,
            orbits,
            biases: None,
            atmosphere: None,
            tides: None,
        }
    }

    /// Copies and returns [Sources] with [BiasSource]
    pub fn with_biases(&self, biases: Arc<dyn BiasSource + Send + Sync>) -> Self {
        let mut s = self.clone();
        s.biases = Some(biases);
        s
    }

    /// Copies and returns [Sources] with [AtmosphereModel]
    pub fn with_atmosphere(&self, atmosphere: Arc<dyn AtmosphereModel + Send + Sync>) -> Self {
        let mut s = self.clone();
        s.atmosphere = Some(atmosphere);
        s
    }

    /// Copies and returns [Sources] with [TideModel]
    pub fn with_tides(&self, tides: Arc<dyn TideModel + Send + Sync>) -> Self {
        let mut s = self.clone();
        s.tides = Some(tides);
        s
    }
}

/// Committed [EpochSolution]
#[derive(Debug, Clone)]
pub struct EpochSolution {
    /// [Epoch] of this solution
    pub epoch: Epoch,
    /// ECEF coordinates (m)
    pub position_ecef_m: Vector3<f64>,
    /// Receiver clock offset (m), in the reference timescale
    pub clock_offset_m: f64,
    /// Total zenith wet delay (m), when estimated
    pub zwd_m: Option<f64>,
    /// [DilutionOfPrecision]
    pub dop: DilutionOfPrecision,
    /// Number of update/detection iterations
    pub iterations: usize,
    /// Satellites whose observations were all rejected
    pub rejected: Vec<SV>,
    /// [Candidate]s that contributed, with their post-fit residuals
    pub candidates: Vec<Candidate>,
}

impl EpochSolution {
    /// Satellites that contributed
    pub fn sv(&self) -> Vec<SV> {
        self.candidates
            .iter()
            .map(|cd| cd.sv)
            .filter(|sv| !self.rejected.contains(sv))
            .collect()
    }
}

/// Restored on epoch failure
struct Snapshot {
    params: ParameterSet,
    cov: Covariance,
    models: HashMap<ParameterClass, StochasticModel>,
    initialized: bool,
}

/// Accepted measurement update
struct Estimate {
    dx: DVector<f64>,
    qx: DMatrix<f64>,
    /// Weight matrix the accepted update was obtained with
    p: DMatrix<f64>,
    iterations: usize,
}

/// [EpochProcessor] owns the state of one site and processes its
/// epochs one after the other. Each epoch either commits or fails with
/// the state fully restored.
pub struct EpochProcessor {
    /// Site name
    site: String,
    /// [Config]
    cfg: Config,
    /// [Filter]
    filter: Filter,
    /// [OutlierDetector]
    outlier: OutlierDetector,
    /// [Sources]
    sources: Sources,
    /// Shared [ProductStore]
    products: Arc<ProductStore>,
    /// Estimated [ParameterSet]
    params: ParameterSet,
    /// Its [Covariance]
    cov: Covariance,
    /// One [StochasticModel] per dynamic class
    models: HashMap<ParameterClass, StochasticModel>,
    /// True once a valid linearization point exists
    initialized: bool,
    /// Committed coordinates
    coordinates: BTreeMap<Epoch, Vector3<f64>>,
}

impl EpochProcessor {
    /// Deploys new [EpochProcessor] for this site.
    /// ## Input
    /// - site: site name
    /// - cfg: [Config], verified here
    /// - apriori: a-priori [Position]. When not provided, the first
    ///   epoch is initialized with a direct (Bancroft) solution.
    /// - sources: [Sources] of information
    /// - products: [ProductStore] where solutions are pushed
    pub fn new(
        site: &str,
        cfg: Config,
        apriori: Option<Position>,
        sources: Sources,
        products: Arc<ProductStore>,
    ) -> Result<Self, Error> {
        cfg.validate()?;

        let mut params = ParameterSet::default();
        let mut cov = Covariance::default();

        let ecef = apriori.map(|pos| pos.ecef()).unwrap_or_default();

        for (kind, value) in [
            (ParameterKind::CoordinateX, ecef[0]),
            (ParameterKind::CoordinateY, ecef[1]),
            (ParameterKind::CoordinateZ, ecef[2]),
            (ParameterKind::Clock, 0.0),
        ] {
            params.add(Parameter::new(kind, site, None, value));
            cov.grow(initial_variance(&cfg, kind.class()));
        }

        if cfg.estimate_troposphere {
            params.add(Parameter::new(ParameterKind::TroposphereWet, site, None, 0.0));
            cov.grow(cfg.initial.troposphere_m2);
        }

        let noise = &cfg.noise;

        let coordinates = match cfg.positioning {
            Positioning::Static => StochasticModel::random_walk(noise.coordinates_mm_sqrt_h),
            Positioning::Kinematic => StochasticModel::white_noise(noise.kinematic_coordinates_m2),
        };

        let models = HashMap::from([
            (ParameterClass::Coordinates, coordinates),
            (ParameterClass::Clock, StochasticModel::white_noise(noise.clock_m2)),
            (
                ParameterClass::Troposphere,
                StochasticModel::random_walk(noise.troposphere_mm_sqrt_h),
            ),
            (
                ParameterClass::Ionosphere,
                StochasticModel::random_walk(noise.ionosphere_mm_sqrt_h),
            ),
            (
                ParameterClass::InterSystemBias,
                StochasticModel::random_walk(noise.isb_mm_sqrt_h),
            ),
            (
                ParameterClass::InterFrequencyBias,
                StochasticModel::random_walk(noise.ifb_mm_sqrt_h),
            ),
        ]);

        match apriori {
            Some(apriori) => {
                let geo = apriori.geodetic();
                info!(
                    "{} - {} processor deployed: apriori lat={:.6}°, lon={:.6}°",
                    site,
                    cfg.filter,
                    geo[0].to_degrees(),
                    geo[1].to_degrees()
                );
            },
            None => {
                info!("{} - {} processor deployed without apriori", site, cfg.filter);
            },
        }

        Ok(Self {
            params,
            cov,
            models,
            sources,
            products,
            filter: Filter::from(cfg.filter),
            outlier: OutlierDetector::from(cfg.outlier),
            initialized: apriori.is_some(),
            coordinates: BTreeMap::new(),
            site: site.to_string(),
            cfg,
        })
    }

    /// Site name
    pub fn site(&self) -> &str {
        &self.site
    }

    /// [Config] in use
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Current [ParameterSet]
    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Current [Covariance]
    pub fn covariance(&self) -> &Covariance {
        &self.cov
    }

    /// Coordinates (m) at this [Epoch]: the committed value when it exists,
    /// the average of the nearest committed neighbors otherwise,
    /// null when nothing has been committed yet.
    pub fn get_crd(&self, t: Epoch) -> Vector3<f64> {
        if let Some(crd) = self.coordinates.get(&t) {
            return *crd;
        }

        let mut averager = Averager::new();

        if let Some((_, before)) = self.coordinates.range(..t).next_back() {
            averager.add(*before);
        }
        if let Some((_, after)) = self.coordinates.range(t..).next() {
            averager.add(*after);
        }

        averager.mean
    }

    /// Processes the epoch sampled at `t`. On failure, the
    /// state is restored to what it was prior this call.
    pub fn process_epoch(&mut self, t: Epoch) -> Result<EpochSolution, Error> {
        let snapshot = self.snapshot();
        match self.run_epoch(t) {
            Ok(solution) => Ok(solution),
            Err(e) => {
                error!("{} ({}) - epoch aborted: {}", t, self.site, e);
                self.restore(snapshot);
                Err(e)
            },
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            params: self.params.clone(),
            cov: self.cov.clone(),
            models: self.models.clone(),
            initialized: self.initialized,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.params = snapshot.params;
        self.cov = snapshot.cov;
        self.models = snapshot.models;
        self.initialized = snapshot.initialized;
    }

    fn run_epoch(&mut self, t: Epoch) -> Result<EpochSolution, Error> {
        let (pool, ctx) = self.prepare(t)?;
        self.predict(t, &pool, &ctx)?;
        let rows = self.build(t, &pool, &ctx)?;
        let estimate = self.estimate(t, &rows)?;
        self.commit(t, pool, &ctx, &rows, estimate)
    }

    /// Update and outlier detection loop. Each iteration restarts
    /// from the predicted covariance, with the reduced weights.
    fn estimate(&self, t: Epoch, rows: &Rows) -> Result<Estimate, Error> {
        let qx_prior = self.cov.matrix();
        let n = qx_prior.nrows();
        let max_iterations = self.cfg.outlier.max_iterations;

        let mut p = rows.p.clone();
        let mut iterations = 0;

        loop {
            iterations += 1;

            let mut dx = DVector::zeros(n);
            let mut qx = qx_prior.clone();

            self.filter.update(&rows.a, &p, &rows.l, &mut dx, &mut qx)?;

            let weights = p.clone();

            match self.outlier.detect(&rows.a, qx_prior, &dx, &rows.l, &mut p) {
                None => {
                    return Ok(Estimate {
                        dx,
                        qx,
                        iterations,
                        p: weights,
                    });
                },
                Some(row) => {
                    let id = &rows.layout[row];
                    debug!(
                        "{} ({}) - iteration #{}: {} ({}) downweighted",
                        t, self.site, iterations, id.sv, id.carrier
                    );
                    if iterations >= max_iterations {
                        warn!(
                            "{} ({}) - outlier rejection did not converge within {} iterations",
                            t, self.site, max_iterations
                        );
                        return Ok(Estimate {
                            dx,
                            qx,
                            iterations,
                            p: weights,
                        });
                    }
                },
            }
        }
    }

    fn value(&self, kind: ParameterKind) -> Result<f64, Error> {
        let index = self
            .params
            .get(&self.site, kind, None)
            .ok_or(Error::UnknownParameter)?;
        self.params
            .param(index)
            .map(|p| p.value)
            .ok_or(Error::UnknownParameter)
    }

    fn set_value(&mut self, kind: ParameterKind, value: f64) -> Result<(), Error> {
        let index = self
            .params
            .get(&self.site, kind, None)
            .ok_or(Error::UnknownParameter)?;
        let param = self
            .params
            .param_mut(index)
            .ok_or(Error::UnknownParameter)?;
        param.value = value;
        Ok(())
    }

    /// Current coordinates estimate (m)
    fn coordinates(&self) -> Result<Vector3<f64>, Error> {
        Ok(Vector3::new(
            self.value(ParameterKind::CoordinateX)?,
            self.value(ParameterKind::CoordinateY)?,
            self.value(ParameterKind::CoordinateZ)?,
        ))
    }

    fn commit(
        &mut self,
        t: Epoch,
        mut pool: Vec<Candidate>,
        ctx: &Context,
        rows: &Rows,
        estimate: Estimate,
    ) -> Result<EpochSolution, Error> {
        // satellites that lost all their rows
        let mut rejected = Vec::<SV>::new();
        for (index, cd) in pool.iter().enumerate() {
            let all_rejected = rows
                .layout
                .iter()
                .enumerate()
                .filter(|(_, id)| id.cd == index)
                .all(|(row, _)| estimate.p[(row, row)] <= rows.p[(row, row)] / 100.0);
            if all_rejected {
                debug!("{} ({}) - rejected", t, cd.sv);
                rejected.push(cd.sv);
            }
        }

        if pool.len() - rejected.len() < self.cfg.min_sv {
            return Err(Error::NotEnoughPostFitCandidates);
        }

        if estimate.qx.clone().cholesky().is_none() {
            warn!("{} ({}) - updated covariance is not positive definite", t, self.site);
            return Err(Error::NonPositiveDefinite);
        }

        self.params.apply_correction(&estimate.dx)?;
        *self.cov.matrix_mut() = estimate.qx;

        let residuals = &rows.l - &rows.a * &estimate.dx;
        for (row, id) in rows.layout.iter().enumerate() {
            pool[id.cd].residuals.push((id.carrier, residuals[row]));
        }

        let position_ecef_m = self.coordinates()?;
        let clock_offset_m = self.value(ParameterKind::Clock)?;

        let zwd_m = if self.cfg.estimate_troposphere {
            let model = ctx.atmosphere.map(|atm| atm.zwd_m).unwrap_or_default();
            Some(model + self.value(ParameterKind::TroposphereWet)?)
        } else {
            None
        };

        let position = Position::from_ecef(position_ecef_m);
        let geo = position.geodetic();

        let used = pool
            .iter()
            .filter(|cd| !rejected.contains(&cd.sv))
            .filter_map(|cd| cd.orbit().map(|orbit| (orbit.position_m, cd.range_m)))
            .collect::<Vec<_>>();

        let g = DMatrix::from_fn(used.len(), 4, |i, j| {
            let (sv_position, range) = used[i];
            if j < 3 {
                (ctx.rx.ecef()[j] - sv_position[j]) / range
            } else {
                1.0
            }
        });

        let dop = DilutionOfPrecision::from_geometry(&g, geo[0], geo[1]).unwrap_or_else(|e| {
            warn!("{} ({}) - dop: {}", t, self.site, e);
            DilutionOfPrecision::default()
        });

        self.coordinates.insert(t, position_ecef_m);

        let products = Arc::clone(&self.products);
        products.add(&self.site, t, Product::Coordinates(position_ecef_m));
        products.add(&self.site, t, Product::ClockOffset(clock_offset_m));
        products.add(&self.site, t, Product::Dop(dop));
        if let Some(zwd_m) = zwd_m {
            products.add(&self.site, t, Product::ZenithWetDelay(zwd_m));
        }

        info!(
            "{} ({}) - solution: ({:.3}, {:.3}, {:.3})m clock={:.3}m gdop={:.2} ({} iterations)",
            t,
            self.site,
            position_ecef_m[0],
            position_ecef_m[1],
            position_ecef_m[2],
            clock_offset_m,
            dop.gdop,
            estimate.iterations,
        );

        Ok(EpochSolution {
            epoch: t,
            position_ecef_m,
            clock_offset_m,
            zwd_m,
            dop,
            rejected,
            iterations: estimate.iterations,
            candidates: pool,
        })
    }
}

/// Initial variance (m²) of a new parameter, per class
pub(crate) fn initial_variance(cfg: &Config, class: ParameterClass) -> f64 {
    let initial = &cfg.initial;
    match class {
        ParameterClass::Coordinates => initial.coordinates_m2,
        ParameterClass::Clock => initial.clock_m2,
        ParameterClass::Troposphere => initial.troposphere_m2,
        ParameterClass::Ionosphere => initial.ionosphere_m2,
        ParameterClass::InterSystemBias => initial.isb_m2,
        ParameterClass::InterFrequencyBias => initial.ifb_m2,
    }
}
