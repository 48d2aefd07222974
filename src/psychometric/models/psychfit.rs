//! The fitting pipeline: data to posterior to estimates.
//!
//! Purpose
//! -------
//! Orchestrate one complete fit: derive data-dependent defaults, refine
//! the parameter bounds on coarse grids, integrate the posterior on the
//! final grid, refine the grid MAP with a numerical optimizer, and
//! assemble the [`FitResult`] record.
//!
//! Key behaviors
//! -------------
//! - [`PsychModel::new`] validates the options once; every later stage
//!   can rely on a consistent configuration.
//! - [`PsychModel::with_prior`] replaces the default prior of one
//!   parameter before fitting.
//! - [`PsychModel::fit_with_cancel`] polls the cancellation token
//!   between stages and inside the border-refinement loop; a fired token
//!   surfaces as [`PsychError::Cancelled`] with the stage it interrupted.
//! - The optimizer refinement is best-effort: when it fails, diverges or
//!   lands below the grid MAP, the grid MAP stands and the fit still
//!   succeeds.
//!
//! Invariants & assumptions
//! ------------------------
//! - Estimates returned to callers are always inside the model domain
//!   and inside the (refined) bounds box.
//! - Equal-asymptote fits report `γ = λ` in both estimates.
//! - The deviance is computed under the binomial observation model
//!   (overdispersion forced to zero), matching the saturated reference.
//!
//! Conventions
//! -----------
//! - Stage progress under `verbose` goes to stderr, one line per stage.
//!
//! Downstream usage
//! ----------------
//! - [`fit`] is the one-call entry point; [`PsychModel`] is for callers
//!   that want custom priors or repeated fits with one configuration.
//!
//! Testing notes
//! -------------
//! - Unit tests cover configuration rejection, the not-fitted accessor
//!   and prior overrides; estimate quality lives in the integration
//!   tests.
use crate::optimization::{
    errors::OptResult,
    posterior_optimizer::{Cost, Theta, maximize_posterior, traits::LogPosterior},
};
use crate::psychometric::{
    core::{
        bounds::ParamBounds,
        cancel::CancelToken,
        data::PsychData,
        experiment::ExperimentType,
        options::{EstimateType, FitOptions},
        params::{FreeMask, N_PARAMS, Parameter, PsychParams, pack_free, unpack_free},
    },
    errors::{FitStage, PsychError, PsychResult},
    grid::{ParameterGrid, refine_bounds},
    likelihood::log_posterior,
    posterior::{
        credible_interval, deviance, map_index, marginal, mean_estimate, normalized_weights,
    },
    priors::PriorSet,
    result::{FitResult, PerParameter, per_parameter_from_arrays},
    sigmoid::Sigmoid,
};
use std::sync::Arc;

/// Shared prior override kept across fits.
type PriorOverride = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// A configured psychometric model, fittable to block data.
pub struct PsychModel {
    options: FitOptions,
    prior_overrides: [Option<PriorOverride>; N_PARAMS],
    results: Option<FitResult>,
}

impl std::fmt::Debug for PsychModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PsychModel")
            .field("options", &self.options)
            .field(
                "prior_overrides",
                &self.prior_overrides.iter().map(Option::is_some).collect::<Vec<_>>(),
            )
            .field("fitted", &self.results.is_some())
            .finish()
    }
}

impl PsychModel {
    /// Validate `options` and build an unfitted model.
    ///
    /// # Errors
    /// - `PsychError::Config` describing the first inconsistent field.
    pub fn new(options: FitOptions) -> PsychResult<PsychModel> {
        options.validate()?;
        Ok(PsychModel {
            options,
            prior_overrides: std::array::from_fn(|_| None),
            results: None,
        })
    }

    /// Replace the default prior density of one parameter.
    ///
    /// The function is treated as an unnormalized density over the
    /// parameter's bounds; it is renormalized on each grid it is
    /// tabulated on.
    pub fn with_prior(
        mut self, param: Parameter, prior: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> PsychModel {
        self.prior_overrides[param.index()] = Some(Arc::new(prior));
        self
    }

    /// The configuration this model runs with.
    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// The result of the most recent fit.
    ///
    /// # Errors
    /// - `PsychError::ModelNotFitted` before the first successful fit.
    pub fn results(&self) -> PsychResult<&FitResult> {
        self.results.as_ref().ok_or(PsychError::ModelNotFitted)
    }

    /// Fit the model to `data`. See [`PsychModel::fit_with_cancel`].
    pub fn fit(&mut self, data: &PsychData) -> PsychResult<&FitResult> {
        self.fit_with_cancel(data, None)
    }

    /// Fit the model to `data`, polling `cancel` between stages.
    ///
    /// # Errors
    /// - `PsychError::Cancelled` naming the stage a fired token
    ///   interrupted.
    /// - `PsychError::DegenerateLikelihood` / `ZeroPosteriorMass` when
    ///   the posterior carries no usable mass.
    /// - Data-shape errors from upstream validation are not re-raised
    ///   here; `data` is assumed already constructed via
    ///   [`PsychData::new`].
    pub fn fit_with_cancel(
        &mut self, data: &PsychData, cancel: Option<&CancelToken>,
    ) -> PsychResult<&FitResult> {
        check_cancel(cancel, FitStage::Configuring)?;
        let options = &self.options;
        let stimulus_range = match options.stimulus_range {
            Some(range) => range,
            None => data.stimulus_range()?,
        };
        let width_min = match options.width_min {
            Some(value) => value,
            None => data.width_min_estimate()?,
        };
        let sigmoid = options.sigmoid.build(options.thresh_pc, options.width_alpha);

        let mut priors = PriorSet::defaults(stimulus_range, width_min, options);
        for param in Parameter::ALL {
            if let Some(prior) = &self.prior_overrides[param.index()] {
                let prior = Arc::clone(prior);
                priors.set_prior(param, Box::new(move |x| prior(x)));
            }
        }

        let initial = ParamBounds::defaults(stimulus_range, width_min, options);
        if options.verbose {
            eprintln!("fit: refining bounds from {initial:?}");
        }
        let bounds = refine_bounds(
            data,
            sigmoid.as_ref(),
            options.experiment,
            &priors,
            initial,
            options,
            cancel,
        )?;

        check_cancel(cancel, FitStage::Integrating)?;
        if options.verbose {
            eprintln!("fit: integrating posterior over {bounds:?}");
        }
        let grid = ParameterGrid::new(&bounds, &options.final_grid_steps());
        let surface =
            grid.evaluate_surface(data, sigmoid.as_ref(), options.experiment, &priors);
        let axes = grid.axes();
        let weights = normalized_weights(&surface, &axes, FitStage::Integrating)?;

        check_cancel(cancel, FitStage::Optimizing)?;
        let map_coords = map_index(&surface);
        let grid_map = grid.params_at(map_coords);
        let mut estimate_map = refine_map_estimate(
            data,
            sigmoid.as_ref(),
            options,
            &priors,
            &bounds,
            grid_map,
        );
        let mut estimate_mean = mean_estimate(&weights, &axes);
        if options.experiment == ExperimentType::EqualAsymptote {
            estimate_map.gamma = estimate_map.lambda;
            estimate_mean.gamma = estimate_mean.lambda;
        }

        let marginal_masses: [Vec<f64>; N_PARAMS] =
            Parameter::ALL.map(|param| marginal(&weights, param).to_vec());
        let confidence_intervals = options
            .confidence_levels
            .iter()
            .map(|&level| {
                let per_param = PerParameter::build(|param| {
                    credible_interval(
                        &marginal_masses[param.index()],
                        grid.axis(param),
                        level,
                    )
                });
                (level, per_param)
            })
            .collect();

        let estimate = match options.estimate_type {
            EstimateType::Map => &estimate_map,
            EstimateType::Mean => &estimate_mean,
        };
        let deviance = deviance(data, sigmoid.as_ref(), options.experiment, estimate);

        let parameter_values =
            per_parameter_from_arrays(Parameter::ALL.map(|p| grid.axis(p).to_vec()));
        let prior_values = per_parameter_from_arrays(Parameter::ALL.map(|param| {
            grid.axis(param).iter().map(|&x| priors.density(param, x)).collect()
        }));
        let marginal_mass = per_parameter_from_arrays(marginal_masses);

        self.results = Some(FitResult {
            estimate_map,
            estimate_mean,
            configuration: self.options.clone(),
            confidence_intervals,
            data: data.blocks().collect(),
            parameter_values,
            prior_values,
            marginal_mass,
            weights,
            deviance,
        });
        Ok(self.results.as_ref().expect("stored just above"))
    }
}

/// One-call fit with the given options.
///
/// # Errors
/// - Everything [`PsychModel::new`] and [`PsychModel::fit`] can raise.
pub fn fit(data: &PsychData, options: FitOptions) -> PsychResult<FitResult> {
    let mut model = PsychModel::new(options)?;
    model.fit(data)?;
    Ok(model.results.take().expect("fit stored a result"))
}

fn check_cancel(cancel: Option<&CancelToken>, stage: FitStage) -> PsychResult<()> {
    if let Some(token) = cancel {
        if token.is_cancelled() {
            return Err(PsychError::Cancelled { stage });
        }
    }
    Ok(())
}

/// Free-coordinate view of the log-posterior for the optimizer.
struct PosteriorProblem<'a> {
    data: &'a PsychData,
    sigmoid: &'a dyn Sigmoid,
    experiment: ExperimentType,
    priors: &'a PriorSet,
    bounds: &'a ParamBounds,
    base: PsychParams,
    mask: FreeMask,
}

impl LogPosterior for PosteriorProblem<'_> {
    type Data = ();

    fn value(&self, theta: &Theta, _data: &()) -> OptResult<Cost> {
        let params = unpack_free(theta, &self.base, &self.mask)?;
        Ok(log_posterior(
            self.data,
            self.sigmoid,
            self.experiment,
            self.priors,
            self.bounds,
            &params,
        ))
    }

    fn check(&self, theta: &Theta, _data: &()) -> OptResult<()> {
        unpack_free(theta, &self.base, &self.mask)?;
        Ok(())
    }
}

/// Polish the grid MAP with the configured optimizer.
///
/// Fixed axes stay pinned; only free coordinates move. Failure to
/// improve on the grid value is not an error: the grid MAP is returned
/// unchanged.
fn refine_map_estimate(
    data: &PsychData, sigmoid: &dyn Sigmoid, options: &FitOptions, priors: &PriorSet,
    bounds: &ParamBounds, grid_map: PsychParams,
) -> PsychParams {
    let mask: FreeMask =
        std::array::from_fn(|i| !bounds.is_fixed(Parameter::ALL[i]));
    if mask.iter().all(|&free| !free) {
        return grid_map;
    }
    let problem = PosteriorProblem {
        data,
        sigmoid,
        experiment: options.experiment,
        priors,
        bounds,
        base: grid_map,
        mask,
    };
    let grid_value = log_posterior(data, sigmoid, options.experiment, priors, bounds, &grid_map);
    let theta0 = pack_free(&grid_map, &mask);

    let outcome = match maximize_posterior(&problem, theta0, &(), &options.optim) {
        Ok(outcome) => outcome,
        Err(err) => {
            if options.verbose {
                eprintln!("fit: MAP refinement failed ({err}); keeping grid MAP");
            }
            return grid_map;
        }
    };
    let candidate = match unpack_free(&outcome.theta_hat, &grid_map, &mask) {
        Ok(candidate) => candidate,
        Err(_) => return grid_map,
    };
    if outcome.value.is_finite() && outcome.value >= grid_value && candidate.in_domain() {
        candidate
    } else {
        if options.verbose {
            eprintln!(
                "fit: MAP refinement did not improve on the grid value \
                 ({} vs {grid_value}); keeping grid MAP",
                outcome.value
            );
        }
        grid_map
    }
}
