//! Fit configuration: sigmoid choice, experiment type, priors knobs, grid
//! resolution, and refinement policy.
//!
//! Purpose
//! -------
//! Provide the single, validated options record ([`FitOptions`]) consumed
//! by the model layer, plus the small vocabulary types it builds on
//! ([`GridSteps`], [`EstimateType`]). Defaults reproduce the standard
//! configuration of grid-based psychometric fitting; every field can be
//! overridden before validation.
//!
//! Key behaviors
//! -------------
//! - [`FitOptions::default`] yields a yes/no configuration with a normal
//!   sigmoid, Beta(1, 10) asymptote priors, confidence levels
//!   (0.95, 0.9, 0.68), and the standard grid resolutions.
//! - [`FitOptions::validate`] cross-checks fixed parameters against the
//!   experiment type and rejects out-of-domain knobs with specific
//!   [`ConfigError`] variants.
//! - Grid-resolution defaults depend on the experiment type: when the
//!   guess rate is not a free axis its step counts collapse to 1.
//!
//! Invariants & assumptions
//! ------------------------
//! - A validated `FitOptions` is internally consistent; the grid and
//!   model layers do not re-check it.
//! - Fixing the guess rate manually in an nAFC experiment is an error:
//!   the rate is already determined by the number of alternatives.
//!
//! Conventions
//! -----------
//! - Fixed parameters are recorded as `Option<f64>` per canonical axis;
//!   `None` leaves the parameter free.
//! - All options are plain data (serde-serializable); behavioral inputs
//!   such as custom priors live on the model, not here.
//!
//! Downstream usage
//! ----------------
//! - `PsychModel::new` calls [`FitOptions::validate`] once; the options
//!   are then echoed into the fit result for reproducibility.
//!
//! Testing notes
//! -------------
//! - Unit tests cover default consistency, per-field rejections, and the
//!   experiment/fixed-parameter cross checks.
use crate::{
    optimization::posterior_optimizer::MapOptions,
    psychometric::{
        core::{
            bounds::ETA_MAX,
            experiment::ExperimentType,
            params::{N_PARAMS, Parameter},
        },
        errors::{ConfigError, ConfigResult},
        sigmoid::SigmoidKind,
    },
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default Beta-prior shape for the asymptote and overdispersion priors.
pub const DEFAULT_BETA_PRIOR: f64 = 10.0;

/// Default marginal tail mass below which a border is moved inward.
pub const DEFAULT_MAX_BOUND_VALUE: f64 = 1e-5;

/// Default maximum number of border-refinement rounds.
pub const DEFAULT_REFINE_MAX_ROUNDS: usize = 3;

/// Default relative shrink below which refinement stops early.
pub const DEFAULT_REFINE_SHRINK_TOL: f64 = 0.01;

/// Which posterior summary to report as the primary point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateType {
    /// Grid argmax of the log-posterior, refined by the optimizer.
    Map,
    /// Posterior mean under the normalized integration weights.
    Mean,
}

impl FromStr for EstimateType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "map" => Ok(EstimateType::Map),
            "mean" => Ok(EstimateType::Mean),
            _ => Err(ConfigError::InvalidParameterName { text: s.to_string() }),
        }
    }
}

/// Grid resolution: number of points per canonical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSteps(pub [usize; N_PARAMS]);

impl GridSteps {
    /// Step count along the given parameter's axis.
    pub fn get(&self, param: Parameter) -> usize {
        self.0[param.index()]
    }

    /// Default resolution for the final posterior grid.
    ///
    /// Yes/no experiments keep a full guess-rate axis; otherwise that
    /// axis collapses to a single point.
    pub fn final_defaults(experiment: ExperimentType) -> Self {
        if experiment.gamma_is_free() {
            GridSteps([40, 40, 20, 20, 20])
        } else {
            GridSteps([40, 40, 20, 1, 20])
        }
    }

    /// Default resolution for the coarse grids used while moving borders.
    pub fn moving_defaults(experiment: ExperimentType) -> Self {
        if experiment.gamma_is_free() {
            GridSteps([25, 30, 10, 10, 15])
        } else {
            GridSteps([30, 40, 10, 1, 20])
        }
    }
}

/// Complete configuration of a psychometric fit.
///
/// Fields
/// ------
/// - `sigmoid`: shape family of the psychometric function.
/// - `experiment`: task type; constrains the guess rate.
/// - `estimate_type`: which posterior summary is the primary estimate.
/// - `fixed`: per-axis fixed values (`None` leaves the axis free).
/// - `confidence_levels`: credible-interval masses to report.
/// - `beta_prior`: shape `b` of the Beta(1, b) priors on lambda, gamma,
///   and eta.
/// - `width_alpha`: quantile cut defining the width
///   (between the `width_alpha` and `1 - width_alpha` points).
/// - `thresh_pc`: unscaled proportion-correct defining the threshold.
/// - `max_bound_value`: marginal tail mass below which a grid border is
///   moved inward during refinement.
/// - `grid_steps` / `moving_grid_steps`: final and coarse grid
///   resolutions; `None` selects the experiment-dependent default.
/// - `refine_max_rounds` / `refine_shrink_tol`: border-refinement policy.
/// - `stimulus_range` / `width_min`: data-derived quantities that can be
///   overridden when the sampled levels do not span the region of
///   interest.
/// - `bounds`: optional per-axis bound overrides (lower, upper).
/// - `optim`: optimizer configuration for the MAP refinement step.
/// - `verbose`: emit progress lines for grid rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub sigmoid: SigmoidKind,
    pub experiment: ExperimentType,
    pub estimate_type: EstimateType,
    pub fixed: [Option<f64>; N_PARAMS],
    pub confidence_levels: Vec<f64>,
    pub beta_prior: f64,
    pub width_alpha: f64,
    pub thresh_pc: f64,
    pub max_bound_value: f64,
    pub grid_steps: Option<GridSteps>,
    pub moving_grid_steps: Option<GridSteps>,
    pub refine_max_rounds: usize,
    pub refine_shrink_tol: f64,
    pub stimulus_range: Option<(f64, f64)>,
    pub width_min: Option<f64>,
    pub bounds: [Option<(f64, f64)>; N_PARAMS],
    pub optim: MapOptions,
    pub verbose: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            sigmoid: SigmoidKind::Norm,
            experiment: ExperimentType::YesNo,
            estimate_type: EstimateType::Map,
            fixed: [None; N_PARAMS],
            confidence_levels: vec![0.95, 0.9, 0.68],
            beta_prior: DEFAULT_BETA_PRIOR,
            width_alpha: 0.05,
            thresh_pc: 0.5,
            max_bound_value: DEFAULT_MAX_BOUND_VALUE,
            grid_steps: None,
            moving_grid_steps: None,
            refine_max_rounds: DEFAULT_REFINE_MAX_ROUNDS,
            refine_shrink_tol: DEFAULT_REFINE_SHRINK_TOL,
            stimulus_range: None,
            width_min: None,
            bounds: [None; N_PARAMS],
            optim: MapOptions::default(),
            verbose: false,
        }
    }
}

impl FitOptions {
    /// Cross-check all fields.
    ///
    /// # Errors
    /// - `ConfigError::InvalidAlternatives` for nAFC with fewer than two
    ///   alternatives.
    /// - `ConfigError::FixedGammaInNafc` when the guess rate is fixed
    ///   manually in an nAFC experiment.
    /// - `ConfigError::UnequalAsymptotes` when an equal-asymptote
    ///   experiment fixes lapse and guess to different values.
    /// - `ConfigError::InvalidFixedValue` / `FixedSumOutOfRange` for fixed
    ///   values outside their domain.
    /// - `ConfigError::InvalidConfidenceLevel`, `InvalidWidthAlpha`,
    ///   `InvalidThreshPc`, `InvalidBetaPrior`, `InvalidBoundValue`,
    ///   `InvalidGridSteps`, `InvalidRefineRounds`,
    ///   `InvalidStimulusRange`, `InvalidWidthMin`, or `BoundsOutOfDomain`
    ///   for the corresponding malformed knob.
    pub fn validate(&self) -> ConfigResult<()> {
        self.experiment.validate()?;
        self.validate_fixed()?;

        for &level in &self.confidence_levels {
            if !level.is_finite() || level <= 0.0 || level >= 1.0 {
                return Err(ConfigError::InvalidConfidenceLevel { value: level });
            }
        }
        if !self.width_alpha.is_finite() || self.width_alpha <= 0.0 || self.width_alpha >= 0.5 {
            return Err(ConfigError::InvalidWidthAlpha { value: self.width_alpha });
        }
        if !self.thresh_pc.is_finite() || self.thresh_pc <= 0.0 || self.thresh_pc >= 1.0 {
            return Err(ConfigError::InvalidThreshPc { value: self.thresh_pc });
        }
        if !self.beta_prior.is_finite() || self.beta_prior < 1.0 {
            return Err(ConfigError::InvalidBetaPrior { value: self.beta_prior });
        }
        if !self.max_bound_value.is_finite()
            || self.max_bound_value <= 0.0
            || self.max_bound_value >= 1.0
        {
            return Err(ConfigError::InvalidBoundValue { value: self.max_bound_value });
        }
        if self.refine_max_rounds == 0 {
            return Err(ConfigError::InvalidRefineRounds { rounds: self.refine_max_rounds });
        }

        for steps in [self.grid_steps, self.moving_grid_steps].into_iter().flatten() {
            for param in Parameter::ALL {
                let n = steps.get(param);
                let free = self.fixed[param.index()].is_none()
                    && (param != Parameter::Gamma || self.experiment.gamma_is_free());
                if n == 0 || (free && n < 2) {
                    return Err(ConfigError::InvalidGridSteps { name: param.name(), steps: n });
                }
            }
        }

        if let Some((min, max)) = self.stimulus_range {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::InvalidStimulusRange { min, max });
            }
        }
        if let Some(width_min) = self.width_min {
            if !width_min.is_finite() || width_min <= 0.0 {
                return Err(ConfigError::InvalidWidthMin { value: width_min });
            }
        }
        for param in Parameter::ALL {
            if let Some((lower, upper)) = self.bounds[param.index()] {
                let malformed = !lower.is_finite() || !upper.is_finite() || lower >= upper;
                // Overrides must stay inside the parameter's hard domain,
                // matching the intervals the default box is built over.
                let outside = match param {
                    Parameter::Threshold => false,
                    Parameter::Width => lower <= 0.0,
                    Parameter::Lambda | Parameter::Gamma => lower < 0.0 || upper >= 1.0,
                    Parameter::Eta => lower < 0.0 || upper > ETA_MAX,
                };
                if malformed || outside {
                    return Err(ConfigError::BoundsOutOfDomain {
                        name: param.name(),
                        lower,
                        upper,
                    });
                }
            }
        }
        Ok(())
    }

    /// Fixed value of a parameter after applying experiment constraints:
    /// `1/n` for the guess rate in nAFC, otherwise the user-provided value.
    pub fn effective_fixed(&self, param: Parameter) -> Option<f64> {
        if param == Parameter::Gamma {
            if let Some(rate) = self.experiment.guess_rate() {
                return Some(rate);
            }
        }
        self.fixed[param.index()]
    }

    /// Final-grid resolution, falling back to the experiment default.
    pub fn final_grid_steps(&self) -> GridSteps {
        self.grid_steps.unwrap_or_else(|| GridSteps::final_defaults(self.experiment))
    }

    /// Coarse-grid resolution, falling back to the experiment default.
    pub fn moving_grid_steps(&self) -> GridSteps {
        self.moving_grid_steps.unwrap_or_else(|| GridSteps::moving_defaults(self.experiment))
    }

    // Fixed-parameter checks, separated to keep `validate` readable.
    fn validate_fixed(&self) -> ConfigResult<()> {
        let fixed_gamma = self.fixed[Parameter::Gamma.index()];
        if let ExperimentType::Nafc(n) = self.experiment {
            if fixed_gamma.is_some() {
                return Err(ConfigError::FixedGammaInNafc { n });
            }
        }
        let fixed_lambda = self.fixed[Parameter::Lambda.index()];
        if self.experiment == ExperimentType::EqualAsymptote {
            if let (Some(lambda), Some(gamma)) = (fixed_lambda, fixed_gamma) {
                if lambda != gamma {
                    return Err(ConfigError::UnequalAsymptotes { lambda, gamma });
                }
            }
        }

        if let Some(value) = self.fixed[Parameter::Threshold.index()] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidFixedValue {
                    name: "threshold",
                    value,
                    reason: "Threshold must be finite.",
                });
            }
        }
        if let Some(value) = self.fixed[Parameter::Width.index()] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidFixedValue {
                    name: "width",
                    value,
                    reason: "Width must be finite and > 0.",
                });
            }
        }
        for (param, fixed) in
            [(Parameter::Lambda, fixed_lambda), (Parameter::Gamma, fixed_gamma), (
                Parameter::Eta,
                self.fixed[Parameter::Eta.index()],
            )]
        {
            if let Some(value) = fixed {
                if !value.is_finite() || !(0.0..1.0).contains(&value) {
                    return Err(ConfigError::InvalidFixedValue {
                        name: param.name(),
                        value,
                        reason: "Rates must lie in [0, 1).",
                    });
                }
            }
        }
        if let (Some(lambda), Some(gamma)) = (fixed_lambda, self.effective_fixed(Parameter::Gamma))
        {
            if lambda + gamma >= 1.0 {
                return Err(ConfigError::FixedSumOutOfRange { lambda, gamma });
            }
        }
        Ok(())
    }
}
