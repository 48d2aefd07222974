//! Public API surface for log-posterior maximization.
//!
//! - [`LogPosterior`]: trait the model layer implements for its posterior.
//! - [`MapOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`OptimMethod`]: choice of solver (Nelder–Mead simplex or L-BFGS).
//! - [`OptimOutcome`]: normalized result returned by the high-level
//!   `maximize_posterior` API.
//!
//! Convention: we *maximize* an unnormalized log-posterior `ln p(θ)` by
//! minimizing the cost `c(θ) = -ln p(θ)`. If an analytic gradient is
//! provided, it should be the gradient of the log-posterior; the adapter
//! flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    posterior_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{
            validate_theta_hat, validate_value, verify_simplex_scale, verify_tol_cost,
            verify_tol_grad,
        },
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Model-implemented log-posterior interface.
///
/// You maximize `ln p(θ)`; internally we minimize the cost
/// `c(θ) = -ln p(θ)`. A value of `-∞` marks an out-of-domain θ and is
/// translated into a large finite penalty for simplex solvers.
///
/// - `type Data`: per-model payload carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ln p(θ)`.
///   Out-of-domain vectors should yield `Ok(-∞)`, not an error, because
///   simplex vertices routinely wander outside the valid region.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid seeds. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient of the
///   log-posterior. If not implemented, robust finite differences are used
///   automatically for gradient-based solvers.
pub trait LogPosterior {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of solver used to refine the grid MAP.
///
/// Variants:
/// - `NelderMead`: derivative-free simplex descent (default; tolerates the
///   flat, clipped regions of the posterior).
/// - `LbfgsMoreThuente` / `LbfgsHagerZhang`: quasi-Newton descent with the
///   respective line search, using finite-difference gradients unless the
///   model provides analytic ones.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"NelderMead"`, `"LbfgsMoreThuente"`, `"LbfgsHagerZhang"`). Unknown
/// names return `OptError::InvalidMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimMethod {
    NelderMead,
    LbfgsMoreThuente,
    LbfgsHagerZhang,
}

impl FromStr for OptimMethod {
    type Err = OptError;

    /// Parse a solver choice from a string (case-insensitive).
    ///
    /// Accepts:
    /// - `"NelderMead"`
    /// - `"LbfgsMoreThuente"`
    /// - `"LbfgsHagerZhang"`
    /// - Any case variant (e.g., `"neldermead"`, `"LBFGSHAGERZHANG"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neldermead" => Ok(OptimMethod::NelderMead),
            "lbfgsmorethuente" => Ok(OptimMethod::LbfgsMoreThuente),
            "lbfgshagerzhang" => Ok(OptimMethod::LbfgsHagerZhang),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'NelderMead', \
                         'LbfgsMoreThuente' or 'LbfgsHagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `method: OptimMethod` — solver used for MAP refinement.
/// - `verbose: bool` — if `true`, attaches an observer (behind the
///   `obs_slog` feature) and prints progress.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size (ignored by
///   Nelder–Mead); `None` uses the default of 7.
/// - `simplex_scale: Option<f64>` — relative perturbation for the initial
///   simplex (ignored by L-BFGS); `None` uses the default of 0.05.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = Some(1e-9)`, `max_iter = 300`
/// - `method`: `NelderMead`
/// - `verbose`: `false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    pub tols: Tolerances,
    pub method: OptimMethod,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub simplex_scale: Option<f64>,
}

impl MapOptions {
    /// Create a new set of optimizer options.
    ///
    /// Validation of numeric tolerance fields is performed inside
    /// [`Tolerances::new`]; this constructor only checks the solver-specific
    /// knobs.
    pub fn new(
        tols: Tolerances, method: OptimMethod, verbose: bool, lbfgs_mem: Option<usize>,
        simplex_scale: Option<f64>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        verify_simplex_scale(simplex_scale)?;
        Ok(Self { tols, method, verbose, lbfgs_mem, simplex_scale })
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::new(Some(1e-6), Some(1e-9), Some(300)).unwrap(),
            method: OptimMethod::NelderMead,
            verbose: false,
            lbfgs_mem: None,
            simplex_scale: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this
///   threshold (L-BFGS only).
/// - `tol_cost`: terminate when the change in cost falls below this
///   threshold; doubles as the simplex standard-deviation tolerance for
///   Nelder–Mead.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be
/// provided (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_grad(tol_grad)?;
        verify_tol_cost(tol_cost)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `maximize_posterior`.
///
/// - `theta_hat`: best free-parameter vector found.
/// - `value`: best **log-posterior** value `ln p(θ̂)` (not the cost).
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
///   Keys follow argmin's counters, e.g., cost_count, gradient_count.
/// - `grad_norm`: norm of the last available gradient, if present
///   (always `None` for Nelder–Mead).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (rejects NaN; `-∞` is allowed
    ///   because the orchestrator handles penalty-valued outcomes by
    ///   falling back to the grid MAP).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, converged: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let status: String;
        let converged = match converged {
            TerminationStatus::NotTerminated => {
                status = "Not terminated".to_string();
                false
            }
            _ => {
                status = format!("{converged:?}");
                true
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - OptimMethod parsing (case-insensitivity and rejection).
    // - MapOptions and Tolerances constructor validation.
    // - OptimOutcome construction from raw solver state.
    //
    // They intentionally DO NOT cover:
    // - Actual solver runs (covered by api/run tests and integration tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that method names parse case-insensitively and unknown names
    // are rejected with InvalidMethod.
    fn optim_method_from_str_accepts_known_names() {
        assert_eq!("neldermead".parse::<OptimMethod>().unwrap(), OptimMethod::NelderMead);
        assert_eq!(
            "LbfgsMoreThuente".parse::<OptimMethod>().unwrap(),
            OptimMethod::LbfgsMoreThuente
        );
        assert_eq!(
            "LBFGSHAGERZHANG".parse::<OptimMethod>().unwrap(),
            OptimMethod::LbfgsHagerZhang
        );
        let err = "powell".parse::<OptimMethod>().unwrap_err();
        assert!(matches!(err, OptError::InvalidMethod { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure Tolerances::new rejects all-None input and non-positive values.
    fn tolerances_validation() {
        assert!(matches!(
            Tolerances::new(None, None, None).unwrap_err(),
            OptError::NoTolerancesProvided
        ));
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None).unwrap_err(),
            OptError::InvalidTolGrad { .. }
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::NAN), None).unwrap_err(),
            OptError::InvalidTolCost { .. }
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)).unwrap_err(),
            OptError::InvalidMaxIter { .. }
        ));
        assert!(Tolerances::new(Some(1e-6), None, Some(100)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Ensure MapOptions::new rejects a zero L-BFGS memory and a non-positive
    // simplex scale, and that the default configuration is valid.
    fn map_options_validation_and_default() {
        let tols = Tolerances::new(Some(1e-6), None, Some(100)).unwrap();
        assert!(matches!(
            MapOptions::new(tols, OptimMethod::NelderMead, false, Some(0), None).unwrap_err(),
            OptError::InvalidLBFGSMem { .. }
        ));
        assert!(matches!(
            MapOptions::new(tols, OptimMethod::NelderMead, false, None, Some(0.0)).unwrap_err(),
            OptError::InvalidSimplexScale { .. }
        ));
        let opts = MapOptions::default();
        assert_eq!(opts.method, OptimMethod::NelderMead);
        assert!(!opts.verbose);
    }

    #[test]
    // Purpose
    // -------
    // Verify OptimOutcome::new maps a terminated status to converged=true
    // and preserves the best value with flipped sign handled upstream.
    fn optim_outcome_from_solver_state() {
        let outcome = OptimOutcome::new(
            Some(array![0.1, 0.2]),
            -12.5,
            TerminationStatus::Terminated(argmin::core::TerminationReason::MaxItersReached),
            42,
            FnEvalMap::new(),
            None,
        )
        .unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 42);
        assert_eq!(outcome.value, -12.5);
        assert!(outcome.grad_norm.is_none());
    }

    #[test]
    // Purpose
    // -------
    // A missing best parameter vector must surface as MissingThetaHat.
    fn optim_outcome_missing_theta() {
        let err = OptimOutcome::new(
            None,
            -1.0,
            TerminationStatus::NotTerminated,
            0,
            FnEvalMap::new(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, OptError::MissingThetaHat));
    }
}
