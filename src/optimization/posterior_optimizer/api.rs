//! High-level entry point for maximizing a model-provided `LogPosterior`.
//!
//! This selects the solver named by [`MapOptions::method`] — Nelder–Mead
//! simplex (default) or L-BFGS with either line search — wraps the model in
//! an `ArgMinAdapter` (which *minimizes* `-ln p(θ)`), and delegates the run
//! to the matching runner.
use crate::optimization::{
    errors::OptResult,
    posterior_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_nelder_mead, build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{run_lbfgs, run_nelder_mead},
        traits::{LogPosterior, MapOptions, OptimMethod},
    },
};

/// Maximize a log-posterior `ln p(θ)` with the configured solver.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Wraps `(f, data)` in an `ArgMinAdapter` that exposes a *minimization*
///   problem `c(θ) = -ln p(θ)` to `argmin`, substituting a large finite
///   penalty for `-∞` log-posteriors.
/// - For `OptimMethod::NelderMead`, builds an initial simplex around
///   `theta0` and runs the simplex solver.
/// - For the L-BFGS variants, builds the solver with the chosen line
///   search and runs it from `theta0`, using finite-difference gradients
///   unless the model provides analytic ones.
///
/// # Parameters
/// - `f`: Model implementing [`LogPosterior`].
/// - `theta0`: Initial free-parameter vector (typically the grid MAP).
/// - `data`: Model data passed through to `value`/`grad`.
/// - `opts`: Optimizer options (method, tolerances, verbosity).
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_*`.
/// - Propagates runtime errors from the runners.
///
/// # Returns
/// An [`OptimOutcome`] containing `theta_hat`, best value `ln p(θ̂)`,
/// termination status, iteration and function-evaluation counts, and
/// optionally the gradient norm.
pub fn maximize_posterior<F: LogPosterior>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MapOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.method {
        OptimMethod::NelderMead => {
            let solver = build_nelder_mead(&theta0, opts)?;
            run_nelder_mead(opts, problem, solver)
        }
        OptimMethod::LbfgsMoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        OptimMethod::LbfgsHagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}
