//! Execution helpers that run an `argmin` solver on a log-posterior problem
//! and return a crate-friendly [`OptimOutcome`].
//!
//! Two runners exist because the simplex and quasi-Newton solvers use
//! different `IterState` shapes: Nelder–Mead carries no gradient slot
//! (its state gradient type is `()`), while L-BFGS tracks a `Grad` and
//! reports its norm.
use crate::optimization::{
    errors::OptResult,
    posterior_optimizer::{
        Grad, LogPosterior, MapOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run a gradient-based `argmin` optimization for a log-posterior problem.
///
/// Shared runner for both L-BFGS line-search variants. It wires up:
/// - the model via [`ArgMinAdapter`],
/// - the chosen solver,
/// - initial parameter `theta0` via `state.param(theta0)`,
/// - optional observers (behind the `obs_slog` feature),
/// - optional `max_iters`,
///   then executes the solver and converts the result into [`OptimOutcome`].
///
/// The returned `value` is the best **log-posterior** `ln p(θ̂)`, i.e. the
/// negated best cost.
///
/// # Errors
/// - Propagates any `argmin` runtime error (observer failures, solver
///   errors, line-search failures) via the crate's
///   `From<argmin::core::Error>` conversion.
/// - Propagates validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MapOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogPosterior,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

/// Run a Nelder–Mead simplex optimization for a log-posterior problem.
///
/// The initial simplex lives inside the solver (constructed by
/// [`build_nelder_mead`](crate::optimization::posterior_optimizer::builders::build_nelder_mead)),
/// so no initial parameter is set on the state. The simplex `IterState`
/// carries no gradient, so `grad_norm` of the outcome is always `None`.
///
/// # Errors
/// - Propagates any `argmin` runtime error via the crate's
///   `From<argmin::core::Error>` conversion.
/// - Propagates validation errors from [`OptimOutcome::new`].
pub fn run_nelder_mead<'a, F, S>(
    opts: &MapOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogPosterior,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, (), (), (), (), f64>,
        > + Send
        + 'static,
{
    let mut optimizer = Executor::new(problem, solver);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    OptimOutcome::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        None,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogPosterior,
{
    let lp0 = -problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: ln p(theta0) = {:.6}{}",
        lp0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
