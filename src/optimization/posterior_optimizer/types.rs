//! posterior_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the core numeric types and solver aliases used by the
//! log-posterior optimizer. By defining these in one place, the rest of
//! the optimization code can stay agnostic to `ndarray` and Argmin
//! generics and can more easily evolve if the backend changes.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for parameter vectors, gradients, and scalar
//!   costs (`Theta`, `Grad`, `Cost`).
//! - Provide a standard map type for Argmin function-evaluation counters
//!   (`FnEvalMap`).
//! - Expose pre-wired solver aliases: a Nelder–Mead simplex (the default
//!   refinement method for the grid MAP) and L-BFGS variants for the two
//!   supported line searches.
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors are `ndarray` containers over `f64` with length
//!   equal to the number of *free* psychometric parameters.
//! - `Cost` is a scalar `f64` in negative-log-posterior space; higher layers
//!   handle the sign flip between cost and log-posterior.
//!
//! Conventions
//! -----------
//! - `PENALTY_COST` is the finite stand-in returned to the solver when the
//!   log-posterior is `-∞` (out-of-domain simplex vertex). Nelder–Mead
//!   contracts away from such vertices; an infinite cost would instead
//!   abort the run.
//! - `DEFAULT_SIMPLEX_SCALE` matches the conventional 5% per-coordinate
//!   perturbation used to seed a simplex around the grid MAP.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Free-parameter vector `θ` for log-posterior optimization.
///
/// Alias for `ndarray::Array1<f64>`; coordinates follow the canonical
/// parameter order restricted to the free subset.
pub type Theta = Array1<f64>;

/// Gradient vector matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Scalar objective value used by the optimizer.
///
/// In this crate, this is the cost `c(θ) = -ln p(θ | data)` derived from
/// the unnormalized log-posterior.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default relative perturbation used to build the initial Nelder–Mead
/// simplex around the seed vertex.
pub const DEFAULT_SIMPLEX_SCALE: f64 = 0.05;

/// Absolute perturbation used for seed coordinates that are exactly zero
/// (a relative perturbation would produce a degenerate simplex there).
pub const ZERO_COORD_STEP: f64 = 2.5e-4;

/// Finite cost substituted for `-∞` log-posterior values.
///
/// Large enough that any valid vertex dominates it, small enough that
/// arithmetic on it stays finite.
pub const PENALTY_COST: f64 = 1e300;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Nelder–Mead simplex solver over the free-parameter vector.
pub type SimplexSolver = NelderMead<Theta, Cost>;
