//! optimization — MAP refinement stack, numerical helpers, and unified
//! error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for posterior-based model fitting,
//! combining an Argmin-backed log-posterior optimizer, numerically stable
//! probability/integration helpers, and a single error/result surface.
//! Callers implement a log-posterior, choose tolerances, and obtain refined
//! parameters and diagnostics without touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing log-posteriors** `ln p(θ)`
//!   (`posterior_optimizer`), including configuration of solvers and
//!   stopping criteria.
//! - Supply shared numerical primitives (`numerical_stability`) for
//!   probability clamping, log-sum-exp reductions, and trapezoid
//!   quadrature weights over irregular grids.
//! - Normalize configuration issues, numerical failures, and backend
//!   solver errors into a single enum (`errors::OptError`) with a common
//!   result alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate on the free-parameter vector `θ` and assume inputs
//!   are finite once validation has passed; invalid states are reported as
//!   `OptError`, not panics.
//! - Log-posterior implementations report domain violations (parameters
//!   outside their bounds, degenerate likelihoods) as `Ok(-∞)` so solvers
//!   can contract away from them.
//!
//! Conventions
//! -----------
//! - All solvers conceptually maximize `ln p(θ)` by minimizing an internal
//!   cost `c(θ) = -ln p(θ)`; user-facing APIs and outcomes are expressed
//!   in terms of `ln p`.
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw Argmin errors.
//! - This module and its submodules avoid I/O; higher layers are
//!   responsible for reporting progress and diagnostics.
//!
//! Downstream usage
//! ----------------
//! - The psychometric model layer implements `LogPosterior` for its
//!   posterior and calls `maximize_posterior` with the grid MAP as seed,
//!   a data payload, and `MapOptions` to obtain an `OptimOutcome`.
//! - Grid and posterior code use `numerical_stability` for clamped
//!   probabilities and integration weights.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns: solver wiring
//!   and toy posteriors in `posterior_optimizer`, quadrature and clamping
//!   edge cases in `numerical_stability`, and error conversions in
//!   `errors`.
//! - The crate-level integration tests exercise the full fit pipeline and
//!   verify that failures surface as sensible error values.

pub mod errors;
pub mod numerical_stability;
pub mod posterior_optimizer;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_psychometrics::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::numerical_stability::prelude::*;
    pub use super::posterior_optimizer::prelude::*;
}
