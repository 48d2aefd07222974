//! posterior_optimizer — argmin-powered MAP refinement for log-posteriors.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing
//! log-posteriors** `ln p(θ)`. Callers implement a single trait,
//! [`LogPosterior`], and invoke [`maximize_posterior`] to run Nelder–Mead
//! simplex descent (the default) or L-BFGS with a configurable line search,
//! tolerances, and finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Convert model-supplied log-posteriors `ln p(θ)` into Argmin-compatible
//!   cost functions `c(θ) = -ln p(θ)` via [`adapter::ArgMinAdapter`],
//!   mapping `-∞` (out-of-domain) values to a large finite penalty so
//!   simplex vertices can recover.
//! - Expose a single entrypoint [`maximize_posterior`] that:
//!   - validates the initial guess with [`LogPosterior::check`],
//!   - selects a solver via [`builders`] based on [`traits::OptimMethod`],
//!   - executes it via [`run::run_nelder_mead`] / [`run::run_lbfgs`], and
//!   - normalizes results into an [`OptimOutcome`].
//! - Centralize optimizer configuration ([`Tolerances`], [`MapOptions`])
//!   and validation logic ([`validation`]) so downstream code can assume
//!   sane, finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** a log-posterior `ln p(θ)` by
//!   minimizing a cost `c(θ) = -ln p(θ)`; model code implements `ln p(θ)`
//!   and, when available, `∇ ln p(θ)`, **never** the cost directly.
//! - [`LogPosterior::value`] reports out-of-domain vectors as `Ok(-∞)`;
//!   NaN results are hard errors.
//! - Vectors use the canonical aliases [`Theta`] and [`Grad`];
//!   configuration types are validated on construction.
//!
//! Conventions
//! -----------
//! - Parameters live in the free-parameter subspace selected by the model
//!   layer (fixed psychometric parameters are excluded before reaching
//!   this module).
//! - Errors bubble up as [`OptResult<T>`](crate::optimization::errors::OptResult)
//!   / [`OptError`](crate::optimization::errors::OptError); this module and
//!   its children never intentionally panic or use `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - The psychometric model layer implements [`LogPosterior`] for its
//!   posterior and calls [`maximize_posterior`] with the grid MAP as seed
//!   to obtain a refined estimate.
//! - Front-ends interact only with the re-exported surface:
//!   [`maximize_posterior`], [`LogPosterior`], [`MapOptions`],
//!   [`OptimMethod`], [`Tolerances`], [`OptimOutcome`], plus numeric
//!   aliases from [`types`].
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions and penalty handling
//!   in [`adapter`], simplex/solver construction in [`builders`],
//!   validation behavior in [`validation`], and configuration/outcome
//!   invariants in [`traits`]; [`api`] tests run full maximizations on toy
//!   concave posteriors.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize_posterior;
pub use self::traits::{LogPosterior, MapOptions, OptimMethod, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_SCALE, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_psychometrics::optimization::posterior_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::maximize_posterior;
    pub use super::traits::{LogPosterior, MapOptions, OptimMethod, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
