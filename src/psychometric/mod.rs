//! Bayesian estimation of psychometric functions.
//!
//! Purpose
//! -------
//! Fit sigmoid psychometric functions to blocked binary data with a
//! beta-binomial observation model, integrating the posterior over a
//! 5-D parameter grid (threshold, width, lapse rate, guess rate,
//! overdispersion) and refining the MAP numerically.
//!
//! Key behaviors
//! -------------
//! - `core` holds data containers, parameter types, experiment kinds,
//!   options, bounds and cancellation.
//! - `sigmoid`, `priors` and `likelihood` define the model itself;
//!   `grid` and `posterior` integrate it; `models` orchestrates a fit
//!   and `result` packages the outcome.
//!
//! Conventions
//! -----------
//! - Parameters are always ordered (threshold, width, lambda, gamma,
//!   eta); `core::params::Parameter::index` is the source of truth.
//! - Log-domain quantities use `-∞` as the out-of-domain sentinel,
//!   never NaN.
//!
//! Downstream usage
//! ----------------
//! - Typical callers need only [`models::fit`] with [`core::options::FitOptions`]
//!   and read the returned [`result::FitResult`].
pub mod core;
pub mod errors;
pub mod grid;
pub mod likelihood;
pub mod models;
pub mod posterior;
pub mod priors;
pub mod result;
pub mod sigmoid;

pub use core::{
    CancelToken, EstimateType, ExperimentType, FitOptions, GridSteps, ParamBounds, Parameter,
    PsychData, PsychParams,
};
pub use errors::{FitStage, PsychError, PsychResult};
pub use models::{PsychModel, fit};
pub use result::{FitResult, PerParameter};
pub use sigmoid::{Sigmoid, SigmoidKind};

/// Convenience re-exports for fitting and inspecting results.
pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::errors::{FitStage, PsychError, PsychResult};
    pub use super::models::prelude::*;
    pub use super::result::{FitResult, PerParameter};
    pub use super::sigmoid::{Sigmoid, SigmoidKind};
}
