//! core — validated building blocks of the psychometric fitting stack.
//!
//! Purpose
//! -------
//! Collect the plain-data layer every other psychometric module builds
//! on: trial data, the parameter vocabulary, experiment types, parameter
//! bounds, fit options, and cooperative cancellation.
//!
//! Key behaviors
//! -------------
//! - [`data::PsychData`] validates blocked trial data once at the
//!   boundary; downstream code relies on its invariants.
//! - [`params`] fixes the canonical axis order shared by every 5-D
//!   posterior surface and provides free-vector packing for the
//!   optimizer.
//! - [`options::FitOptions`] carries the complete, serializable fit
//!   configuration with experiment-aware defaults.
//! - [`bounds::ParamBounds`] derives the grid box from the stimulus
//!   geometry and applies fixed values and overrides.
//! - [`cancel::CancelToken`] lets callers stop a fit at stage boundaries.
//!
//! Conventions
//! -----------
//! - Everything here is plain data plus validation; no likelihood or
//!   integration logic lives in this module.
//!
//! Downstream usage
//! ----------------
//! - The grid, likelihood, posterior, and model layers consume these
//!   types; front-ends construct them directly.

pub mod bounds;
pub mod cancel;
pub mod data;
pub mod experiment;
pub mod options;
pub mod params;

pub use self::bounds::ParamBounds;
pub use self::cancel::CancelToken;
pub use self::data::PsychData;
pub use self::experiment::ExperimentType;
pub use self::options::{EstimateType, FitOptions, GridSteps};
pub use self::params::{FreeMask, N_PARAMS, Parameter, PsychParams, pack_free, unpack_free};

/// Convenience re-exports for the core types.
pub mod prelude {
    pub use super::bounds::{ETA_MAX, ParamBounds};
    pub use super::cancel::CancelToken;
    pub use super::data::PsychData;
    pub use super::experiment::ExperimentType;
    pub use super::options::{EstimateType, FitOptions, GridSteps};
    pub use super::params::{FreeMask, N_PARAMS, Parameter, PsychParams};
}
