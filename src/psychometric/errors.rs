//! Errors for psychometric-function fitting (data validation, configuration
//! checks, parameter-domain violations, and pipeline failures).
//!
//! This module defines the fit-level error type [`PsychError`], the
//! configuration error type [`ConfigError`], and the parameter error type
//! [`ParamError`], used across the public API and the internal core. All
//! implement `Display`/`Error`; [`PsychError`] converts to `PyErr` at PyO3
//! boundaries when the `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Indices are 0-based** (match Rust/NumPy).
//! - Trial counts must be **strictly positive**; correct counts must not
//!   exceed trial counts; stimulus levels must be finite.
//! - Pipeline failures carry a [`FitStage`] naming the stage that failed.
//! - Optimizer/backend errors are normalized to
//!   [`PsychError::Optimizer`] with a human-readable status.
#[cfg(feature = "python-bindings")]
use pyo3::exceptions::PyValueError;
#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

use crate::optimization::errors::OptError;

/// Crate-wide result alias for fitting operations that may produce
/// [`PsychError`].
pub type PsychResult<T> = Result<T, PsychError>;

/// Result alias for configuration validation paths that may produce
/// [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result alias for parameter-construction/validation paths that may
/// produce [`ParamError`].
pub type ParamResult<T> = Result<T, ParamError>;

/// Stage of the fitting pipeline that produced a failure.
///
/// Used in error variants so callers can tell whether a degenerate
/// posterior arose during the coarse grid pass, the adaptive border
/// refinement, the final integration, or the optimizer refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStage {
    Configuring,
    GridSearch,
    Integrating,
    Optimizing,
}

impl std::fmt::Display for FitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitStage::Configuring => write!(f, "configuration"),
            FitStage::GridSearch => write!(f, "grid search"),
            FitStage::Integrating => write!(f, "integration"),
            FitStage::Optimizing => write!(f, "optimization"),
        }
    }
}

/// Unified error type for psychometric-function fitting.
///
/// Covers input/data validation, configuration checks, posterior
/// degeneracies, cancellation, and estimation/optimizer failures.
/// Implements `Display`/`Error` and converts to a Python `ValueError` at
/// PyO3 boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum PsychError {
    // ---- Input/data validation ----
    /// Data set contains no blocks.
    EmptyData,

    /// A stimulus level is NaN/±inf.
    NonFiniteLevel { index: usize, value: f64 },

    /// A block has zero trials.
    ZeroTrials { index: usize },

    /// A block reports more correct responses than trials.
    CorrectExceedsTrials { index: usize, correct: u64, trials: u64 },

    /// Data arrays have mismatched lengths.
    DataLengthMismatch { levels: usize, correct: usize, trials: usize },

    /// All stimulus levels are identical, so no range can be inferred.
    DegenerateStimulusRange { value: f64 },

    // ---- Configuration / parameters ----
    /// Configuration validation failed.
    Config(ConfigError),

    /// Parameter-domain validation failed.
    Param(ParamError),

    // ---- Posterior / pipeline invariants ----
    /// Every grid point evaluated to -inf log-posterior.
    DegenerateLikelihood { stage: FitStage },

    /// Posterior mass integrated to zero or a non-finite value.
    ZeroPosteriorMass { stage: FitStage },

    /// The fit was cancelled via its cancellation token.
    Cancelled { stage: FitStage },

    /// A confidence level was requested that the configuration does not hold.
    UnknownConfidenceLevel { level: f64 },

    /// Model hasn't been fitted yet.
    ModelNotFitted,

    // ---- Estimation / optimizer ----
    /// Optimizer failed; includes a human-readable status/reason.
    Optimizer { text: String },

    // ---- Serialization ----
    /// JSON encoding or decoding of a fit result failed.
    Serialization { text: String },
}

impl std::error::Error for PsychError {}

impl std::fmt::Display for PsychError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input/data validation ----
            PsychError::EmptyData => {
                write!(f, "Input data contains no blocks.")
            }
            PsychError::NonFiniteLevel { index, value } => {
                write!(f, "Stimulus level at index {index} is non-finite: {value}")
            }
            PsychError::ZeroTrials { index } => {
                write!(f, "Block at index {index} has zero trials.")
            }
            PsychError::CorrectExceedsTrials { index, correct, trials } => {
                write!(
                    f,
                    "Block at index {index} reports {correct} correct responses out of {trials} trials."
                )
            }
            PsychError::DataLengthMismatch { levels, correct, trials } => {
                write!(
                    f,
                    "Data arrays must have equal length; got {levels} levels, {correct} correct counts, {trials} trial counts."
                )
            }
            PsychError::DegenerateStimulusRange { value } => {
                write!(f, "All stimulus levels equal {value}; cannot infer a stimulus range.")
            }
            // ---- Configuration / parameters ----
            PsychError::Config(err) => write!(f, "{err}"),
            PsychError::Param(err) => write!(f, "{err}"),
            // ---- Posterior / pipeline invariants ----
            PsychError::DegenerateLikelihood { stage } => {
                write!(f, "All grid points have zero likelihood during {stage}.")
            }
            PsychError::ZeroPosteriorMass { stage } => {
                write!(f, "Posterior mass integrated to zero during {stage}.")
            }
            PsychError::Cancelled { stage } => {
                write!(f, "Fit cancelled during {stage}.")
            }
            PsychError::UnknownConfidenceLevel { level } => {
                write!(f, "Confidence level {level} is not among the configured levels.")
            }
            PsychError::ModelNotFitted => {
                write!(f, "Model hasn't been fitted yet.")
            }
            // ---- Estimation / optimizer ----
            PsychError::Optimizer { text } => {
                write!(f, "Optimizer failed with status: {text}")
            }
            // ---- Serialization ----
            PsychError::Serialization { text } => {
                write!(f, "Result serialization failed: {text}")
            }
        }
    }
}

/// Convert a [`PsychError`] into a Python `ValueError` with the error message.
///
/// This is used at the Rust↔Python boundary to surface domain errors cleanly.
#[cfg(feature = "python-bindings")]
impl std::convert::From<PsychError> for PyErr {
    fn from(err: PsychError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<ConfigError> for PsychError {
    fn from(err: ConfigError) -> PsychError {
        PsychError::Config(err)
    }
}

impl From<ParamError> for PsychError {
    fn from(err: ParamError) -> PsychError {
        PsychError::Param(err)
    }
}

impl From<OptError> for PsychError {
    fn from(err: OptError) -> PsychError {
        PsychError::Optimizer { text: err.to_string() }
    }
}

impl From<serde_json::Error> for PsychError {
    fn from(err: serde_json::Error) -> PsychError {
        PsychError::Serialization { text: err.to_string() }
    }
}

/// Errors specific to fit configuration and option validation.
///
/// Typical causes include bounds outside the parameter domain, fixed
/// values that break experiment-type constraints, and malformed grid or
/// confidence settings.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A fixed parameter value lies outside its domain.
    InvalidFixedValue { name: &'static str, value: f64, reason: &'static str },

    /// Fixed lapse and guess rates sum to 1 or more.
    FixedSumOutOfRange { lambda: f64, gamma: f64 },

    /// The guess rate cannot be fixed manually in an nAFC experiment.
    FixedGammaInNafc { n: u32 },

    /// Equal-asymptote experiments cannot fix lapse and guess to
    /// different values.
    UnequalAsymptotes { lambda: f64, gamma: f64 },

    /// An nAFC experiment needs at least two alternatives.
    InvalidAlternatives { n: u32 },

    /// The stimulus range must be finite with min < max.
    InvalidStimulusRange { min: f64, max: f64 },

    /// width_min must be finite and > 0.
    InvalidWidthMin { value: f64 },

    /// A confidence level must lie strictly between 0 and 1.
    InvalidConfidenceLevel { value: f64 },

    /// width_alpha must lie strictly between 0 and 0.5.
    InvalidWidthAlpha { value: f64 },

    /// thresh_pc must lie strictly between 0 and 1.
    InvalidThreshPc { value: f64 },

    /// beta_prior must be finite and >= 1.
    InvalidBetaPrior { value: f64 },

    /// max_bound_value must lie strictly between 0 and 1.
    InvalidBoundValue { value: f64 },

    /// A grid-steps entry must be at least 2 for free parameters.
    InvalidGridSteps { name: &'static str, steps: usize },

    /// refine_max_rounds must be at least 1.
    InvalidRefineRounds { rounds: usize },

    /// A custom bound lies outside the parameter's domain or is inverted.
    BoundsOutOfDomain { name: &'static str, lower: f64, upper: f64 },

    /// An experiment-type string could not be parsed.
    InvalidExperiment { text: String },

    /// A sigmoid name could not be parsed.
    InvalidSigmoidName { text: String },

    /// A parameter name could not be parsed.
    InvalidParameterName { text: String },
}

impl std::error::Error for ConfigError {}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidFixedValue { name, value, reason } => {
                write!(f, "Fixed value for {name} is invalid: {value}. {reason}")
            }
            ConfigError::FixedSumOutOfRange { lambda, gamma } => {
                write!(
                    f,
                    "Fixed lapse ({lambda}) and guess ({gamma}) rates must sum to less than 1."
                )
            }
            ConfigError::FixedGammaInNafc { n } => {
                write!(
                    f,
                    "The guess rate is determined by the number of alternatives in a {n}AFC experiment and cannot be fixed manually."
                )
            }
            ConfigError::UnequalAsymptotes { lambda, gamma } => {
                write!(
                    f,
                    "Equal-asymptote experiments require equal fixed lapse ({lambda}) and guess ({gamma}) rates."
                )
            }
            ConfigError::InvalidAlternatives { n } => {
                write!(f, "An nAFC experiment needs at least 2 alternatives; got {n}.")
            }
            ConfigError::InvalidStimulusRange { min, max } => {
                write!(f, "Stimulus range must be finite with min < max; got [{min}, {max}].")
            }
            ConfigError::InvalidWidthMin { value } => {
                write!(f, "width_min must be finite and > 0; got: {value}")
            }
            ConfigError::InvalidConfidenceLevel { value } => {
                write!(f, "Confidence levels must lie strictly between 0 and 1; got: {value}")
            }
            ConfigError::InvalidWidthAlpha { value } => {
                write!(f, "width_alpha must lie strictly between 0 and 0.5; got: {value}")
            }
            ConfigError::InvalidThreshPc { value } => {
                write!(f, "thresh_pc must lie strictly between 0 and 1; got: {value}")
            }
            ConfigError::InvalidBetaPrior { value } => {
                write!(f, "beta_prior must be finite and >= 1; got: {value}")
            }
            ConfigError::InvalidBoundValue { value } => {
                write!(f, "max_bound_value must lie strictly between 0 and 1; got: {value}")
            }
            ConfigError::InvalidGridSteps { name, steps } => {
                write!(f, "Grid steps for {name} must be at least 2; got: {steps}")
            }
            ConfigError::InvalidRefineRounds { rounds } => {
                write!(f, "refine_max_rounds must be at least 1; got: {rounds}")
            }
            ConfigError::BoundsOutOfDomain { name, lower, upper } => {
                write!(
                    f,
                    "Custom bounds for {name} must be ordered and lie inside the parameter domain; got [{lower}, {upper}]."
                )
            }
            ConfigError::InvalidExperiment { text } => {
                write!(
                    f,
                    "Invalid experiment type: '{text}'. Valid options are 'yes/no', 'equal asymptote' or 'nAFC' (e.g. '2AFC')."
                )
            }
            ConfigError::InvalidSigmoidName { text } => {
                write!(
                    f,
                    "Invalid sigmoid name: '{text}'. Valid options are 'norm', 'logistic' or 'gumbel'."
                )
            }
            ConfigError::InvalidParameterName { text } => {
                write!(
                    f,
                    "Invalid parameter name: '{text}'. Valid options are 'threshold', 'width', 'lambda', 'gamma' or 'eta'."
                )
            }
        }
    }
}

/// Errors specific to parameter construction and validation.
///
/// Typical causes include non-positive widths, rates outside [0, 1), and
/// free-parameter vectors of the wrong length.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// Width must be finite and strictly positive.
    InvalidWidth { value: f64 },

    /// Threshold must be finite.
    InvalidThreshold { value: f64 },

    /// Lapse rate must lie in [0, 1).
    InvalidLambda { value: f64 },

    /// Guess rate must lie in [0, 1).
    InvalidGamma { value: f64 },

    /// Overdispersion must lie in [0, 1).
    InvalidEta { value: f64 },

    /// Lapse and guess rates must sum to less than 1.
    LambdaGammaSum { lambda: f64, gamma: f64 },

    /// A free-parameter vector has the wrong length.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// A free-parameter entry is NaN/±inf.
    NonFiniteTheta { index: usize, value: f64 },
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::InvalidWidth { value } => {
                write!(f, "Width must be finite and > 0; got: {value}")
            }
            ParamError::InvalidThreshold { value } => {
                write!(f, "Threshold must be finite; got: {value}")
            }
            ParamError::InvalidLambda { value } => {
                write!(f, "Lapse rate must lie in [0, 1); got: {value}")
            }
            ParamError::InvalidGamma { value } => {
                write!(f, "Guess rate must lie in [0, 1); got: {value}")
            }
            ParamError::InvalidEta { value } => {
                write!(f, "Overdispersion must lie in [0, 1); got: {value}")
            }
            ParamError::LambdaGammaSum { lambda, gamma } => {
                write!(f, "Lapse ({lambda}) and guess ({gamma}) rates must sum to less than 1.")
            }
            ParamError::ThetaLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Free-parameter vector must have length {expected}; got {actual}."
                )
            }
            ParamError::NonFiniteTheta { index, value } => {
                write!(f, "Free-parameter entry at index {index} is non-finite: {value}")
            }
        }
    }
}
