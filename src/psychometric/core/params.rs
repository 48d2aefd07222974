//! Parameter vocabulary and validated parameter sets.
//!
//! Purpose
//! -------
//! Define the five psychometric parameters, their canonical axis order,
//! and the validated [`PsychParams`] record used throughout the grid,
//! likelihood, and result layers. Also provides the packing helpers that
//! map between full parameter sets and the free-parameter vectors seen by
//! the optimizer.
//!
//! Key behaviors
//! -------------
//! - [`Parameter`] enumerates the axes in their canonical order:
//!   threshold, width, lambda (lapse), gamma (guess), eta
//!   (overdispersion).
//! - [`PsychParams`] validates domain constraints on construction.
//! - [`pack_free`] / [`unpack_free`] translate between a full parameter
//!   set and the free subvector selected by a fixed-parameter mask.
//!
//! Invariants & assumptions
//! ------------------------
//! - Axis order is fixed and shared by every 5-D surface in the crate;
//!   `Parameter::index` is the single source of truth for it.
//! - `width > 0`; `lambda`, `gamma`, `eta` each lie in `[0, 1)`;
//!   `lambda + gamma < 1`.
//!
//! Conventions
//! -----------
//! - A "free mask" is `[bool; N_PARAMS]` with `true` marking parameters
//!   the optimizer may move; fixed parameters keep their grid value.
//!
//! Downstream usage
//! ----------------
//! - The grid builds one axis per [`Parameter`]; the model layer packs
//!   the grid MAP into a free vector, refines it, and unpacks the result.
//!
//! Testing notes
//! -------------
//! - Unit tests cover name round-trips, domain validation, and the
//!   pack/unpack inverse relationship.
use crate::psychometric::errors::{ConfigError, ParamError, ParamResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of psychometric parameters (axes of the posterior grid).
pub const N_PARAMS: usize = 5;

/// One of the five psychometric parameters, in canonical axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Stimulus level at which the sigmoid reaches `thresh_pc` of its
    /// unscaled range.
    Threshold,
    /// Spread of the sigmoid between its `width_alpha` and
    /// `1 - width_alpha` quantiles.
    Width,
    /// Lapse rate: upper-asymptote shortfall.
    Lambda,
    /// Guess rate: lower asymptote.
    Gamma,
    /// Overdispersion of the beta-binomial observation model.
    Eta,
}

impl Parameter {
    /// All parameters in canonical axis order.
    pub const ALL: [Parameter; N_PARAMS] =
        [Parameter::Threshold, Parameter::Width, Parameter::Lambda, Parameter::Gamma, Parameter::Eta];

    /// Axis index of this parameter in every 5-D surface.
    pub fn index(self) -> usize {
        match self {
            Parameter::Threshold => 0,
            Parameter::Width => 1,
            Parameter::Lambda => 2,
            Parameter::Gamma => 3,
            Parameter::Eta => 4,
        }
    }

    /// Lower-case name used in options, errors, and serialized results.
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Threshold => "threshold",
            Parameter::Width => "width",
            Parameter::Lambda => "lambda",
            Parameter::Gamma => "gamma",
            Parameter::Eta => "eta",
        }
    }
}

impl FromStr for Parameter {
    type Err = ConfigError;

    /// Parse a parameter name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "threshold" => Ok(Parameter::Threshold),
            "width" => Ok(Parameter::Width),
            "lambda" => Ok(Parameter::Lambda),
            "gamma" => Ok(Parameter::Gamma),
            "eta" => Ok(Parameter::Eta),
            _ => Err(ConfigError::InvalidParameterName { text: s.to_string() }),
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Mask over the canonical axes; `true` marks a free parameter.
pub type FreeMask = [bool; N_PARAMS];

/// Validated full set of psychometric parameters.
///
/// Fields
/// ------
/// - `threshold`: finite stimulus level.
/// - `width`: finite, strictly positive spread.
/// - `lambda`, `gamma`: rates in `[0, 1)` with `lambda + gamma < 1`.
/// - `eta`: overdispersion in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsychParams {
    pub threshold: f64,
    pub width: f64,
    pub lambda: f64,
    pub gamma: f64,
    pub eta: f64,
}

impl PsychParams {
    /// Construct a validated parameter set.
    ///
    /// # Errors
    /// - `ParamError::InvalidThreshold` for a non-finite threshold.
    /// - `ParamError::InvalidWidth` for a non-finite or non-positive width.
    /// - `ParamError::InvalidLambda` / `InvalidGamma` / `InvalidEta` for
    ///   rates outside `[0, 1)`.
    /// - `ParamError::LambdaGammaSum` when `lambda + gamma >= 1`.
    pub fn new(
        threshold: f64, width: f64, lambda: f64, gamma: f64, eta: f64,
    ) -> ParamResult<Self> {
        if !threshold.is_finite() {
            return Err(ParamError::InvalidThreshold { value: threshold });
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(ParamError::InvalidWidth { value: width });
        }
        if !lambda.is_finite() || !(0.0..1.0).contains(&lambda) {
            return Err(ParamError::InvalidLambda { value: lambda });
        }
        if !gamma.is_finite() || !(0.0..1.0).contains(&gamma) {
            return Err(ParamError::InvalidGamma { value: gamma });
        }
        if !eta.is_finite() || !(0.0..1.0).contains(&eta) {
            return Err(ParamError::InvalidEta { value: eta });
        }
        if lambda + gamma >= 1.0 {
            return Err(ParamError::LambdaGammaSum { lambda, gamma });
        }
        Ok(PsychParams { threshold, width, lambda, gamma, eta })
    }

    /// Value of the given parameter.
    pub fn get(&self, param: Parameter) -> f64 {
        match param {
            Parameter::Threshold => self.threshold,
            Parameter::Width => self.width,
            Parameter::Lambda => self.lambda,
            Parameter::Gamma => self.gamma,
            Parameter::Eta => self.eta,
        }
    }

    /// Set the given parameter without re-validating. Callers that accept
    /// untrusted values should rebuild via [`PsychParams::new`].
    pub fn set(&mut self, param: Parameter, value: f64) {
        match param {
            Parameter::Threshold => self.threshold = value,
            Parameter::Width => self.width = value,
            Parameter::Lambda => self.lambda = value,
            Parameter::Gamma => self.gamma = value,
            Parameter::Eta => self.eta = value,
        }
    }

    /// Values in canonical axis order.
    pub fn to_array(&self) -> [f64; N_PARAMS] {
        [self.threshold, self.width, self.lambda, self.gamma, self.eta]
    }

    /// Whether every field satisfies the domain constraints checked by
    /// [`PsychParams::new`].
    pub fn in_domain(&self) -> bool {
        PsychParams::new(self.threshold, self.width, self.lambda, self.gamma, self.eta).is_ok()
    }
}

/// Extract the free subvector of `params` selected by `mask`, in canonical
/// axis order.
pub fn pack_free(params: &PsychParams, mask: &FreeMask) -> Array1<f64> {
    let mut free = Vec::with_capacity(N_PARAMS);
    for param in Parameter::ALL {
        if mask[param.index()] {
            free.push(params.get(param));
        }
    }
    Array1::from(free)
}

/// Rebuild a full parameter set from a free subvector, taking fixed values
/// from `base`.
///
/// # Errors
/// - `ParamError::ThetaLengthMismatch` when `theta` does not match the
///   number of free parameters in `mask`.
/// - `ParamError::NonFiniteTheta` for NaN/±∞ entries.
pub fn unpack_free(
    theta: &Array1<f64>, base: &PsychParams, mask: &FreeMask,
) -> ParamResult<PsychParams> {
    let expected = mask.iter().filter(|&&free| free).count();
    if theta.len() != expected {
        return Err(ParamError::ThetaLengthMismatch { expected, actual: theta.len() });
    }
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(ParamError::NonFiniteTheta { index, value });
        }
    }
    let mut params = *base;
    let mut cursor = 0;
    for param in Parameter::ALL {
        if mask[param.index()] {
            params.set(param, theta[cursor]);
            cursor += 1;
        }
    }
    Ok(params)
}
