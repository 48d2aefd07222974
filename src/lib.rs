//! rust_psychometrics — Bayesian psychometric-function fitting with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the fitting engine to Python via the `_rust_psychometrics`
//! extension module. When the `python-bindings` feature is enabled, this
//! module defines the Python-facing classes and submodules used by the
//! `rust_psychometrics` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`psychometric` and `optimization`)
//!   as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for
//!   the `_rust_psychometrics` Python extension.
//! - Register the `psychometric` submodule under `rust_psychometrics` so
//!   that dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work lives in the inner Rust modules; this file
//!   performs only FFI glue, input validation, and error mapping.
//! - When `python-bindings` is enabled, the Python-visible types mirror
//!   the invariants and signatures of their Rust counterparts
//!   (e.g. [`PsychModel`], [`FitResult`]).
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_psychometrics.psychometric`
//!   and are typically wrapped by thin pure-Python facades in the
//!   top-level `rust_psychometrics` package.
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `PyErr` values at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on the inner modules and can
//!   ignore the PyO3 items guarded by the `python-bindings` feature.
//! - The Python packaging layer imports the `_rust_psychometrics` module
//!   defined here and wraps its classes in user-facing Python APIs.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner
//!   modules and by the integration tests under `tests/`.
//! - Smoke tests for the PyO3 bindings verify that classes can be
//!   constructed, called, and round-tripped correctly from Python.

pub mod optimization;
pub mod psychometric;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use std::str::FromStr;

#[cfg(feature = "python-bindings")]
use crate::{
    psychometric::{
        core::params::{Parameter, PsychParams},
        errors::PsychError,
        models::psychfit::PsychModel,
        result::FitResult,
    },
    utils::{build_fit_options, extract_psych_data},
};

/// PsychometricEstimate — fitted parameter values exposed to Python.
///
/// Purpose
/// -------
/// Provide read-only Python access to one point estimate of the five
/// model parameters.
///
/// Key behaviors
/// -------------
/// - Expose `threshold`, `width`, `lapse`, `guess`, and `overdispersion`
///   as copy-on-access properties.
///
/// Notes
/// -----
/// - Instances are created by the result getters; Rust callers should use
///   [`PsychParams`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_psychometrics.psychometric")]
pub struct PsychometricEstimate {
    /// Validated parameter values from the fit.
    inner: PsychParams,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PsychometricEstimate {
    /// Stimulus level at the threshold performance proportion.
    #[getter]
    pub fn threshold(&self) -> f64 {
        self.inner.threshold
    }

    /// Spread of the sigmoid between the width-alpha quantiles.
    #[getter]
    pub fn width(&self) -> f64 {
        self.inner.width
    }

    /// Lapse rate λ (upper-asymptote shortfall).
    #[getter]
    pub fn lapse(&self) -> f64 {
        self.inner.lambda
    }

    /// Guess rate γ (lower asymptote).
    #[getter]
    pub fn guess(&self) -> f64 {
        self.inner.gamma
    }

    /// Overdispersion η of the beta-binomial observation model.
    #[getter]
    pub fn overdispersion(&self) -> f64 {
        self.inner.eta
    }

    /// All five values as `[threshold, width, lapse, guess, eta]`.
    pub fn to_list(&self) -> Vec<f64> {
        self.inner.to_array().to_vec()
    }
}

/// PsychometricResult — completed fit exposed to Python.
///
/// Purpose
/// -------
/// Present the [`FitResult`] record to Python code in a lightweight,
/// read-only wrapper.
///
/// Key behaviors
/// -------------
/// - Expose MAP and posterior-mean estimates, deviance, credible
///   intervals and the derived threshold/slope/curve queries.
/// - Round-trip the full record through JSON strings.
///
/// Notes
/// -----
/// - This type is part of the Python FFI surface; Rust code should
///   prefer [`FitResult`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_psychometrics.psychometric")]
pub struct PsychometricResult {
    /// Full fit record.
    inner: FitResult,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PsychometricResult {
    /// Maximum a-posteriori estimate.
    #[getter]
    pub fn estimate_map(&self) -> PsychometricEstimate {
        PsychometricEstimate { inner: self.inner.estimate_map }
    }

    /// Posterior-mean estimate.
    #[getter]
    pub fn estimate_mean(&self) -> PsychometricEstimate {
        PsychometricEstimate { inner: self.inner.estimate_mean }
    }

    /// Deviance of the selected estimate.
    #[getter]
    pub fn deviance(&self) -> f64 {
        self.inner.deviance
    }

    /// Confidence levels credible intervals were computed for.
    #[getter]
    pub fn confidence_levels(&self) -> Vec<f64> {
        self.inner.confidence_intervals.iter().map(|(level, _)| *level).collect()
    }

    /// Credible interval for `parameter` at a configured `level`.
    #[pyo3(text_signature = "(self, level, parameter, /)")]
    pub fn confidence_interval(&self, level: f64, parameter: &str) -> PyResult<(f64, f64)> {
        let param = Parameter::from_str(parameter).map_err(PsychError::from)?;
        Ok(self.inner.confidence_interval(level, param)?)
    }

    /// Marginal posterior mass over the final grid axis of `parameter`,
    /// as `(values, mass)`.
    #[pyo3(text_signature = "(self, parameter, /)")]
    pub fn marginal(&self, parameter: &str) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let param = Parameter::from_str(parameter).map_err(PsychError::from)?;
        Ok((
            self.inner.parameter_values.get(param).clone(),
            self.inner.marginal_mass.get(param).clone(),
        ))
    }

    /// Stimulus level where the fitted curve reaches `proportion_correct`.
    #[pyo3(
        signature = (proportion_correct, unscaled = false),
        text_signature = "(self, proportion_correct, /, unscaled=False)"
    )]
    pub fn threshold_at(
        &self, proportion_correct: f64, unscaled: bool,
    ) -> PyResult<(f64, Vec<(f64, (f64, f64))>)> {
        Ok(self.inner.threshold_at(proportion_correct, unscaled)?)
    }

    /// Derivative of the fitted scaled curve at stimulus level `x`.
    #[pyo3(text_signature = "(self, x, /)")]
    pub fn slope_at(&self, x: f64) -> f64 {
        self.inner.slope_at(x)
    }

    /// Value of the fitted scaled curve at stimulus level `x`.
    #[pyo3(text_signature = "(self, x, /)")]
    pub fn curve_at(&self, x: f64) -> f64 {
        self.inner.curve_at(x)
    }

    /// Serialize the full record to a JSON string.
    pub fn to_json(&self) -> PyResult<String> {
        Ok(self.inner.to_json()?)
    }

    /// Rebuild a result from [`PsychometricResult::to_json`] output.
    #[staticmethod]
    pub fn from_json(text: &str) -> PyResult<PsychometricResult> {
        Ok(PsychometricResult { inner: FitResult::from_json(text)? })
    }
}

/// Psychometric — Python-facing wrapper for the fitting engine.
///
/// Purpose
/// -------
/// Expose the [`PsychModel`] API to Python callers while preserving the
/// core Rust invariants and error handling.
///
/// Key behaviors
/// -------------
/// - Build a [`PsychModel`] from Python-friendly keyword arguments.
/// - Provide a `fit` method that converts Python arrays into
///   [`crate::psychometric::core::data::PsychData`] and delegates to the
///   core implementation.
/// - Cache the fit result for inspection via the `results` property.
///
/// Notes
/// -----
/// - Rust callers should use [`PsychModel`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_psychometrics.psychometric")]
pub struct Psychometric {
    /// Fully configured model, owning the cached fit result.
    inner: PsychModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl Psychometric {
    #[new]
    #[pyo3(
        signature = (
            sigmoid = None,
            experiment = None,
            estimate_type = None,
            confidence_levels = None,
            fixed_lapse = None,
            fixed_guess = None,
            fixed_overdispersion = None,
            beta_prior = None,
            width_alpha = None,
            thresh_pc = None,
            stimulus_range = None,
            width_min = None,
            optim_method = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            verbose = None,
        ),
        text_signature = "(sigmoid='norm', experiment='yes/no', /, estimate_type='map', \
                          confidence_levels=(0.95, 0.9, 0.68), fixed_lapse=None, \
                          fixed_guess=None, fixed_overdispersion=None, beta_prior=10.0, \
                          width_alpha=0.05, thresh_pc=0.5, stimulus_range=None, \
                          width_min=None, optim_method='neldermead', tol_grad=None, \
                          tol_cost=None, max_iter=None, verbose=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sigmoid: Option<&str>, experiment: Option<&str>, estimate_type: Option<&str>,
        confidence_levels: Option<Vec<f64>>, fixed_lapse: Option<f64>,
        fixed_guess: Option<f64>, fixed_overdispersion: Option<f64>, beta_prior: Option<f64>,
        width_alpha: Option<f64>, thresh_pc: Option<f64>, stimulus_range: Option<(f64, f64)>,
        width_min: Option<f64>, optim_method: Option<&str>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, verbose: Option<bool>,
    ) -> PyResult<Psychometric> {
        let options = build_fit_options(
            sigmoid,
            experiment,
            estimate_type,
            confidence_levels,
            fixed_lapse,
            fixed_guess,
            fixed_overdispersion,
            beta_prior,
            width_alpha,
            thresh_pc,
            stimulus_range,
            width_min,
            optim_method,
            tol_grad,
            tol_cost,
            max_iter,
            verbose,
        )?;
        let inner = PsychModel::new(options)?;
        Ok(Psychometric { inner })
    }

    /// Fit the model to blocked data.
    ///
    /// `levels`, `correct`, and `trials` are parallel 1-D arrays; each
    /// index is one block of trials at one stimulus level.
    #[pyo3(text_signature = "(self, levels, correct, trials, /)")]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, levels: &Bound<'py, PyAny>, correct: &Bound<'py, PyAny>,
        trials: &Bound<'py, PyAny>,
    ) -> PyResult<PsychometricResult> {
        let data = extract_psych_data(py, levels, correct, trials)?;
        let result = self.inner.fit(&data)?;
        Ok(PsychometricResult { inner: result.clone() })
    }

    /// Result of the most recent fit.
    #[getter]
    pub fn results(&self) -> PyResult<PsychometricResult> {
        match self.inner.results() {
            Ok(result) => Ok(PsychometricResult { inner: result.clone() }),
            Err(err) => Err(err.into()),
        }
    }
}

/// One-call fit from Python, mirroring [`crate::psychometric::models::fit`].
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    signature = (levels, correct, trials, sigmoid = None, experiment = None),
    text_signature = "(levels, correct, trials, /, sigmoid='norm', experiment='yes/no')"
)]
fn fit_psychometric<'py>(
    py: Python<'py>, levels: &Bound<'py, PyAny>, correct: &Bound<'py, PyAny>,
    trials: &Bound<'py, PyAny>, sigmoid: Option<&str>, experiment: Option<&str>,
) -> PyResult<PsychometricResult> {
    let data = extract_psych_data(py, levels, correct, trials)?;
    if data.is_empty() {
        return Err(PyValueError::new_err("data must not be empty"));
    }
    let options = build_fit_options(
        sigmoid, experiment, None, None, None, None, None, None, None, None, None, None, None,
        None, None, None, None,
    )?;
    let result = crate::psychometric::models::fit(&data, options)?;
    Ok(PsychometricResult { inner: result })
}

/// _rust_psychometrics — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_psychometrics` Python module and register the
/// `psychometric` submodule used by the public `rust_psychometrics`
/// package.
///
/// Notes
/// -----
/// - Invoked automatically by Python when importing the compiled
///   extension; not called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_psychometrics<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let psychometric_mod = PyModule::new(_py, "psychometric")?;
    psychometric(_py, m, &psychometric_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_psychometrics.psychometric", psychometric_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn psychometric<'py>(
    _py: Python, rust_psychometrics: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<Psychometric>()?;
    m.add_class::<PsychometricResult>()?;
    m.add_class::<PsychometricEstimate>()?;
    m.add_function(wrap_pyfunction!(fit_psychometric, m)?)?;
    rust_psychometrics.add_submodule(m)?;
    Ok(())
}
