#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::posterior_optimizer::traits::{MapOptions, OptimMethod, Tolerances},
    psychometric::{
        core::{
            data::PsychData,
            experiment::ExperimentType,
            options::{EstimateType, FitOptions},
        },
        errors::PsychError,
        sigmoid::SigmoidKind,
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

#[cfg(feature = "python-bindings")]
fn extract_u64_vec<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Vec<u64>> {
    if let Ok(vec) = raw_data.extract::<Vec<u64>>() {
        return Ok(vec);
    }
    // Count columns often arrive as float arrays from numpy/pandas.
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous array or sequence"))
    })?;
    slice
        .iter()
        .map(|&v| {
            if v >= 0.0 && v.fract() == 0.0 && v.is_finite() {
                Ok(v as u64)
            } else {
                Err(PyValueError::new_err(format!(
                    "{name} must contain non-negative integers, got {v}"
                )))
            }
        })
        .collect()
}

#[cfg(feature = "python-bindings")]
pub fn extract_psych_data<'py>(
    py: Python<'py>, levels: &Bound<'py, PyAny>, correct: &Bound<'py, PyAny>,
    trials: &Bound<'py, PyAny>,
) -> PyResult<PsychData> {
    let levels_arr = extract_f64_array(py, levels)?;
    let levels_slice = levels_arr.as_slice().map_err(|_| {
        PyValueError::new_err("levels must be a 1-D contiguous float64 array or sequence")
    })?;
    let levels_vec = Array1::from(levels_slice.to_vec());
    let correct_vec = Array1::from(extract_u64_vec(py, correct, "correct")?);
    let trials_vec = Array1::from(extract_u64_vec(py, trials, "trials")?);
    PsychData::new(levels_vec, correct_vec, trials_vec).map_err(PyErr::from)
}

#[cfg(feature = "python-bindings")]
pub fn build_fit_options(
    sigmoid: Option<&str>, experiment: Option<&str>, estimate_type: Option<&str>,
    confidence_levels: Option<Vec<f64>>, fixed_lambda: Option<f64>, fixed_gamma: Option<f64>,
    fixed_eta: Option<f64>, beta_prior: Option<f64>, width_alpha: Option<f64>,
    thresh_pc: Option<f64>, stimulus_range: Option<(f64, f64)>, width_min: Option<f64>,
    optim_method: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>,
    max_iter: Option<usize>, verbose: Option<bool>,
) -> PyResult<FitOptions> {
    use std::str::FromStr;

    use crate::psychometric::core::params::Parameter;

    let mut options = FitOptions::default();
    if let Some(name) = sigmoid {
        options.sigmoid = SigmoidKind::from_str(name).map_err(PsychError::from)?;
    }
    if let Some(name) = experiment {
        options.experiment = ExperimentType::from_str(name).map_err(PsychError::from)?;
    }
    if let Some(name) = estimate_type {
        options.estimate_type = EstimateType::from_str(name).map_err(PsychError::from)?;
    }
    if let Some(levels) = confidence_levels {
        options.confidence_levels = levels;
    }
    options.fixed[Parameter::Lambda.index()] = fixed_lambda;
    options.fixed[Parameter::Gamma.index()] = fixed_gamma;
    options.fixed[Parameter::Eta.index()] = fixed_eta;
    if let Some(b) = beta_prior {
        options.beta_prior = b;
    }
    if let Some(alpha) = width_alpha {
        options.width_alpha = alpha;
    }
    if let Some(pc) = thresh_pc {
        options.thresh_pc = pc;
    }
    options.stimulus_range = stimulus_range;
    options.width_min = width_min;
    options.optim = extract_map_options(optim_method, tol_grad, tol_cost, max_iter, verbose)?;
    options.verbose = verbose.unwrap_or(false);

    options.validate().map_err(PsychError::from)?;
    Ok(options)
}

#[cfg(feature = "python-bindings")]
fn extract_map_options(
    method: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    verbose: Option<bool>,
) -> PyResult<MapOptions> {
    use std::str::FromStr;

    use crate::psychometric::errors::PsychError;

    let defaults = MapOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost.or(defaults.tols.tol_cost),
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(PsychError::from)?;
    let method = match method {
        Some(name) => OptimMethod::from_str(name).map_err(PsychError::from)?,
        None => OptimMethod::NelderMead,
    };
    MapOptions::new(tols, method, verbose.unwrap_or(false), None, None)
        .map_err(PsychError::from)
        .map_err(PyErr::from)
}
