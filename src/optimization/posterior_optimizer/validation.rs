//! Validation helpers shared across the optimizer layer.
//!
//! Small, single-purpose checks used by the public constructors and the
//! argmin adapter. Each returns a specific [`OptError`] variant so that
//! callers can surface precise diagnostics.
use crate::optimization::{
    errors::{OptError, OptResult},
    posterior_optimizer::{Grad, Theta},
};

/// Verify an optional gradient tolerance.
///
/// # Errors
/// - [`OptError::InvalidTolGrad`] if the value is non-finite or `<= 0`.
pub fn verify_tol_grad(tol_grad: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol_grad {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad {
                tol,
                reason: "Gradient tolerance must be finite.",
            });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad {
                tol,
                reason: "Gradient tolerance must be strictly positive.",
            });
        }
    }
    Ok(())
}

/// Verify an optional cost tolerance.
///
/// # Errors
/// - [`OptError::InvalidTolCost`] if the value is non-finite or `<= 0`.
pub fn verify_tol_cost(tol_cost: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol_cost {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost {
                tol,
                reason: "Cost tolerance must be finite.",
            });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost {
                tol,
                reason: "Cost tolerance must be strictly positive.",
            });
        }
    }
    Ok(())
}

/// Verify an optional initial-simplex scale.
///
/// # Errors
/// - [`OptError::InvalidSimplexScale`] if the value is non-finite or `<= 0`.
pub fn verify_simplex_scale(scale: Option<f64>) -> OptResult<()> {
    if let Some(scale) = scale {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(OptError::InvalidSimplexScale {
                scale,
                reason: "Simplex scale must be finite and strictly positive.",
            });
        }
    }
    Ok(())
}

/// Validate a gradient vector produced by a model or by finite differences.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if the lengths differ.
/// - [`OptError::InvalidGradient`] if any entry is NaN or infinite.
pub fn validate_grad(grad: &Grad, expected_len: usize) -> OptResult<()> {
    if grad.len() != expected_len {
        return Err(OptError::GradientDimMismatch {
            expected: expected_len,
            found: grad.len(),
        });
    }
    for (index, &value) in grad.iter().enumerate() {
        if value.is_nan() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient entries must not be NaN.",
            });
        }
        if value.is_infinite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient entries must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate the best parameter vector reported by a solver.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if the solver produced no parameter.
/// - [`OptError::InvalidThetaHat`] if any entry is NaN or infinite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta_hat = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in theta_hat.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Optimized parameters must be finite.",
            });
        }
    }
    Ok(theta_hat)
}

/// Validate the best objective value reported by a solver.
///
/// NaN is rejected outright; `-∞` is tolerated because penalty-valued
/// outcomes are handled by the caller (grid-MAP fallback).
///
/// # Errors
/// - [`OptError::NonFiniteCost`] if the value is NaN or `+∞`.
pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_nan() || value == f64::INFINITY {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Tolerance checks accept positive finite values and None, and reject
    // zero, negative, NaN and infinite values.
    fn tolerance_checks() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(1e-8)).is_ok());
        assert!(verify_tol_grad(Some(0.0)).is_err());
        assert!(verify_tol_cost(Some(f64::INFINITY)).is_err());
        assert!(verify_simplex_scale(Some(-0.1)).is_err());
        assert!(verify_simplex_scale(Some(0.05)).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Gradient validation must flag dimension mismatches and non-finite
    // entries with the offending index.
    fn gradient_checks() {
        let grad = array![1.0, f64::NAN];
        match validate_grad(&grad, 2).unwrap_err() {
            OptError::InvalidGradient { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            validate_grad(&array![1.0], 2).unwrap_err(),
            OptError::GradientDimMismatch { expected: 2, found: 1 }
        ));
        assert!(validate_grad(&array![1.0, -2.0], 2).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // theta_hat validation rejects missing and non-finite vectors, and
    // value validation tolerates -inf but rejects NaN and +inf.
    fn outcome_checks() {
        assert!(matches!(validate_theta_hat(None).unwrap_err(), OptError::MissingThetaHat));
        assert!(validate_theta_hat(Some(array![0.0, f64::INFINITY])).is_err());
        assert!(validate_theta_hat(Some(array![0.0, 1.0])).is_ok());
        assert!(validate_value(f64::NEG_INFINITY).is_ok());
        assert!(validate_value(f64::NAN).is_err());
        assert!(validate_value(f64::INFINITY).is_err());
    }
}
