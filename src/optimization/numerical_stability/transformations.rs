//! Numerical stability utilities.
//!
//! Provides guarded implementations of the numeric primitives that the
//! posterior machinery leans on and that are prone to overflow/underflow in
//! naïve form. The functions here follow explicit-cutoff strategies similar
//! to those in major numerical libraries, keeping `f64` arithmetic in a
//! well-conditioned regime.
//!
//! # Provided items
//! - [`PROB_EPS`]: clamp margin keeping predicted probabilities strictly
//!   inside `(0, 1)` before taking logarithms.
//! - [`clamp_probability(p)`]: clamp a probability into
//!   `[PROB_EPS, 1 − PROB_EPS]`.
//! - [`trapezoid_weights(values)`]: composite trapezoid quadrature weights
//!   for an ordered, possibly irregularly spaced 1-D grid axis.
//!
//! # Rationale
//! The posterior surface is held in log space and contains many `-∞`
//! entries (invalid parameter combinations). Normalization and
//! marginalization must therefore shift by the maximum before
//! exponentiating, and integration must respect the non-uniform spacing
//! produced by adaptive border refinement.

/// Margin by which predicted probabilities are kept away from 0 and 1.
///
/// Binomial log-likelihood terms contain `ln(p)` and `ln(1 − p)`; a
/// predicted probability of exactly 0 or 1 (possible at extreme grid
/// corners) would poison the whole posterior surface with `NaN`. Clamping
/// at 1e-12 keeps the log terms finite while being far below any
/// resolvable effect size.
pub const PROB_EPS: f64 = 1e-12;

/// Clamp a probability into `[PROB_EPS, 1 − PROB_EPS]`.
///
/// `NaN` inputs propagate unchanged so that upstream domain checks (which
/// reject non-finite parameters before probabilities are ever formed)
/// remain the single source of truth for validity.
#[inline]
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROB_EPS, 1.0 - PROB_EPS)
}

/// Composite trapezoid quadrature weights for an ordered 1-D axis.
///
/// For axis values `x₀ ≤ x₁ ≤ … ≤ x_{n−1}`, the weight of an interior
/// point is half the span of its two adjacent cells,
/// `(x_{i+1} − x_{i−1}) / 2`, and each endpoint gets half its single
/// adjacent cell. The weights sum to the total axis range, so integrating
/// a density sampled at the axis points amounts to a weighted sum.
///
/// A single-point axis (collapsed/fixed parameter dimension) gets the
/// neutral weight `[1.0]`, so fixed dimensions do not scale the integral.
pub fn trapezoid_weights(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n <= 1 {
        return vec![1.0];
    }
    let mut weights = vec![0.0; n];
    weights[0] = (values[1] - values[0]) / 2.0;
    weights[n - 1] = (values[n - 1] - values[n - 2]) / 2.0;
    for i in 1..n - 1 {
        weights[i] = (values[i + 1] - values[i - 1]) / 2.0;
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Probability clamping at both boundaries and in the interior.
    // - Trapezoid weight construction for uniform, irregular, and collapsed
    //   axes.
    //
    // They intentionally DO NOT cover:
    // - Posterior normalization as a whole (covered in posterior tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that clamping keeps probabilities strictly inside (0, 1) and
    // leaves interior values untouched.
    fn clamp_probability_bounds_and_interior() {
        assert_eq!(clamp_probability(0.0), PROB_EPS);
        assert_eq!(clamp_probability(1.0), 1.0 - PROB_EPS);
        assert_eq!(clamp_probability(0.37), 0.37);
        assert_eq!(clamp_probability(-5.0), PROB_EPS);
    }

    #[test]
    // Purpose
    // -------
    // Verify trapezoid weights on a uniform axis: endpoints get half a cell,
    // interior points a full cell, and the total equals the axis range.
    fn trapezoid_weights_uniform_axis() {
        let w = trapezoid_weights(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(w, vec![0.5, 1.0, 1.0, 0.5]);
        assert!((w.iter().sum::<f64>() - 3.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify irregular spacing: each interior weight is half the span of its
    // neighboring cells, and the sum still equals the range.
    fn trapezoid_weights_irregular_axis() {
        let w = trapezoid_weights(&[5.0, 6.0, 9.0]);
        assert_eq!(w, vec![0.5, 2.0, 1.5]);
        assert!((w.iter().sum::<f64>() - 4.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A collapsed (fixed-parameter) axis must contribute the neutral weight
    // 1 so it does not rescale the multidimensional integral.
    fn trapezoid_weights_collapsed_axis() {
        assert_eq!(trapezoid_weights(&[0.3]), vec![1.0]);
        assert_eq!(trapezoid_weights(&[]), vec![1.0]);
    }
}
