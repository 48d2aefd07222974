//! Posterior integration and summarization over the 5-D parameter grid.
//!
//! Purpose
//! -------
//! Turn a log-posterior surface into normalized probability masses and
//! the summaries reported in a fit result: marginals, point estimates,
//! credible intervals, and the deviance goodness-of-fit statistic.
//!
//! Key behaviors
//! -------------
//! - [`integral_weights`] builds the 5-D trapezoid volume element as the
//!   outer product of per-axis quadrature weights, so irregular axis
//!   spacings (the squared-spaced overdispersion axis in particular)
//!   integrate correctly.
//! - [`normalized_weights`] exponentiates a log-surface stably
//!   (max-shifted), multiplies in the volume element, and normalizes to
//!   unit mass, diagnosing degenerate surfaces.
//! - [`marginal`] pools mass onto one axis; [`credible_interval`] finds
//!   the shortest contiguous axis span holding the requested mass.
//! - [`map_index`] and [`mean_estimate`] are the two point summaries.
//! - [`deviance`] scores a point estimate against the saturated model.
//!
//! Invariants & assumptions
//! ------------------------
//! - Surfaces and axes come from the same grid: `surface.shape()[d] ==
//!   axes[d].len()` for every axis.
//! - Normalized weights sum to one; marginals of normalized weights sum
//!   to one.
//!
//! Conventions
//! -----------
//! - Credible intervals are minimal contiguous spans of grid mass, not
//!   equal-tailed quantiles; when the total mass falls short of the
//!   requested level the full axis span is returned.
//! - Deviance is computed under the binomial observation model; the
//!   overdispersion parameter describes the observation noise and is not
//!   part of the mean structure being scored.
//!
//! Downstream usage
//! ----------------
//! - The grid's border refinement uses [`normalized_weights`] and
//!   [`marginal`]; the model layer uses everything here to assemble the
//!   fit result.
//!
//! Testing notes
//! -------------
//! - Unit tests use small hand-checkable surfaces (uniform and
//!   single-peak) where masses, marginals, and interval spans can be
//!   verified by inspection.
use crate::{
    optimization::numerical_stability::transformations::trapezoid_weights,
    psychometric::{
        core::{
            data::PsychData,
            experiment::ExperimentType,
            params::{N_PARAMS, Parameter, PsychParams},
        },
        errors::{FitStage, PsychError, PsychResult},
        likelihood::{log_likelihood, saturated_log_likelihood},
        sigmoid::Sigmoid,
    },
};
use ndarray::{Array1, Array5, Axis};

/// 5-D quadrature volume element: outer product of per-axis trapezoid
/// weights. Collapsed axes contribute a factor of one.
pub fn integral_weights(axes: &[&[f64]; N_PARAMS]) -> Array5<f64> {
    let per_axis: Vec<Vec<f64>> = axes.iter().map(|axis| trapezoid_weights(axis)).collect();
    let shape = [
        per_axis[0].len(),
        per_axis[1].len(),
        per_axis[2].len(),
        per_axis[3].len(),
        per_axis[4].len(),
    ];
    Array5::from_shape_fn(shape, |(i, j, k, l, m)| {
        per_axis[0][i] * per_axis[1][j] * per_axis[2][k] * per_axis[3][l] * per_axis[4][m]
    })
}

/// Normalized posterior masses from a log-density surface.
///
/// Exponentiation is shifted by the finite maximum for stability; each
/// cell is weighted by its quadrature volume and the whole array is
/// normalized to unit mass.
///
/// # Errors
/// - `PsychError::DegenerateLikelihood` when every cell is `-∞`.
/// - `PsychError::ZeroPosteriorMass` when the total mass underflows to
///   zero or is non-finite.
pub fn normalized_weights(
    log_surface: &Array5<f64>, axes: &[&[f64]; N_PARAMS], stage: FitStage,
) -> PsychResult<Array5<f64>> {
    let max = log_surface.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return Err(PsychError::DegenerateLikelihood { stage });
    }
    let volume = integral_weights(axes);
    let mut weights = Array5::zeros(log_surface.raw_dim());
    ndarray::Zip::from(&mut weights)
        .and(log_surface)
        .and(&volume)
        .for_each(|w, &lp, &v| *w = (lp - max).exp() * v);
    let total: f64 = weights.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(PsychError::ZeroPosteriorMass { stage });
    }
    weights.mapv_inplace(|w| w / total);
    Ok(weights)
}

/// Pool normalized mass onto one parameter axis.
pub fn marginal(weights: &Array5<f64>, param: Parameter) -> Array1<f64> {
    let mut pooled = weights.clone().into_dyn();
    // Sum out every other axis, highest first so indices stay valid.
    for axis in (0..N_PARAMS).rev() {
        if axis != param.index() {
            pooled = pooled.sum_axis(Axis(axis));
        }
    }
    pooled.into_dimensionality().expect("marginal pooling leaves one axis")
}

/// Grid coordinates of the log-density maximum.
pub fn map_index(log_surface: &Array5<f64>) -> [usize; N_PARAMS] {
    let mut best = f64::NEG_INFINITY;
    let mut best_idx = [0usize; N_PARAMS];
    for (idx, &lp) in log_surface.indexed_iter() {
        if lp > best {
            best = lp;
            best_idx = [idx.0, idx.1, idx.2, idx.3, idx.4];
        }
    }
    best_idx
}

/// Posterior-mean parameter set: per-axis expectation under the
/// normalized masses.
///
/// A collapsed axis returns its single grid value bit-exactly, so fixed
/// parameters never pick up rounding from the pooled mass.
pub fn mean_estimate(weights: &Array5<f64>, axes: &[&[f64]; N_PARAMS]) -> PsychParams {
    let mut means = [0.0; N_PARAMS];
    for param in Parameter::ALL {
        let axis = axes[param.index()];
        if axis.len() == 1 {
            means[param.index()] = axis[0];
            continue;
        }
        let pooled = marginal(weights, param);
        let total: f64 = pooled.iter().sum();
        let weighted: f64 =
            pooled.iter().zip(axis.iter()).map(|(&mass, &value)| mass * value).sum();
        means[param.index()] = weighted / total;
    }
    PsychParams {
        threshold: means[0],
        width: means[1],
        lambda: means[2],
        gamma: means[3],
        eta: means[4],
    }
}

/// Shortest contiguous axis span holding at least `level` of the marginal
/// mass.
///
/// Returns `(axis[first], axis[last])` of the chosen window. Ties go to
/// the earliest window; if the total mass falls short of `level` the full
/// axis span is returned. A collapsed axis yields its single point twice.
pub fn credible_interval(marginal_mass: &[f64], axis: &[f64], level: f64) -> (f64, f64) {
    let n = axis.len();
    if n == 1 {
        return (axis[0], axis[0]);
    }
    let total: f64 = marginal_mass.iter().sum();
    if total < level {
        return (axis[0], axis[n - 1]);
    }

    let mut best: Option<(usize, usize)> = None;
    let mut best_span = f64::INFINITY;
    let mut lo = 0;
    let mut acc = 0.0;
    for hi in 0..n {
        acc += marginal_mass[hi];
        while acc - marginal_mass[lo] >= level && lo < hi {
            acc -= marginal_mass[lo];
            lo += 1;
        }
        if acc >= level {
            let span = axis[hi] - axis[lo];
            if span < best_span {
                best_span = span;
                best = Some((lo, hi));
            }
        }
    }
    match best {
        Some((lo, hi)) => (axis[lo], axis[hi]),
        None => (axis[0], axis[n - 1]),
    }
}

/// Deviance of a point estimate: `2 (ℓ_sat - ℓ_fit)` under the binomial
/// observation model.
pub fn deviance(
    data: &PsychData, sigmoid: &dyn Sigmoid, experiment: ExperimentType, estimate: &PsychParams,
) -> f64 {
    let mut binomial = *estimate;
    binomial.eta = 0.0;
    let fit = log_likelihood(data, sigmoid, experiment, &binomial);
    2.0 * (saturated_log_likelihood(data) - fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Volume-element structure for mixed regular/collapsed axes.
    // - Stable normalization and its degenerate-surface diagnostics.
    // - Marginal pooling, MAP/mean summaries, and minimal-span intervals.
    //
    // They intentionally DO NOT cover:
    // - The full fit pipeline (integration tests).
    // -------------------------------------------------------------------------

    fn axes_2x3(thr: &'static [f64], width: &'static [f64]) -> [&'static [f64]; N_PARAMS] {
        [thr, width, &[0.0], &[0.0], &[0.0]]
    }

    #[test]
    // Purpose
    // -------
    // The volume element of a 2x3 grid with collapsed trailing axes is
    // the outer product of the two trapezoid weight vectors.
    //
    // Given
    // -----
    // - threshold axis [0, 1], width axis [0, 1, 2].
    //
    // Expect
    // ------
    // - Weights [[0.25, 0.5, 0.25], [0.25, 0.5, 0.25]] (0.5 x {0.5,1,0.5}).
    fn integral_weights_outer_product() {
        let axes = axes_2x3(&[0.0, 1.0], &[0.0, 1.0, 2.0]);
        let volume = integral_weights(&axes);
        assert_eq!(volume.shape(), &[2, 3, 1, 1, 1]);
        for i in 0..2 {
            assert!((volume[[i, 0, 0, 0, 0]] - 0.25).abs() < 1e-12);
            assert!((volume[[i, 1, 0, 0, 0]] - 0.5).abs() < 1e-12);
            assert!((volume[[i, 2, 0, 0, 0]] - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // A flat log-surface must normalize to masses proportional to the
    // volume element, summing to one.
    fn normalized_weights_flat_surface() {
        let axes = axes_2x3(&[0.0, 1.0], &[0.0, 1.0, 2.0]);
        let surface = Array5::from_elem((2, 3, 1, 1, 1), -5.0);
        let weights = normalized_weights(&surface, &axes, FitStage::Integrating).unwrap();
        assert!((weights.sum() - 1.0).abs() < 1e-12);
        // Interior width points carry double the endpoint mass.
        assert!(
            (weights[[0, 1, 0, 0, 0]] / weights[[0, 0, 0, 0, 0]] - 2.0).abs() < 1e-12
        );
    }

    #[test]
    // Purpose
    // -------
    // An all -inf surface is a degenerate likelihood, reported with the
    // stage that produced it.
    fn normalized_weights_rejects_degenerate_surface() {
        let axes = axes_2x3(&[0.0, 1.0], &[0.0, 1.0, 2.0]);
        let surface = Array5::from_elem((2, 3, 1, 1, 1), f64::NEG_INFINITY);
        assert!(matches!(
            normalized_weights(&surface, &axes, FitStage::GridSearch).unwrap_err(),
            PsychError::DegenerateLikelihood { stage: FitStage::GridSearch }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Marginals pool onto the requested axis and sum to one; the MAP
    // index points at the surface maximum; the mean matches the
    // marginal-weighted axis values.
    fn marginal_map_and_mean() {
        let axes = axes_2x3(&[0.0, 1.0], &[0.0, 1.0, 2.0]);
        let mut surface = Array5::from_elem((2, 3, 1, 1, 1), 0.0_f64);
        surface[[1, 2, 0, 0, 0]] = 3.0;
        let weights = normalized_weights(&surface, &axes, FitStage::Integrating).unwrap();

        let thr_marginal = marginal(&weights, Parameter::Threshold);
        assert_eq!(thr_marginal.len(), 2);
        assert!((thr_marginal.sum() - 1.0).abs() < 1e-12);
        assert!(thr_marginal[1] > thr_marginal[0]);

        assert_eq!(map_index(&surface), [1, 2, 0, 0, 0]);

        let mean = mean_estimate(&weights, &axes);
        let expected_thr = thr_marginal[1] * 1.0;
        assert!((mean.threshold - expected_thr).abs() < 1e-12);
        assert_eq!(mean.lambda, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // A fixed parameter on a collapsed axis comes back bit-exact from
    // the posterior mean, with no perturbation from floating-point
    // rounding in the pooled mass.
    //
    // Given
    // -----
    // - A 2x3 grid with gamma collapsed to the single value 0.5 and a
    //   surface whose normalized mass sums to one only up to rounding.
    //
    // Expect
    // ------
    // - mean.gamma == 0.5 exactly, and each free-axis mean sits inside
    //   its axis span.
    fn mean_estimate_exact_on_collapsed_axes() {
        let axes: [&[f64]; N_PARAMS] =
            [&[0.0, 1.0], &[0.0, 1.0, 2.0], &[0.02], &[0.5], &[0.0]];
        let mut surface = Array5::from_elem((2, 3, 1, 1, 1), 0.0_f64);
        surface[[0, 1, 0, 0, 0]] = 1.7;
        surface[[1, 2, 0, 0, 0]] = 2.3;
        let weights = normalized_weights(&surface, &axes, FitStage::Integrating).unwrap();

        let mean = mean_estimate(&weights, &axes);
        assert_eq!(mean.gamma, 0.5);
        assert_eq!(mean.lambda, 0.02);
        assert_eq!(mean.eta, 0.0);
        assert!(mean.threshold > 0.0 && mean.threshold < 1.0);
        assert!(mean.width > 0.0 && mean.width < 2.0);
    }

    #[test]
    // Purpose
    // -------
    // The credible interval is the shortest contiguous window reaching
    // the level, falling back to the full span when mass is short.
    //
    // Given
    // -----
    // - Mass [0.1, 0.2, 0.4, 0.2, 0.1] on axis [0, 1, 2, 3, 4].
    //
    // Expect
    // ------
    // - Level 0.8 selects (1, 3); level 0.35 selects the single peak
    //   cell (2, 2); an unreachable level returns (0, 4).
    fn credible_interval_minimal_span() {
        let mass = [0.1, 0.2, 0.4, 0.2, 0.1];
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(credible_interval(&mass, &axis, 0.8), (1.0, 3.0));
        assert_eq!(credible_interval(&mass, &axis, 0.35), (2.0, 2.0));
        assert_eq!(credible_interval(&mass, &axis, 1.5), (0.0, 4.0));
        assert_eq!(credible_interval(&[1.0], &[0.5], 0.95), (0.5, 0.5));
    }

    #[test]
    // Purpose
    // -------
    // A perfect fit has deviance near zero; a poor fit has a clearly
    // positive deviance.
    fn deviance_scores_fit_quality() {
        use crate::psychometric::sigmoid::SigmoidKind;
        let sigmoid = SigmoidKind::Norm.build(0.5, 0.05);
        // Counts generated exactly from the scaled sigmoid at these levels
        // would give deviance 0; these are close.
        let data = PsychData::new(
            array![-1.0, 0.0, 1.0],
            array![1, 5, 9],
            array![10, 10, 10],
        )
        .unwrap();
        let good = PsychParams::new(0.0, 2.5, 0.0, 0.0, 0.0).unwrap();
        let bad = PsychParams::new(5.0, 0.5, 0.0, 0.0, 0.0).unwrap();
        let d_good = deviance(&data, sigmoid.as_ref(), ExperimentType::YesNo, &good);
        let d_bad = deviance(&data, sigmoid.as_ref(), ExperimentType::YesNo, &bad);
        assert!(d_good >= 0.0);
        assert!(d_bad > d_good);
    }
}
