//! Prior densities over the five psychometric parameters.
//!
//! Purpose
//! -------
//! Provide the default prior set used by the posterior, plus the hook for
//! replacing any single prior with a custom density. Defaults follow the
//! standard weakly-informative choices for grid-based psychometric
//! fitting:
//!
//! - threshold: flat across the stimulus range with raised-cosine
//!   falloff over half the range on each side;
//! - width: cosine rise from the finest resolvable spacing, flat across
//!   plausible widths, cosine fall toward the upper bound;
//! - lambda, gamma, eta: Beta(1, beta_prior) densities favoring small
//!   rates.
//!
//! Key behaviors
//! -------------
//! - [`PriorSet::ln_table`] evaluates a prior along a grid axis,
//!   normalizes its mass to one under trapezoid quadrature, and returns
//!   the log-densities (with `-∞` marking zero-density points).
//! - Collapsed axes (single grid point) contribute a constant `ln 1 = 0`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Prior functions are nonnegative; they need not be normalized, the
//!   grid normalization handles scale.
//! - Custom priors must be positive somewhere inside the axis bounds or
//!   the posterior degenerates (reported by the pipeline, not here).
//!
//! Conventions
//! -----------
//! - Densities are expressed over the raw parameter values, including
//!   the eta axis (the grid's squared spacing only changes where the
//!   axis points lie, not the density).
//!
//! Downstream usage
//! ----------------
//! - The grid evaluates one log-prior table per axis and adds them to the
//!   log-likelihood surface; the result layer echoes normalized prior
//!   values for inspection.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the default shapes (flat plateaus, falloff to zero,
//!   Beta(1, b) decay) and the normalization of `ln_table`.
use crate::{
    optimization::numerical_stability::transformations::trapezoid_weights,
    psychometric::core::{
        options::FitOptions,
        params::{N_PARAMS, Parameter},
    },
};

/// A nonnegative, not-necessarily-normalized density over one parameter.
pub type PriorFn = Box<dyn Fn(f64) -> f64 + Send + Sync>;

/// One prior density per canonical axis.
pub struct PriorSet {
    priors: [PriorFn; N_PARAMS],
}

impl std::fmt::Debug for PriorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorSet").finish_non_exhaustive()
    }
}

impl PriorSet {
    /// Default priors from the stimulus geometry and the configured
    /// Beta-prior shape.
    ///
    /// `stimulus_range` and `width_min` are the same quantities that seed
    /// the default bounds, so the threshold falloff region coincides with
    /// the widened threshold axis and the width ramps line up with its
    /// bounds.
    pub fn defaults(
        stimulus_range: (f64, f64), width_min: f64, options: &FitOptions,
    ) -> PriorSet {
        let (s0, s1) = stimulus_range;
        let span = s1 - s0;
        let beta = options.beta_prior;

        let threshold = threshold_prior(s0, s1, span);
        let width = width_prior(width_min, span);
        PriorSet {
            priors: [
                threshold,
                width,
                beta_one_b_prior(beta),
                beta_one_b_prior(beta),
                beta_one_b_prior(beta),
            ],
        }
    }

    /// Replace the prior for one parameter.
    pub fn set_prior(&mut self, param: Parameter, prior: PriorFn) {
        self.priors[param.index()] = prior;
    }

    /// Unnormalized density of the given prior at `x`.
    pub fn density(&self, param: Parameter, x: f64) -> f64 {
        (self.priors[param.index()])(x)
    }

    /// Log-densities along a grid axis, normalized to unit mass under
    /// trapezoid quadrature.
    ///
    /// A collapsed axis (fewer than two points) or an axis with zero
    /// total mass is returned un-normalized; zero-density points map to
    /// `-∞`. The degenerate all-zero case is left for the posterior
    /// pipeline to diagnose.
    pub fn ln_table(&self, param: Parameter, values: &[f64]) -> Vec<f64> {
        if values.len() < 2 {
            return vec![0.0; values.len()];
        }
        let density: Vec<f64> = values.iter().map(|&x| self.density(param, x)).collect();
        let weights = trapezoid_weights(values);
        let mass: f64 = density.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();
        let scale = if mass > 0.0 && mass.is_finite() { mass } else { 1.0 };
        density
            .iter()
            .map(|&d| if d > 0.0 { (d / scale).ln() } else { f64::NEG_INFINITY })
            .collect()
    }
}

/// Flat over `[s0, s1]`, raised-cosine falloff over `span / 2` on each
/// side, zero beyond.
fn threshold_prior(s0: f64, s1: f64, span: f64) -> PriorFn {
    Box::new(move |x: f64| {
        if x >= s0 && x <= s1 {
            1.0
        } else if x > s0 - span / 2.0 && x < s0 {
            let d = (s0 - x) / span;
            (1.0 + (2.0 * std::f64::consts::PI * d).cos()) / 2.0
        } else if x > s1 && x < s1 + span / 2.0 {
            let d = (x - s1) / span;
            (1.0 + (2.0 * std::f64::consts::PI * d).cos()) / 2.0
        } else {
            0.0
        }
    })
}

/// Cosine rise over `[wmin, 2 wmin]`, flat over `[2 wmin, span]`, cosine
/// fall over `[span, 3 span]`. Degenerates to a flat prior when the
/// plateau would be empty (`2 wmin >= span`).
fn width_prior(wmin: f64, span: f64) -> PriorFn {
    if 2.0 * wmin >= span {
        return Box::new(|_| 1.0);
    }
    Box::new(move |w: f64| {
        if w < wmin {
            0.0
        } else if w < 2.0 * wmin {
            (1.0 - (std::f64::consts::PI * (w - wmin) / wmin).cos()) / 2.0
        } else if w <= span {
            1.0
        } else if w < 3.0 * span {
            (1.0 + (std::f64::consts::PI / 2.0 * (w - span) / span).cos()) / 2.0
        } else {
            0.0
        }
    })
}

/// Beta(1, b) density `b (1 - x)^(b - 1)` on `[0, 1)`.
fn beta_one_b_prior(b: f64) -> PriorFn {
    Box::new(move |x: f64| {
        if (0.0..1.0).contains(&x) { b * (1.0 - x).powf(b - 1.0) } else { 0.0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psychometric::core::options::FitOptions;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Shapes of the three default prior families (plateaus, falloffs,
    //   Beta decay).
    // - Normalization behavior of `ln_table`.
    // - Custom prior substitution.
    // -------------------------------------------------------------------------

    fn make_priors() -> PriorSet {
        PriorSet::defaults((0.0, 1.0), 0.05, &FitOptions::default())
    }

    #[test]
    // Purpose
    // -------
    // The threshold prior is flat on the stimulus range, halves at the
    // quarter-span point of the falloff, and vanishes beyond half a span.
    //
    // Given
    // -----
    // - Stimulus range (0, 1), so the falloff regions are (-0.5, 0) and
    //   (1, 1.5).
    //
    // Expect
    // ------
    // - density == 1 inside, 0.5 at -0.25, 0 at -0.5 and beyond.
    fn threshold_prior_shape() {
        let priors = make_priors();
        assert_eq!(priors.density(Parameter::Threshold, 0.5), 1.0);
        assert_eq!(priors.density(Parameter::Threshold, 0.0), 1.0);
        let mid_falloff = priors.density(Parameter::Threshold, -0.25);
        assert!((mid_falloff - 0.5).abs() < 1e-12);
        assert_eq!(priors.density(Parameter::Threshold, -0.5), 0.0);
        assert_eq!(priors.density(Parameter::Threshold, 2.0), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The width prior rises from zero at width_min, plateaus at one, and
    // decays toward three spans.
    //
    // Given
    // -----
    // - width_min = 0.05, span = 1.0.
    //
    // Expect
    // ------
    // - 0 below width_min, 1 on [0.1, 1.0], strictly between 0 and 1 in
    //   both ramps, 0 at 3.0.
    fn width_prior_shape() {
        let priors = make_priors();
        assert_eq!(priors.density(Parameter::Width, 0.01), 0.0);
        let rising = priors.density(Parameter::Width, 0.075);
        assert!(rising > 0.0 && rising < 1.0);
        assert_eq!(priors.density(Parameter::Width, 0.5), 1.0);
        let falling = priors.density(Parameter::Width, 2.0);
        assert!(falling > 0.0 && falling < 1.0);
        assert_eq!(priors.density(Parameter::Width, 3.0), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The rate priors follow Beta(1, 10): density 10 at zero, decaying
    // monotonically, zero at one.
    fn rate_priors_are_beta() {
        let priors = make_priors();
        for param in [Parameter::Lambda, Parameter::Gamma, Parameter::Eta] {
            assert!((priors.density(param, 0.0) - 10.0).abs() < 1e-12);
            assert!(priors.density(param, 0.1) > priors.density(param, 0.3));
            assert_eq!(priors.density(param, 1.0), 0.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // `ln_table` must normalize an axis to unit trapezoid mass and mark
    // zero-density points with -inf.
    //
    // Given
    // -----
    // - A 101-point lambda axis over [0, 0.5].
    //
    // Expect
    // ------
    // - sum(exp(ln p) * w) == 1 within 1e-10, and a point at density zero
    //   maps to -inf.
    fn ln_table_normalizes_axis_mass() {
        let priors = make_priors();
        let values: Vec<f64> = (0..=100).map(|i| 0.5 * i as f64 / 100.0).collect();
        let table = priors.ln_table(Parameter::Lambda, &values);
        let weights = trapezoid_weights(&values);
        let mass: f64 =
            table.iter().zip(weights.iter()).map(|(lp, w)| lp.exp() * w).sum();
        assert!((mass - 1.0).abs() < 1e-10);

        let thr_values = vec![-0.75, 0.0, 0.5, 1.0];
        let thr_table = priors.ln_table(Parameter::Threshold, &thr_values);
        assert_eq!(thr_table[0], f64::NEG_INFINITY);
        assert!(thr_table[1].is_finite());
    }

    #[test]
    // Purpose
    // -------
    // A collapsed axis contributes a constant log-density of zero, and a
    // substituted custom prior replaces the default.
    fn collapsed_axis_and_custom_prior() {
        let mut priors = make_priors();
        assert_eq!(priors.ln_table(Parameter::Gamma, &[0.25]), vec![0.0]);

        priors.set_prior(Parameter::Lambda, Box::new(|x| if x < 0.1 { 2.0 } else { 0.0 }));
        assert_eq!(priors.density(Parameter::Lambda, 0.05), 2.0);
        assert_eq!(priors.density(Parameter::Lambda, 0.2), 0.0);
    }
}
