//! Fit results: estimates, intervals, derived quantities, serialization.
//!
//! Purpose
//! -------
//! Bundle everything a completed fit produced — point estimates,
//! credible intervals, marginal distributions, the full posterior weight
//! array and the configuration that generated them — into one
//! serializable record, together with the derived quantities commonly
//! read off a fitted psychometric function.
//!
//! Key behaviors
//! -------------
//! - [`FitResult::get_estimate`] selects the MAP or posterior-mean
//!   estimate per the caller's preference.
//! - [`FitResult::confidence_interval`] looks up the stored credible
//!   interval for a (level, parameter) pair; unknown levels are an
//!   error, not a silent nearest match.
//! - [`FitResult::threshold_at`] inverts the fitted curve at an
//!   arbitrary proportion-correct, propagating the threshold credible
//!   intervals through the same transformation.
//! - [`FitResult::slope_at`] evaluates the derivative of the scaled
//!   curve at a stimulus level.
//! - [`FitResult::to_json`] / [`FitResult::from_json`] round-trip the
//!   whole record through JSON.
//!
//! Invariants & assumptions
//! ------------------------
//! - `parameter_values`, `prior_values` and `marginal_mass` share axis
//!   lengths per parameter; fixed parameters have length-1 entries.
//! - `weights` is normalized posterior mass over the final grid, laid
//!   out in the canonical axis order.
//!
//! Conventions
//! -----------
//! - Credible intervals are stored per confidence level in the order the
//!   configuration listed the levels.
//!
//! Testing notes
//! -------------
//! - Unit tests pin interval lookup (including the unknown-level error),
//!   the threshold/slope transformations against hand-computed values,
//!   and the JSON round-trip.
use crate::psychometric::{
    core::{
        options::{EstimateType, FitOptions},
        params::{N_PARAMS, Parameter, PsychParams},
    },
    errors::{PsychError, PsychResult},
};
use ndarray::Array5;
use serde::{Deserialize, Serialize};

/// Tolerance for matching a requested confidence level against the
/// configured ones.
const LEVEL_MATCH_TOL: f64 = 1e-9;

/// One value of type `T` per model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerParameter<T> {
    pub threshold: T,
    pub width: T,
    pub lambda: T,
    pub gamma: T,
    pub eta: T,
}

impl<T> PerParameter<T> {
    /// Build from a producer called once per parameter, in canonical
    /// order.
    pub fn build(mut f: impl FnMut(Parameter) -> T) -> PerParameter<T> {
        PerParameter {
            threshold: f(Parameter::Threshold),
            width: f(Parameter::Width),
            lambda: f(Parameter::Lambda),
            gamma: f(Parameter::Gamma),
            eta: f(Parameter::Eta),
        }
    }

    pub fn get(&self, param: Parameter) -> &T {
        match param {
            Parameter::Threshold => &self.threshold,
            Parameter::Width => &self.width,
            Parameter::Lambda => &self.lambda,
            Parameter::Gamma => &self.gamma,
            Parameter::Eta => &self.eta,
        }
    }
}

/// Complete record of one fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    /// Maximum a-posteriori estimate (grid MAP refined by the
    /// optimizer when refinement succeeded).
    pub estimate_map: PsychParams,
    /// Posterior-mean estimate from the normalized weights.
    pub estimate_mean: PsychParams,
    /// The options the fit ran with, including derived grid resolutions.
    pub configuration: FitOptions,
    /// Credible intervals per configured confidence level, in the
    /// configured order.
    pub confidence_intervals: Vec<(f64, PerParameter<(f64, f64)>)>,
    /// The data the fit ran on, as (level, correct, trials) blocks.
    pub data: Vec<(f64, u64, u64)>,
    /// Final grid axis values per parameter.
    pub parameter_values: PerParameter<Vec<f64>>,
    /// Prior density evaluated on the final grid axes.
    pub prior_values: PerParameter<Vec<f64>>,
    /// Normalized marginal posterior mass per parameter.
    pub marginal_mass: PerParameter<Vec<f64>>,
    /// Normalized posterior mass over the full final grid.
    pub weights: Array5<f64>,
    /// Deviance of the selected estimate under the binomial model.
    pub deviance: f64,
}

impl FitResult {
    /// The point estimate of the requested kind.
    pub fn get_estimate(&self, kind: EstimateType) -> &PsychParams {
        match kind {
            EstimateType::Map => &self.estimate_map,
            EstimateType::Mean => &self.estimate_mean,
        }
    }

    /// The estimate the configuration selected.
    pub fn estimate(&self) -> &PsychParams {
        self.get_estimate(self.configuration.estimate_type)
    }

    /// Credible interval for one parameter at one configured confidence
    /// level.
    ///
    /// # Errors
    /// - `PsychError::UnknownConfidenceLevel` if `level` was not among
    ///   the configured levels.
    pub fn confidence_interval(&self, level: f64, param: Parameter) -> PsychResult<(f64, f64)> {
        self.confidence_intervals
            .iter()
            .find(|(stored, _)| (stored - level).abs() <= LEVEL_MATCH_TOL)
            .map(|(_, per_param)| *per_param.get(param))
            .ok_or(PsychError::UnknownConfidenceLevel { level })
    }

    /// Stimulus level at which the fitted curve reaches
    /// `proportion_correct`.
    ///
    /// With `unscaled` the proportion refers to the bare sigmoid; otherwise
    /// it refers to the observed scale `γ + (1 - λ - γ)·S(x)` and is
    /// mapped back through the fitted asymptotes first. Credible
    /// intervals for the threshold are shifted through the same
    /// transformation, holding the other parameters at their point
    /// estimates.
    ///
    /// # Errors
    /// - `PsychError::Optimizer` (with a descriptive text) if the
    ///   requested proportion lies outside the reachable range.
    pub fn threshold_at(
        &self, proportion_correct: f64, unscaled: bool,
    ) -> PsychResult<(f64, Vec<(f64, (f64, f64))>)> {
        let est = self.estimate();
        let p = if unscaled {
            proportion_correct
        } else {
            (proportion_correct - est.gamma) / (1.0 - est.lambda - est.gamma)
        };
        if !(0.0..=1.0).contains(&p) || !p.is_finite() {
            return Err(PsychError::Optimizer {
                text: format!(
                    "proportion correct {proportion_correct} is outside the fitted \
                     curve's range"
                ),
            });
        }
        let sigmoid = self
            .configuration
            .sigmoid
            .build(self.configuration.thresh_pc, self.configuration.width_alpha);
        let point = sigmoid.inverse(p, est.threshold, est.width);

        // The inverse at fixed width is the threshold plus a constant
        // offset, so the parameter CI shifts rigidly.
        let offset = point - est.threshold;
        let intervals = self
            .confidence_intervals
            .iter()
            .map(|(level, per_param)| {
                let (lo, hi) = per_param.threshold;
                (*level, (lo + offset, hi + offset))
            })
            .collect();
        Ok((point, intervals))
    }

    /// Derivative of the fitted scaled curve at stimulus level `x`.
    pub fn slope_at(&self, x: f64) -> f64 {
        let est = self.estimate();
        let sigmoid = self
            .configuration
            .sigmoid
            .build(self.configuration.thresh_pc, self.configuration.width_alpha);
        (1.0 - est.lambda - est.gamma) * sigmoid.slope(x, est.threshold, est.width)
    }

    /// Value of the fitted scaled curve at stimulus level `x`.
    pub fn curve_at(&self, x: f64) -> f64 {
        let est = self.estimate();
        let sigmoid = self
            .configuration
            .sigmoid
            .build(self.configuration.thresh_pc, self.configuration.width_alpha);
        est.gamma + (1.0 - est.lambda - est.gamma) * sigmoid.value(x, est.threshold, est.width)
    }

    /// Serialize the full record to a JSON string.
    ///
    /// # Errors
    /// - `PsychError::Serialization` when encoding fails.
    pub fn to_json(&self) -> PsychResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild a record from [`FitResult::to_json`] output.
    ///
    /// # Errors
    /// - `PsychError::Serialization` when decoding fails.
    pub fn from_json(text: &str) -> PsychResult<FitResult> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Marginal axes and masses per parameter, assembled by the model layer.
pub(crate) fn per_parameter_from_arrays(
    arrays: [Vec<f64>; N_PARAMS],
) -> PerParameter<Vec<f64>> {
    let [threshold, width, lambda, gamma, eta] = arrays;
    PerParameter { threshold, width, lambda, gamma, eta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psychometric::core::experiment::ExperimentType;
    use crate::psychometric::sigmoid::SigmoidKind;
    use ndarray::Array5;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Confidence-interval lookup and the unknown-level error.
    // - threshold_at at the configured threshold proportion (identity),
    //   for a shifted proportion, and out-of-range rejection.
    // - slope_at / curve_at against the bare sigmoid.
    // - JSON round-trip of the full record.
    // -------------------------------------------------------------------------

    fn sample_result() -> FitResult {
        let est = PsychParams::new(0.0, 2.0, 0.05, 0.1, 0.0).unwrap();
        let mut configuration = FitOptions::default();
        configuration.experiment = ExperimentType::YesNo;
        configuration.sigmoid = SigmoidKind::Norm;
        FitResult {
            estimate_map: est,
            estimate_mean: est,
            configuration,
            confidence_intervals: vec![
                (
                    0.95,
                    PerParameter {
                        threshold: (-0.4, 0.4),
                        width: (1.5, 2.6),
                        lambda: (0.0, 0.12),
                        gamma: (0.02, 0.2),
                        eta: (0.0, 0.1),
                    },
                ),
            ],
            data: vec![(-1.0, 3, 20), (0.0, 10, 20), (1.0, 18, 20)],
            parameter_values: PerParameter::build(|_| vec![0.0, 1.0]),
            prior_values: PerParameter::build(|_| vec![0.5, 0.5]),
            marginal_mass: PerParameter::build(|_| vec![0.5, 0.5]),
            weights: Array5::from_elem((2, 2, 2, 2, 2), 1.0 / 32.0),
            deviance: 1.2,
        }
    }

    #[test]
    // Purpose
    // -------
    // Stored intervals are returned for configured levels; unasked-for
    // levels error instead of snapping to the nearest one.
    fn interval_lookup() {
        let result = sample_result();
        assert_eq!(
            result.confidence_interval(0.95, Parameter::Width).unwrap(),
            (1.5, 2.6)
        );
        assert!(matches!(
            result.confidence_interval(0.5, Parameter::Width),
            Err(PsychError::UnknownConfidenceLevel { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // At the configured threshold proportion (unscaled) the inverse must
    // return the threshold itself and the parameter CI unchanged; a
    // proportion outside the reachable scaled range must be rejected.
    fn threshold_inversion() {
        let result = sample_result();

        let (point, intervals) = result.threshold_at(0.5, true).unwrap();
        assert!((point - 0.0).abs() < 1e-12);
        assert_eq!(intervals[0], (0.95, (-0.4, 0.4)));

        // Scaled midpoint: gamma + (1 - lambda - gamma) / 2 = 0.525.
        let (scaled_point, _) = result.threshold_at(0.525, false).unwrap();
        assert!((scaled_point - 0.0).abs() < 1e-12);

        // Below the guess rate nothing is reachable.
        assert!(result.threshold_at(0.05, false).is_err());
    }

    #[test]
    // Purpose
    // -------
    // slope_at and curve_at scale the bare sigmoid by 1 - lambda - gamma
    // and offset by gamma.
    fn curve_and_slope_scaling() {
        let result = sample_result();
        let sigmoid = SigmoidKind::Norm.build(0.5, 0.05);

        let expect_curve = 0.1 + 0.85 * sigmoid.value(0.7, 0.0, 2.0);
        assert!((result.curve_at(0.7) - expect_curve).abs() < 1e-12);

        let expect_slope = 0.85 * sigmoid.slope(0.7, 0.0, 2.0);
        assert!((result.slope_at(0.7) - expect_slope).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // to_json / from_json preserve estimates, intervals and weights.
    fn json_round_trip() {
        let result = sample_result();
        let text = result.to_json().unwrap();
        let back = FitResult::from_json(&text).unwrap();
        assert_eq!(back.estimate_map, result.estimate_map);
        assert_eq!(back.confidence_intervals, result.confidence_intervals);
        assert_eq!(back.weights, result.weights);
        assert_eq!(back.data, result.data);
    }
}
