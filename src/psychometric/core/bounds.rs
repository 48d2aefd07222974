//! Parameter bounds: the box over which the posterior grid is laid out.
//!
//! Default bounds derive from the observed stimulus range and the finest
//! level spacing, following the standard heuristics for grid-based
//! psychometric fitting; user overrides and fixed parameters replace the
//! defaults per axis.
use crate::psychometric::core::{
    options::FitOptions,
    params::{N_PARAMS, Parameter},
};
use serde::{Deserialize, Serialize};

/// Upper limit for the overdispersion axis; kept strictly below 1 so the
/// beta-binomial variance parameter stays finite.
pub const ETA_MAX: f64 = 1.0 - 1e-10;

/// Per-axis `(lower, upper)` bounds in canonical order.
///
/// A fixed parameter is represented by a zero-length interval
/// (`lower == upper`), which the grid collapses to a single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds(pub [(f64, f64); N_PARAMS]);

impl ParamBounds {
    /// Bounds for the given parameter.
    pub fn get(&self, param: Parameter) -> (f64, f64) {
        self.0[param.index()]
    }

    /// Replace the bounds for the given parameter.
    pub fn set(&mut self, param: Parameter, lower: f64, upper: f64) {
        self.0[param.index()] = (lower, upper);
    }

    /// Whether the axis is collapsed to a single point.
    pub fn is_fixed(&self, param: Parameter) -> bool {
        let (lower, upper) = self.get(param);
        lower == upper
    }

    /// Whether `value` lies inside the axis interval (inclusive).
    pub fn contains(&self, param: Parameter, value: f64) -> bool {
        let (lower, upper) = self.get(param);
        value >= lower && value <= upper
    }

    /// Whether all five values lie inside their intervals.
    pub fn contains_all(&self, values: &[f64; N_PARAMS]) -> bool {
        Parameter::ALL.iter().all(|&p| self.contains(p, values[p.index()]))
    }

    /// Default bounds from the observed stimulus geometry.
    ///
    /// - threshold: the stimulus range widened by half its span on each
    ///   side, so thresholds slightly outside the sampled levels remain
    ///   representable.
    /// - width: from `width_min` (finest resolvable spacing) to three
    ///   times the stimulus span.
    /// - lambda, gamma: `[0, 0.5]`.
    /// - eta: `[0, ETA_MAX]`.
    ///
    /// Overrides are then applied in order: experiment-derived and fixed
    /// values from `options` collapse their axes; explicit
    /// `options.bounds` entries replace the heuristic interval.
    pub fn defaults(
        stimulus_range: (f64, f64), width_min: f64, options: &FitOptions,
    ) -> ParamBounds {
        let (s0, s1) = stimulus_range;
        let span = s1 - s0;
        let mut bounds = ParamBounds([
            (s0 - span / 2.0, s1 + span / 2.0),
            (width_min, 3.0 * span),
            (0.0, 0.5),
            (0.0, 0.5),
            (0.0, ETA_MAX),
        ]);
        for param in Parameter::ALL {
            if let Some((lower, upper)) = options.bounds[param.index()] {
                bounds.set(param, lower, upper);
            }
            if let Some(value) = options.effective_fixed(param) {
                bounds.set(param, value, value);
            }
        }
        // Equal-asymptote fits evaluate gamma as lambda; its axis carries
        // no information of its own.
        if !options.experiment.gamma_is_free()
            && options.effective_fixed(Parameter::Gamma).is_none()
        {
            bounds.set(Parameter::Gamma, 0.0, 0.0);
        }
        bounds
    }
}
