//! Parameter grids and the adaptive border-refinement loop.
//!
//! Purpose
//! -------
//! Lay out the 5-D Cartesian parameter grid over a bounds box, evaluate
//! the joint log-posterior surface over it, and iteratively narrow the
//! box until the posterior mass is well inside the borders.
//!
//! Key behaviors
//! -------------
//! - [`ParameterGrid::new`] spaces every free axis linearly, except the
//!   overdispersion axis which is square-root spaced (denser near zero,
//!   where the beta-binomial changes fastest); fixed axes collapse to a
//!   single point.
//! - [`ParameterGrid::evaluate_surface`] computes the log-posterior at
//!   every grid point, reusing a precomputed sigmoid table over
//!   (block, threshold, width) so the inner loop touches no
//!   transcendental functions beyond the block scoring. Grid cells are
//!   scored in parallel.
//! - [`ParameterGrid::move_bounds`] narrows each free axis to the span
//!   where its marginal mass exceeds the configured tail threshold, with
//!   one grid step of outward slack; borders never widen.
//! - [`refine_bounds`] drives coarse evaluate/narrow rounds until the
//!   shrink per round falls below tolerance, the maximum round count is
//!   reached, or the fit is cancelled.
//!
//! Invariants & assumptions
//! ------------------------
//! - Axis values are strictly increasing for free axes and lie inside
//!   the originating bounds.
//! - The surface is laid out in row-major order with the canonical axis
//!   order (threshold, width, lambda, gamma, eta).
//! - Equal-asymptote experiments evaluate the likelihood with
//!   `γ := λ`; the collapsed gamma axis is a placeholder.
//!
//! Conventions
//! -----------
//! - Log-priors enter the surface as per-axis tables normalized to unit
//!   trapezoid mass, so surfaces from different boxes are comparable.
//!
//! Downstream usage
//! ----------------
//! - The model layer calls [`refine_bounds`] with the coarse resolution,
//!   then builds one final [`ParameterGrid`] at full resolution and
//!   hands its surface to the posterior module.
//!
//! Testing notes
//! -------------
//! - Unit tests pin axis spacing (linear, square-root, collapsed),
//!   surface sentinels for invalid corners, border narrowing around a
//!   synthetic peak, and cancellation between rounds.
use crate::psychometric::{
    core::{
        bounds::ParamBounds,
        cancel::CancelToken,
        data::PsychData,
        experiment::ExperimentType,
        options::{FitOptions, GridSteps},
        params::{N_PARAMS, Parameter, PsychParams},
    },
    errors::{FitStage, PsychError, PsychResult},
    likelihood::{block_log_likelihood, scaled_prob},
    posterior::{marginal, normalized_weights},
    priors::PriorSet,
    sigmoid::Sigmoid,
};
use ndarray::Array5;
use rayon::prelude::*;

/// Evenly spaced values over `[lo, hi]`, inclusive.
fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + step * i as f64).collect()
}

/// One 5-D Cartesian grid over a bounds box.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    values: [Vec<f64>; N_PARAMS],
}

impl ParameterGrid {
    /// Lay out axes over `bounds` at the given resolution.
    ///
    /// Free axes get `steps` points; the overdispersion axis is spaced
    /// uniformly in `√η` so small overdispersions are resolved finely.
    /// Zero-length bound intervals collapse to a single point regardless
    /// of the requested steps.
    pub fn new(bounds: &ParamBounds, steps: &GridSteps) -> ParameterGrid {
        let values = Parameter::ALL.map(|param| {
            let (lo, hi) = bounds.get(param);
            let n = steps.get(param);
            if lo == hi || n < 2 {
                return vec![lo];
            }
            if param == Parameter::Eta {
                linspace(lo.sqrt(), hi.sqrt(), n).into_iter().map(|r| r * r).collect()
            } else {
                linspace(lo, hi, n)
            }
        });
        ParameterGrid { values }
    }

    /// Axis values for one parameter.
    pub fn axis(&self, param: Parameter) -> &[f64] {
        &self.values[param.index()]
    }

    /// All axes in canonical order.
    pub fn axes(&self) -> [&[f64]; N_PARAMS] {
        [
            &self.values[0],
            &self.values[1],
            &self.values[2],
            &self.values[3],
            &self.values[4],
        ]
    }

    /// Points per axis, in canonical order.
    pub fn shape(&self) -> [usize; N_PARAMS] {
        [
            self.values[0].len(),
            self.values[1].len(),
            self.values[2].len(),
            self.values[3].len(),
            self.values[4].len(),
        ]
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether the grid is empty. Never true for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameter set at the given grid coordinates.
    ///
    /// The raw axis values are returned without domain validation; corner
    /// combinations (e.g. `λ + γ >= 1`) are legal coordinates whose
    /// likelihood is `-∞`.
    pub fn params_at(&self, idx: [usize; N_PARAMS]) -> PsychParams {
        PsychParams {
            threshold: self.values[0][idx[0]],
            width: self.values[1][idx[1]],
            lambda: self.values[2][idx[2]],
            gamma: self.values[3][idx[3]],
            eta: self.values[4][idx[4]],
        }
    }

    /// Joint log-posterior over the whole grid.
    ///
    /// The sigmoid is tabulated once per (block, threshold, width)
    /// combination; each grid cell then sums its block scores and adds
    /// the per-axis normalized log-priors. Cells whose parameters leave
    /// the model domain evaluate to `-∞`.
    pub fn evaluate_surface(
        &self, data: &PsychData, sigmoid: &dyn Sigmoid, experiment: ExperimentType,
        priors: &PriorSet,
    ) -> Array5<f64> {
        let [nt, nw, nl, ng, ne] = self.shape();
        let blocks: Vec<(f64, u64, u64)> = data.blocks().collect();
        let thr_axis = self.axis(Parameter::Threshold);
        let wid_axis = self.axis(Parameter::Width);

        // Sigmoid table, laid out (block, threshold, width) row-major.
        let s_table: Vec<f64> = blocks
            .par_iter()
            .flat_map_iter(|&(x, _, _)| {
                let mut rows = Vec::with_capacity(nt * nw);
                for &m in thr_axis {
                    for &w in wid_axis {
                        rows.push(sigmoid.value(x, m, w));
                    }
                }
                rows
            })
            .collect();

        let ln_priors: [Vec<f64>; N_PARAMS] =
            Parameter::ALL.map(|param| priors.ln_table(param, self.axis(param)));

        let lam_axis = self.axis(Parameter::Lambda);
        let gam_axis = self.axis(Parameter::Gamma);
        let eta_axis = self.axis(Parameter::Eta);
        let equal_asymptote = experiment == ExperimentType::EqualAsymptote;

        let flat: Vec<f64> = (0..self.len())
            .into_par_iter()
            .map(|cell| {
                let mut rest = cell;
                let e = rest % ne;
                rest /= ne;
                let g = rest % ng;
                rest /= ng;
                let l = rest % nl;
                rest /= nl;
                let w = rest % nw;
                let t = rest / nw;

                let prior = ln_priors[0][t]
                    + ln_priors[1][w]
                    + ln_priors[2][l]
                    + ln_priors[3][g]
                    + ln_priors[4][e];
                if prior == f64::NEG_INFINITY {
                    return f64::NEG_INFINITY;
                }

                let lambda = lam_axis[l];
                let gamma = if equal_asymptote { lambda } else { gam_axis[g] };
                if lambda + gamma >= 1.0 {
                    return f64::NEG_INFINITY;
                }
                let eta = eta_axis[e];

                let mut ll = 0.0;
                for (b, &(_, k, n)) in blocks.iter().enumerate() {
                    let s = s_table[(b * nt + t) * nw + w];
                    let p = scaled_prob(s, lambda, gamma);
                    ll += block_log_likelihood(p, k, n, eta);
                }
                ll + prior
            })
            .collect();

        Array5::from_shape_vec((nt, nw, nl, ng, ne), flat)
            .expect("surface layout matches grid shape")
    }

    /// Narrow each free axis to the span where its marginal mass exceeds
    /// `max_bound_value`, with one grid step of outward slack.
    ///
    /// Collapsed axes keep their point. Borders never move outward.
    ///
    /// # Errors
    /// - Propagates `DegenerateLikelihood` / `ZeroPosteriorMass` from the
    ///   normalization of `log_surface`.
    pub fn move_bounds(
        &self, log_surface: &Array5<f64>, max_bound_value: f64,
    ) -> PsychResult<ParamBounds> {
        let axes = self.axes();
        let weights = normalized_weights(log_surface, &axes, FitStage::GridSearch)?;

        let mut narrowed = [(0.0, 0.0); N_PARAMS];
        for param in Parameter::ALL {
            let axis = self.axis(param);
            let n = axis.len();
            if n == 1 {
                narrowed[param.index()] = (axis[0], axis[0]);
                continue;
            }
            let mass = marginal(&weights, param);
            let mut first = None;
            let mut last = 0;
            for (i, &m) in mass.iter().enumerate() {
                if m > max_bound_value {
                    first.get_or_insert(i);
                    last = i;
                }
            }
            let (lo_idx, hi_idx) = match first {
                Some(first) => (first.saturating_sub(1), (last + 1).min(n - 1)),
                // All mass below threshold: keep the current span.
                None => (0, n - 1),
            };
            narrowed[param.index()] = (axis[lo_idx], axis[hi_idx]);
        }
        Ok(ParamBounds(narrowed))
    }
}

/// Iteratively narrow `initial` with coarse grids until the borders
/// stabilize.
///
/// Runs up to `options.refine_max_rounds` evaluate/narrow rounds at the
/// coarse (moving) resolution, stopping early once the largest relative
/// shrink across free axes drops below `options.refine_shrink_tol`.
/// Cancellation is polled before each round.
///
/// # Errors
/// - `PsychError::Cancelled` when the token fires between rounds.
/// - Propagates degenerate-posterior errors from the surface
///   normalization.
pub fn refine_bounds(
    data: &PsychData, sigmoid: &dyn Sigmoid, experiment: ExperimentType, priors: &PriorSet,
    initial: ParamBounds, options: &FitOptions, cancel: Option<&CancelToken>,
) -> PsychResult<ParamBounds> {
    let steps = options.moving_grid_steps();
    let mut bounds = initial;
    for round in 0..options.refine_max_rounds {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(PsychError::Cancelled { stage: FitStage::GridSearch });
            }
        }
        let grid = ParameterGrid::new(&bounds, &steps);
        let surface = grid.evaluate_surface(data, sigmoid, experiment, priors);
        let narrowed = grid.move_bounds(&surface, options.max_bound_value)?;

        let mut max_shrink = 0.0_f64;
        for param in Parameter::ALL {
            let (old_lo, old_hi) = bounds.get(param);
            let (new_lo, new_hi) = narrowed.get(param);
            let old_span = old_hi - old_lo;
            if old_span > 0.0 {
                max_shrink = max_shrink.max(1.0 - (new_hi - new_lo) / old_span);
            }
        }
        if options.verbose {
            eprintln!(
                "border refinement round {}: max relative shrink {:.4}",
                round + 1,
                max_shrink
            );
        }
        bounds = narrowed;
        if max_shrink < options.refine_shrink_tol {
            break;
        }
    }
    Ok(bounds)
}
