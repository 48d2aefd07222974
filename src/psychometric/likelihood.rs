//! Beta-binomial likelihood of blocked psychometric data.
//!
//! Purpose
//! -------
//! Evaluate the log-likelihood of observed block counts under a scaled
//! sigmoid with optional overdispersion, and the log-posterior obtained by
//! adding the parameter priors. These are the scalar kernels shared by
//! the grid sweep and the optimizer refinement.
//!
//! Key behaviors
//! -------------
//! - [`scaled_prob`] maps an unscaled sigmoid value into the observable
//!   success probability `γ + (1 - λ - γ) S(x)`, clamped away from 0/1.
//! - [`block_log_likelihood`] scores one block: exact binomial when the
//!   overdispersion `η` is (numerically) zero, beta-binomial otherwise,
//!   with matched binomial-coefficient terms so the two regimes are
//!   comparable.
//! - [`log_likelihood`] sums blocks for a full parameter set, applying
//!   the equal-asymptote substitution `γ := λ` when the experiment
//!   demands it, and returning `-∞` for out-of-domain parameters.
//! - [`log_posterior`] adds the axis log-priors and enforces the grid
//!   bounds box, which is what the optimizer maximizes.
//! - [`saturated_log_likelihood`] scores the saturated model (one free
//!   probability per block) for deviance computation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs to [`block_log_likelihood`] satisfy `0 < p < 1` (callers
//!   clamp via [`scaled_prob`]) and `k <= n`, `n > 0` (guaranteed by
//!   `PsychData`).
//! - `-∞` is the only sentinel: NaN never leaves this module for valid
//!   inputs.
//!
//! Conventions
//! -----------
//! - The beta-binomial is parameterized by `ν = 1/η² - 1`, `a = pν`,
//!   `b = (1 - p)ν`, so `η → 0` recovers the binomial and `η → 1`
//!   maximal overdispersion.
//!
//! Downstream usage
//! ----------------
//! - The grid composes [`scaled_prob`] and [`block_log_likelihood`] over
//!   precomputed sigmoid tables; the optimizer calls [`log_posterior`]
//!   through its `LogPosterior` implementation; deviance uses
//!   [`saturated_log_likelihood`].
//!
//! Testing notes
//! -------------
//! - Unit tests compare the η = 0 path against hand-computed binomial
//!   terms, check beta-binomial continuity at small η, and pin the
//!   out-of-domain sentinel.
use crate::{
    optimization::numerical_stability::transformations::clamp_probability,
    psychometric::{
        core::{
            bounds::ParamBounds,
            data::PsychData,
            experiment::ExperimentType,
            params::{Parameter, PsychParams},
        },
        priors::PriorSet,
        sigmoid::Sigmoid,
    },
};
use statrs::function::gamma::ln_gamma;

/// Overdispersion below this threshold is treated as exactly binomial.
pub const ETA_ZERO_TOL: f64 = 1e-9;

/// Natural log of the binomial coefficient `C(n, k)`.
fn ln_choose(n: u64, k: u64) -> f64 {
    ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
}

/// Natural log of the Beta function `B(a, b)`.
fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// Observable success probability for an unscaled sigmoid value.
///
/// `γ + (1 - λ - γ) s`, clamped into the open unit interval so log terms
/// stay finite.
pub fn scaled_prob(s: f64, lambda: f64, gamma: f64) -> f64 {
    clamp_probability(gamma + (1.0 - lambda - gamma) * s)
}

/// Log-likelihood contribution of one block.
///
/// For `η <= ETA_ZERO_TOL` this is the exact binomial term
/// `ln C(n, k) + k ln p + (n - k) ln(1 - p)`. Otherwise the block follows
/// a beta-binomial with `ν = 1/η² - 1`:
/// `ln C(n, k) + ln B(k + pν, n - k + (1 - p)ν) - ln B(pν, (1 - p)ν)`.
pub fn block_log_likelihood(p: f64, k: u64, n: u64, eta: f64) -> f64 {
    let k_f = k as f64;
    let n_f = n as f64;
    if eta <= ETA_ZERO_TOL {
        ln_choose(n, k) + k_f * p.ln() + (n_f - k_f) * (1.0 - p).ln()
    } else {
        let nu = 1.0 / (eta * eta) - 1.0;
        let a = p * nu;
        let b = (1.0 - p) * nu;
        ln_choose(n, k) + ln_beta(k_f + a, n_f - k_f + b) - ln_beta(a, b)
    }
}

/// Log-likelihood of the full data set under a parameter set.
///
/// Applies the equal-asymptote substitution (`γ := λ`) when the
/// experiment type requires it. Out-of-domain parameter sets yield `-∞`
/// rather than an error, because grid corners and simplex vertices
/// routinely land there.
pub fn log_likelihood(
    data: &PsychData, sigmoid: &dyn Sigmoid, experiment: ExperimentType, params: &PsychParams,
) -> f64 {
    let gamma = match experiment {
        ExperimentType::EqualAsymptote => params.lambda,
        _ => params.gamma,
    };
    let mut checked = *params;
    checked.gamma = gamma;
    if !checked.in_domain() {
        return f64::NEG_INFINITY;
    }

    let mut total = 0.0;
    for (x, k, n) in data.blocks() {
        let s = sigmoid.value(x, params.threshold, params.width);
        let p = scaled_prob(s, params.lambda, gamma);
        total += block_log_likelihood(p, k, n, params.eta);
    }
    total
}

/// Log-posterior: log-likelihood plus the (unnormalized) axis log-priors,
/// restricted to the bounds box.
///
/// This is the objective the optimizer maximizes; points outside the box
/// or with zero prior density map to `-∞`.
pub fn log_posterior(
    data: &PsychData, sigmoid: &dyn Sigmoid, experiment: ExperimentType, priors: &PriorSet,
    bounds: &ParamBounds, params: &PsychParams,
) -> f64 {
    if !bounds.contains_all(&params.to_array()) {
        return f64::NEG_INFINITY;
    }
    let ll = log_likelihood(data, sigmoid, experiment, params);
    if ll == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let mut lp = ll;
    for param in Parameter::ALL {
        // Collapsed axes carry no prior information of their own.
        if bounds.is_fixed(param) {
            continue;
        }
        let density = priors.density(param, params.get(param));
        if density <= 0.0 {
            return f64::NEG_INFINITY;
        }
        lp += density.ln();
    }
    lp
}

/// Log-likelihood of the saturated model: one free success probability
/// per block, fitted at the observed proportion.
///
/// Binomial-coefficient terms are included to match
/// [`block_log_likelihood`], so deviances cancel them out.
pub fn saturated_log_likelihood(data: &PsychData) -> f64 {
    let mut total = 0.0;
    for (_, k, n) in data.blocks() {
        let k_f = k as f64;
        let n_f = n as f64;
        total += ln_choose(n, k);
        if k > 0 {
            total += k_f * (k_f / n_f).ln();
        }
        if k < n {
            total += (n_f - k_f) * ((n_f - k_f) / n_f).ln();
        }
    }
    total
}
