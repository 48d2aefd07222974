//! Sigmoid families for the unscaled psychometric function.
//!
//! Purpose
//! -------
//! Provide the shape functions `S(x; m, w) -> [0, 1]` that the likelihood
//! scales between the guess and lapse asymptotes. Each family is
//! parameterized by a threshold `m` (the level where `S` reaches
//! `thresh_pc`) and a width `w` (the distance between the `width_alpha`
//! and `1 - width_alpha` quantiles), so parameters keep the same meaning
//! across families.
//!
//! Key behaviors
//! -------------
//! - [`Sigmoid::value`] evaluates `S(x)`; [`Sigmoid::inverse`] maps an
//!   unscaled proportion back to a stimulus level;
//!   [`Sigmoid::slope`] is the analytic derivative `dS/dx`.
//! - [`SigmoidKind`] names the built-in families and constructs boxed
//!   instances via [`SigmoidKind::build`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `0 < thresh_pc < 1` and `0 < width_alpha < 0.5`; both are validated
//!   by the options layer before a sigmoid is built.
//! - For any family, `value(m) == thresh_pc` and
//!   `inverse(1 - width_alpha) - inverse(width_alpha) == w` by
//!   construction.
//!
//! Conventions
//! -----------
//! - Families are expressed through a quantile function `t(p)` of a
//!   standard distribution: the location is `m - t(thresh_pc) * w / c`
//!   and the scale is `w / c` with `c = t(1 - width_alpha) -
//!   t(width_alpha)`.
//!
//! Downstream usage
//! ----------------
//! - The likelihood calls [`Sigmoid::value`] for every (level, threshold,
//!   width) combination on the grid; the result layer uses
//!   [`Sigmoid::inverse`] and [`Sigmoid::slope`] for threshold and slope
//!   queries at other proportions.
//!
//! Testing notes
//! -------------
//! - Unit tests check the two defining identities (threshold location and
//!   width quantiles), value/inverse round trips, and slope signs.
use crate::psychometric::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use statrs::function::erf::{erf, erf_inv};
use std::str::FromStr;

/// Standard normal CDF.
fn norm_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Standard normal quantile function.
fn norm_ppf(p: f64) -> f64 {
    std::f64::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// Standard normal density.
fn norm_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// Unscaled psychometric shape function.
///
/// Implementations are pure and carry only the `thresh_pc` /
/// `width_alpha` convention constants; threshold and width are passed per
/// call because the grid sweeps them.
pub trait Sigmoid: Send + Sync {
    /// `S(x; m, w)` in `[0, 1]`.
    fn value(&self, x: f64, threshold: f64, width: f64) -> f64;

    /// Stimulus level at which `S` reaches the unscaled proportion `p`.
    fn inverse(&self, p: f64, threshold: f64, width: f64) -> f64;

    /// Analytic derivative `dS/dx` at `x`.
    fn slope(&self, x: f64, threshold: f64, width: f64) -> f64;
}

/// Cumulative-normal sigmoid.
#[derive(Debug, Clone, Copy)]
pub struct Norm {
    /// `t(thresh_pc)` for the standard normal.
    z_pc: f64,
    /// `t(1 - width_alpha) - t(width_alpha)`.
    z_range: f64,
}

impl Norm {
    pub fn new(thresh_pc: f64, width_alpha: f64) -> Self {
        Norm { z_pc: norm_ppf(thresh_pc), z_range: norm_ppf(1.0 - width_alpha) - norm_ppf(width_alpha) }
    }

    fn location_scale(&self, threshold: f64, width: f64) -> (f64, f64) {
        let scale = width / self.z_range;
        (threshold - self.z_pc * scale, scale)
    }
}

impl Sigmoid for Norm {
    fn value(&self, x: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        norm_cdf((x - loc) / scale)
    }

    fn inverse(&self, p: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        loc + norm_ppf(p) * scale
    }

    fn slope(&self, x: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        norm_pdf((x - loc) / scale) / scale
    }
}

/// Logistic sigmoid.
#[derive(Debug, Clone, Copy)]
pub struct Logistic {
    /// `logit(thresh_pc)`.
    l_pc: f64,
    /// `logit(1 - width_alpha) - logit(width_alpha)`.
    l_range: f64,
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

impl Logistic {
    pub fn new(thresh_pc: f64, width_alpha: f64) -> Self {
        Logistic {
            l_pc: logit(thresh_pc),
            l_range: logit(1.0 - width_alpha) - logit(width_alpha),
        }
    }

    fn location_scale(&self, threshold: f64, width: f64) -> (f64, f64) {
        let scale = width / self.l_range;
        (threshold - self.l_pc * scale, scale)
    }
}

impl Sigmoid for Logistic {
    fn value(&self, x: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        1.0 / (1.0 + (-(x - loc) / scale).exp())
    }

    fn inverse(&self, p: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        loc + logit(p) * scale
    }

    fn slope(&self, x: f64, threshold: f64, width: f64) -> f64 {
        let (_, scale) = self.location_scale(threshold, width);
        let v = self.value(x, threshold, width);
        v * (1.0 - v) / scale
    }
}

/// Gumbel (log-Weibull) sigmoid; left-skewed in stimulus space.
#[derive(Debug, Clone, Copy)]
pub struct Gumbel {
    /// `t(thresh_pc)` with `t(p) = ln(-ln(1 - p))`.
    t_pc: f64,
    /// `t(1 - width_alpha) - t(width_alpha)`.
    t_range: f64,
}

fn gumbel_t(p: f64) -> f64 {
    (-(1.0 - p).ln()).ln()
}

impl Gumbel {
    pub fn new(thresh_pc: f64, width_alpha: f64) -> Self {
        Gumbel {
            t_pc: gumbel_t(thresh_pc),
            t_range: gumbel_t(1.0 - width_alpha) - gumbel_t(width_alpha),
        }
    }

    fn location_scale(&self, threshold: f64, width: f64) -> (f64, f64) {
        let scale = width / self.t_range;
        (threshold - self.t_pc * scale, scale)
    }
}

impl Sigmoid for Gumbel {
    fn value(&self, x: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        1.0 - (-((x - loc) / scale).exp()).exp()
    }

    fn inverse(&self, p: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        loc + gumbel_t(p) * scale
    }

    fn slope(&self, x: f64, threshold: f64, width: f64) -> f64 {
        let (loc, scale) = self.location_scale(threshold, width);
        let u = ((x - loc) / scale).exp();
        (-u).exp() * u / scale
    }
}

/// Name of a built-in sigmoid family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigmoidKind {
    Norm,
    Logistic,
    Gumbel,
}

impl SigmoidKind {
    /// Construct the named sigmoid with the given convention constants.
    pub fn build(self, thresh_pc: f64, width_alpha: f64) -> Box<dyn Sigmoid> {
        match self {
            SigmoidKind::Norm => Box::new(Norm::new(thresh_pc, width_alpha)),
            SigmoidKind::Logistic => Box::new(Logistic::new(thresh_pc, width_alpha)),
            SigmoidKind::Gumbel => Box::new(Gumbel::new(thresh_pc, width_alpha)),
        }
    }
}

impl FromStr for SigmoidKind {
    type Err = ConfigError;

    /// Parse a sigmoid name (case-insensitive).
    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "norm" | "gaussian" => Ok(SigmoidKind::Norm),
            "logistic" => Ok(SigmoidKind::Logistic),
            "gumbel" => Ok(SigmoidKind::Gumbel),
            _ => Err(ConfigError::InvalidSigmoidName { text: s.to_string() }),
        }
    }
}

impl std::fmt::Display for SigmoidKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigmoidKind::Norm => write!(f, "norm"),
            SigmoidKind::Logistic => write!(f, "logistic"),
            SigmoidKind::Gumbel => write!(f, "gumbel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The two defining identities of the parameterization for every
    //   family: S(m) == thresh_pc and the width-quantile distance.
    // - value/inverse round trips and analytic slopes against central
    //   differences.
    //
    // They intentionally DO NOT cover:
    // - Scaling by guess/lapse rates (likelihood module).
    // -------------------------------------------------------------------------

    const FAMILIES: [SigmoidKind; 3] =
        [SigmoidKind::Norm, SigmoidKind::Logistic, SigmoidKind::Gumbel];

    #[test]
    // Purpose
    // -------
    // For every family, the sigmoid must pass through thresh_pc at the
    // threshold and span exactly `width` between the width_alpha
    // quantiles.
    //
    // Given
    // -----
    // - thresh_pc = 0.5, width_alpha = 0.05, m = 0.3, w = 0.8.
    //
    // Expect
    // ------
    // - value(m) == 0.5 and inverse(0.95) - inverse(0.05) == 0.8, both to
    //   1e-10.
    fn defining_identities_hold() {
        for kind in FAMILIES {
            let s = kind.build(0.5, 0.05);
            let (m, w) = (0.3, 0.8);
            assert!((s.value(m, m, w) - 0.5).abs() < 1e-10, "{kind}");
            let span = s.inverse(0.95, m, w) - s.inverse(0.05, m, w);
            assert!((span - w).abs() < 1e-10, "{kind}");
        }
    }

    #[test]
    // Purpose
    // -------
    // inverse must undo value across the usable proportion range.
    fn value_inverse_round_trip() {
        for kind in FAMILIES {
            let s = kind.build(0.5, 0.05);
            for &p in &[0.05, 0.25, 0.5, 0.75, 0.95] {
                let x = s.inverse(p, 0.0, 1.0);
                assert!((s.value(x, 0.0, 1.0) - p).abs() < 1e-10, "{kind} at p={p}");
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // The analytic slope must match a central finite difference of value
    // and be strictly positive on the rising part of the curve.
    fn slope_matches_finite_difference() {
        let h = 1e-6;
        for kind in FAMILIES {
            let s = kind.build(0.5, 0.05);
            for &x in &[-0.5, 0.0, 0.4, 1.0] {
                let fd = (s.value(x + h, 0.0, 1.0) - s.value(x - h, 0.0, 1.0)) / (2.0 * h);
                let analytic = s.slope(x, 0.0, 1.0);
                assert!(analytic > 0.0, "{kind} at x={x}");
                assert!((analytic - fd).abs() < 1e-5, "{kind} at x={x}");
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A non-centered thresh_pc must shift the threshold location, not the
    // shape: value at the threshold equals the requested proportion.
    fn non_central_thresh_pc() {
        for kind in FAMILIES {
            let s = kind.build(0.75, 0.1);
            assert!((s.value(1.2, 1.2, 0.5) - 0.75).abs() < 1e-10, "{kind}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Sigmoid names parse case-insensitively and reject unknown families.
    fn kind_parsing() {
        assert_eq!("Norm".parse::<SigmoidKind>().unwrap(), SigmoidKind::Norm);
        assert_eq!("gaussian".parse::<SigmoidKind>().unwrap(), SigmoidKind::Norm);
        assert_eq!("LOGISTIC".parse::<SigmoidKind>().unwrap(), SigmoidKind::Logistic);
        assert!("weibull".parse::<SigmoidKind>().is_err());
    }
}
