//! posterior_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the solvers used by the posterior
//! optimizer: a Nelder–Mead simplex (the default refinement method) and
//! L-BFGS with either Hager–Zhang or More–Thuente line search. These
//! helpers hide Argmin's generic wiring and apply crate-level options so
//! that higher-level code can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Build an initial simplex around a seed vector using a relative
//!   per-coordinate perturbation, with an absolute step for zero-valued
//!   coordinates, via [`build_nelder_mead`].
//! - Construct L-BFGS solvers with either line search based on crate-level
//!   aliases, applying optional tolerances from [`MapOptions`].
//! - Leave the initial parameter vector and maximum iterations to the
//!   runner/executor layer, keeping these builders side-effect free
//!   (except for Nelder–Mead, whose simplex *is* its initialization).
//!
//! Invariants & assumptions
//! ------------------------
//! - All solvers operate on the canonical optimizer numeric types
//!   [`Theta`], [`Grad`], and [`Cost`].
//! - The simplex has `dim + 1` vertices: the seed plus one perturbed copy
//!   per coordinate.
//! - The L-BFGS memory is either provided via `opts.lbfgs_mem` or defaults
//!   to [`DEFAULT_LBFGS_MEM`]; the simplex scale likewise defaults to
//!   [`DEFAULT_SIMPLEX_SCALE`].
//!
//! Conventions
//! -----------
//! - Errors are always reported via [`OptResult`]; the underlying
//!   `argmin::core::Error` values never leak across module boundaries.
//! - Nelder–Mead's standard-deviation tolerance is driven by
//!   `opts.tols.tol_cost` when present.
//!
//! Downstream usage
//! ----------------
//! - The `maximize_posterior` entry point dispatches on
//!   [`OptimMethod`](crate::optimization::posterior_optimizer::OptimMethod)
//!   and calls the matching builder, then hands the solver to the runner.
//!
//! Testing notes
//! -------------
//! - Unit tests verify simplex geometry (vertex count, perturbation of
//!   zero and nonzero coordinates) and that builders accept default
//!   options without panicking.
use argmin::solver::{neldermead::NelderMead, quasinewton::LBFGS};

use crate::optimization::{
    errors::OptResult,
    posterior_optimizer::{
        traits::MapOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_SCALE, Grad, HagerZhangLS, LbfgsHagerZhang,
            LbfgsMoreThuente, MoreThuenteLS, SimplexSolver, Theta, ZERO_COORD_STEP,
        },
    },
};

/// Construct a Nelder–Mead solver with an initial simplex around `theta0`.
///
/// The simplex consists of `theta0` itself plus one vertex per coordinate,
/// where coordinate `i` is perturbed by `scale * |theta0[i]|` (or by the
/// absolute step [`ZERO_COORD_STEP`] when the coordinate is zero). The
/// scale comes from `opts.simplex_scale`, defaulting to
/// [`DEFAULT_SIMPLEX_SCALE`].
///
/// If `opts.tols.tol_cost` is present it is applied as the simplex
/// standard-deviation tolerance.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) if Argmin rejects the
///   tolerance setting.
pub fn build_nelder_mead(theta0: &Theta, opts: &MapOptions) -> OptResult<SimplexSolver> {
    let scale = opts.simplex_scale.unwrap_or(DEFAULT_SIMPLEX_SCALE);
    let dim = theta0.len();
    let mut vertices: Vec<Theta> = Vec::with_capacity(dim + 1);
    vertices.push(theta0.clone());
    for i in 0..dim {
        let mut vertex = theta0.clone();
        let step = if vertex[i] == 0.0 { ZERO_COORD_STEP } else { scale * vertex[i].abs() };
        vertex[i] += step;
        vertices.push(vertex);
    }
    let mut solver = NelderMead::new(vertices);
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_sd_tolerance(c)?;
    }
    Ok(solver)
}

/// Construct L-BFGS with Hager–Zhang line search.
///
/// Uses `opts.lbfgs_mem` (default [`DEFAULT_LBFGS_MEM`]) and applies any
/// tolerances from `opts.tols` via [`configure_lbfgs`].
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) if Argmin rejects a
///   tolerance setting.
pub fn build_optimizer_hager_zhang(opts: &MapOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// Uses `opts.lbfgs_mem` (default [`DEFAULT_LBFGS_MEM`]) and applies any
/// tolerances from `opts.tols` via [`configure_lbfgs`].
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) if Argmin rejects a
///   tolerance setting.
pub fn build_optimizer_more_thuente(opts: &MapOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional tolerances to an L-BFGS solver.
///
/// When a tolerance is `None`, the corresponding `with_tolerance_*` method
/// is not called and Argmin's defaults remain in effect. This helper does
/// not touch the solver's initial parameter vector, iteration limit or
/// line-search settings.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) when
///   `with_tolerance_grad` or `with_tolerance_cost` rejects a value.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MapOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::posterior_optimizer::traits::{MapOptions, OptimMethod, Tolerances};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Simplex construction geometry (relative steps, zero-coordinate steps).
    // - Basic construction of L-BFGS solvers with both line searches.
    //
    // They intentionally DO NOT cover:
    // - End-to-end executor behavior (tested in the runner layer).
    // -------------------------------------------------------------------------

    fn opts(method: OptimMethod) -> MapOptions {
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).unwrap();
        MapOptions::new(tols, method, false, None, None).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Building a Nelder-Mead solver around a seed with a zero coordinate
    // must succeed; the simplex construction applies an absolute step for
    // zero entries so the vertices are affinely independent.
    //
    // Given
    // -----
    // - A 3-vector seed with one zero coordinate and default options.
    //
    // Expect
    // ------
    // - `build_nelder_mead` returns `Ok(_)`.
    fn build_nelder_mead_handles_zero_coordinates() {
        // Arrange
        let theta0: Theta = array![1.0, 0.0, -2.0];

        // Act
        let solver = build_nelder_mead(&theta0, &opts(OptimMethod::NelderMead));

        // Assert
        assert!(solver.is_ok(), "Simplex construction should succeed for zero coordinates");
    }

    #[test]
    // Purpose
    // -------
    // Both L-BFGS builders must produce solvers from valid default options.
    //
    // Given
    // -----
    // - Valid tolerances and no explicit memory setting.
    //
    // Expect
    // ------
    // - Both builders return `Ok(_)`.
    fn lbfgs_builders_accept_default_options() {
        // Arrange
        let hz_opts = opts(OptimMethod::LbfgsHagerZhang);
        let mt_opts = opts(OptimMethod::LbfgsMoreThuente);

        // Act / Assert
        assert!(build_optimizer_hager_zhang(&hz_opts).is_ok());
        assert!(build_optimizer_more_thuente(&mt_opts).is_ok());
    }
}
