//! Integration tests for the psychometric fitting pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end fit: from validated block data, through
//!   border refinement and grid integration, to point estimates,
//!   credible intervals, and derived curve queries.
//! - Exercise realistic experiment regimes (yes/no, nAFC, equal
//!   asymptote) rather than toy edge cases only.
//!
//! Coverage
//! --------
//! - `psychometric::core`:
//!   - `PsychData` construction and data-derived defaults.
//!   - `FitOptions` with reduced grid resolutions and fixed parameters.
//! - `psychometric::models::psychfit`:
//!   - `PsychModel` construction, fitting, cancellation, and the
//!     one-call `fit` entry point.
//! - `psychometric::result`:
//!   - Credible-interval lookup, threshold/slope queries, and the JSON
//!     round-trip.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of low-level building blocks (likelihood
//!   terms, prior shapes, numerical stability helpers) — these are
//!   covered by unit tests.
//! - Python bindings — tested from Python at a higher level.
//! - Exhaustive resolution sweeps over full-size grids — those belong in
//!   targeted performance tests.
use ndarray::Array1;
use rust_psychometrics::psychometric::{
    core::{
        bounds::ParamBounds,
        cancel::CancelToken,
        data::PsychData,
        experiment::ExperimentType,
        options::{FitOptions, GridSteps},
        params::{Parameter, PsychParams},
    },
    errors::{FitStage, PsychError},
    likelihood::log_posterior,
    models::psychfit::{PsychModel, fit},
    priors::PriorSet,
    result::FitResult,
    sigmoid::SigmoidKind,
};

/// Purpose
/// -------
/// Generate deterministic block data from a known psychometric function,
/// so fits have a ground truth to recover.
///
/// Parameters
/// ----------
/// - `levels`: Stimulus levels, one block per entry.
/// - `trials`: Trials per block; must be `> 0`.
/// - `threshold`, `width`: Location and spread of the generating norm
///   sigmoid (threshold proportion 0.5, width alpha 0.05).
/// - `lambda`, `gamma`: Lapse and guess rates of the generating curve.
///
/// Returns
/// -------
/// - A `PsychData` whose correct counts are the rounded expected counts
///   `round(trials · (γ + (1 − λ − γ)·S(x)))`.
///
/// Invariants
/// ----------
/// - Counts never exceed `trials`, so `PsychData::new` always succeeds
///   for valid asymptotes.
fn make_norm_data(
    levels: &[f64], trials: u64, threshold: f64, width: f64, lambda: f64, gamma: f64,
) -> PsychData {
    let sigmoid = SigmoidKind::Norm.build(0.5, 0.05);
    let correct: Vec<u64> = levels
        .iter()
        .map(|&x| {
            let p = gamma + (1.0 - lambda - gamma) * sigmoid.value(x, threshold, width);
            ((trials as f64) * p).round().min(trials as f64) as u64
        })
        .collect();
    PsychData::new(
        Array1::from(levels.to_vec()),
        Array1::from(correct),
        Array1::from_elem(levels.len(), trials),
    )
    .expect("PsychData::new should accept generated counts")
}

/// Purpose
/// -------
/// Provide a reduced-resolution `FitOptions` baseline so integration
/// tests run in seconds while keeping every pipeline stage active.
///
/// Configuration
/// -------------
/// - Moving grids: `[15, 15, 6, 6, 6]` points per axis.
/// - Final grid: `[20, 20, 8, 8, 8]` points per axis.
/// - Everything else at library defaults (norm sigmoid, yes/no
///   experiment, MAP estimate, Nelder–Mead refinement).
///
/// Returns
/// -------
/// - A validated-compatible `FitOptions` for most tests; experiment and
///   fixed-parameter tweaks are applied per test.
fn fast_options() -> FitOptions {
    FitOptions {
        moving_grid_steps: Some(GridSteps([15, 15, 6, 6, 6])),
        grid_steps: Some(GridSteps([20, 20, 8, 8, 8])),
        ..Default::default()
    }
}

/// Purpose
/// -------
/// Shared sanity assertions on any successful fit: estimates inside the
/// model domain, normalized marginals, and a finite deviance.
fn assert_result_sane(result: &FitResult) {
    assert!(result.estimate_map.in_domain());
    assert!(result.estimate_mean.in_domain());
    assert!(result.deviance.is_finite() && result.deviance >= 0.0);
    for param in Parameter::ALL {
        let mass: f64 = result.marginal_mass.get(param).iter().sum();
        assert!(
            (mass - 1.0).abs() < 1e-6,
            "marginal mass for {param} sums to {mass}, expected 1"
        );
    }
}

#[test]
// Purpose
// -------
// The full pipeline must recover the generating parameters of a clean
// yes/no data set to within the grid resolution, and the credible
// intervals must bracket the point estimate.
//
// Given
// -----
// - Seven blocks of 120 trials from a norm sigmoid with threshold 0.0,
//   width 2.0, lapse 0.02, guess 0.03.
// - Reduced grid resolutions from `fast_options()`.
//
// Expect
// ------
// - MAP threshold within 0.25 and width within 0.8 of the truth.
// - Each 95% interval contains the corresponding MAP value.
// - The shared sanity assertions hold.
fn fit_recovers_norm_parameters_on_yes_no_data() {
    let data = make_norm_data(&[-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0], 120, 0.0, 2.0, 0.02, 0.03);
    let result = fit(&data, fast_options()).expect("fit should succeed on clean data");

    assert_result_sane(&result);
    assert!(
        (result.estimate_map.threshold - 0.0).abs() < 0.25,
        "threshold estimate {} too far from 0",
        result.estimate_map.threshold
    );
    assert!(
        (result.estimate_map.width - 2.0).abs() < 0.8,
        "width estimate {} too far from 2",
        result.estimate_map.width
    );

    for param in [Parameter::Threshold, Parameter::Width] {
        let (lo, hi) = result
            .confidence_interval(0.95, param)
            .expect("0.95 is a configured level");
        let value = result.estimate_map.get(param);
        assert!(
            lo <= value && value <= hi,
            "95% interval [{lo}, {hi}] misses the {param} MAP {value}"
        );
    }
}

#[test]
// Purpose
// -------
// A 2AFC experiment must pin the guess rate at 1/2: the estimate, its
// grid axis, and its credible interval all collapse to that value.
//
// Given
// -----
// - Data generated with γ = 0.5 and a 2AFC configuration.
//
// Expect
// ------
// - Both estimates report γ = 0.5 exactly.
// - The 95% γ interval is the degenerate point (0.5, 0.5).
fn nafc_fit_pins_guess_rate() {
    let data = make_norm_data(&[-2.0, -1.0, 0.0, 1.0, 2.0, 3.0], 90, 0.5, 1.5, 0.02, 0.5);
    let options = FitOptions { experiment: ExperimentType::Nafc(2), ..fast_options() };
    let result = fit(&data, options).expect("2AFC fit should succeed");

    assert_result_sane(&result);
    assert_eq!(result.estimate_map.gamma, 0.5);
    assert_eq!(result.estimate_mean.gamma, 0.5);
    assert_eq!(result.confidence_interval(0.95, Parameter::Gamma).unwrap(), (0.5, 0.5));
}

#[test]
// Purpose
// -------
// An equal-asymptote fit must report matching lapse and guess rates in
// both estimates.
//
// Given
// -----
// - Data generated with λ = γ = 0.04.
//
// Expect
// ------
// - `estimate_map.gamma == estimate_map.lambda` and likewise for the
//   mean estimate.
fn equal_asymptote_reports_matching_asymptotes() {
    let data = make_norm_data(&[-3.0, -1.5, 0.0, 1.5, 3.0], 100, 0.0, 2.5, 0.04, 0.04);
    let options = FitOptions { experiment: ExperimentType::EqualAsymptote, ..fast_options() };
    let result = fit(&data, options).expect("equal-asymptote fit should succeed");

    assert_result_sane(&result);
    assert_eq!(result.estimate_map.gamma, result.estimate_map.lambda);
    assert_eq!(result.estimate_mean.gamma, result.estimate_mean.lambda);
}

#[test]
// Purpose
// -------
// Derived curve queries must be consistent with the fitted parameters:
// the threshold query at the configured proportion returns the threshold
// itself, and the slope at the threshold is positive for increasing
// data.
//
// Given
// -----
// - A completed yes/no fit on clean increasing data.
//
// Expect
// ------
// - `threshold_at(0.5, unscaled=true)` equals the MAP threshold.
// - `slope_at` at the threshold is strictly positive.
// - `curve_at` at the threshold lies strictly between the asymptotes.
fn curve_queries_match_estimates() {
    let data = make_norm_data(&[-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0], 120, 0.5, 2.0, 0.02, 0.03);
    let result = fit(&data, fast_options()).expect("fit should succeed");
    let est = result.estimate();

    let (point, intervals) =
        result.threshold_at(0.5, true).expect("0.5 is reachable unscaled");
    assert!((point - est.threshold).abs() < 1e-9);
    assert_eq!(intervals.len(), result.configuration.confidence_levels.len());

    assert!(result.slope_at(est.threshold) > 0.0);
    let mid = result.curve_at(est.threshold);
    assert!(mid > est.gamma && mid < 1.0 - est.lambda);
}

#[test]
// Purpose
// -------
// Fixing every parameter except the threshold degenerates the fit to a
// one-dimensional posterior, whose MAP must agree with a direct dense
// scan of the same objective along the threshold axis.
//
// Given
// -----
// - Norm data with width, lapse, guess, and overdispersion fixed to the
//   generating values, leaving only the threshold free.
//
// Expect
// ------
// - The fixed parameters echo exactly in the MAP estimate.
// - The fitted threshold lands at the scan argmax (within the scan
//   resolution) and its log-posterior matches the scan maximum.
fn single_free_parameter_matches_direct_scan() {
    let data =
        make_norm_data(&[-3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0], 120, 0.3, 2.0, 0.02, 0.03);
    let mut options = fast_options();
    options.fixed[Parameter::Width.index()] = Some(2.0);
    options.fixed[Parameter::Lambda.index()] = Some(0.02);
    options.fixed[Parameter::Gamma.index()] = Some(0.03);
    options.fixed[Parameter::Eta.index()] = Some(0.0);

    let result = fit(&data, options.clone()).expect("fit should succeed");
    assert_eq!(result.estimate_map.width, 2.0);
    assert_eq!(result.estimate_map.lambda, 0.02);
    assert_eq!(result.estimate_map.gamma, 0.03);
    assert_eq!(result.estimate_map.eta, 0.0);

    // Rebuild the objective the pipeline maximizes and scan it densely
    // over the full default threshold interval.
    let stimulus_range = data.stimulus_range().expect("range should resolve");
    let width_min = data.width_min_estimate().expect("spacing should resolve");
    let sigmoid = options.sigmoid.build(options.thresh_pc, options.width_alpha);
    let priors = PriorSet::defaults(stimulus_range, width_min, &options);
    let bounds = ParamBounds::defaults(stimulus_range, width_min, &options);
    let (lo, hi) = bounds.get(Parameter::Threshold);

    let steps = 4000;
    let scan_step = (hi - lo) / steps as f64;
    let mut best_x = lo;
    let mut best_lp = f64::NEG_INFINITY;
    for i in 0..=steps {
        let x = lo + scan_step * i as f64;
        let point = PsychParams::new(x, 2.0, 0.02, 0.03, 0.0).unwrap();
        let lp = log_posterior(
            &data,
            sigmoid.as_ref(),
            options.experiment,
            &priors,
            &bounds,
            &point,
        );
        if lp > best_lp {
            best_lp = lp;
            best_x = x;
        }
    }

    let map = result.estimate_map;
    assert!(
        (map.threshold - best_x).abs() <= 0.02,
        "MAP threshold {} disagrees with scan argmax {best_x}",
        map.threshold,
    );
    let map_point =
        PsychParams::new(map.threshold, 2.0, 0.02, 0.03, 0.0).unwrap();
    let map_lp = log_posterior(
        &data,
        sigmoid.as_ref(),
        options.experiment,
        &priors,
        &bounds,
        &map_point,
    );
    assert!(
        best_lp - map_lp <= 1e-2,
        "MAP log-posterior {map_lp} falls short of scan maximum {best_lp}",
    );
}

#[test]
// Purpose
// -------
// A full result must survive the JSON round-trip with estimates,
// intervals, weights, and the data echo intact.
fn json_round_trip_preserves_fit_record() {
    let data = make_norm_data(&[-2.0, -1.0, 0.0, 1.0, 2.0], 80, 0.0, 1.5, 0.02, 0.05);
    let result = fit(&data, fast_options()).expect("fit should succeed");

    let text = result.to_json().expect("serialization should succeed");
    let back = FitResult::from_json(&text).expect("deserialization should succeed");

    assert_eq!(back.estimate_map, result.estimate_map);
    assert_eq!(back.estimate_mean, result.estimate_mean);
    assert_eq!(back.confidence_intervals, result.confidence_intervals);
    assert_eq!(back.weights, result.weights);
    assert_eq!(back.data, result.data);
    assert_eq!(back.deviance, result.deviance);
}

#[test]
// Purpose
// -------
// A token fired before the fit starts must abort in the configuration
// stage, before any grid work, and leave the model unfitted.
fn cancellation_aborts_in_configuration_stage() {
    let data = make_norm_data(&[-2.0, 0.0, 2.0], 50, 0.0, 2.0, 0.02, 0.05);
    let mut model = PsychModel::new(fast_options()).expect("options should validate");
    let token = CancelToken::new();
    token.cancel();

    let err = model.fit_with_cancel(&data, Some(&token)).unwrap_err();
    assert!(matches!(err, PsychError::Cancelled { stage: FitStage::Configuring }));
    assert!(matches!(model.results(), Err(PsychError::ModelNotFitted)));
}

#[test]
// Purpose
// -------
// Fitting the same configured model twice must replace the cached result
// rather than accumulate state.
//
// Given
// -----
// - One model, two data sets with different thresholds.
//
// Expect
// ------
// - The second fit's threshold tracks the second data set.
fn refitting_replaces_cached_result() {
    let mut model = PsychModel::new(fast_options()).expect("options should validate");

    let low = make_norm_data(&[-3.0, -2.0, -1.0, 0.0, 1.0, 2.0], 100, -1.0, 2.0, 0.02, 0.03);
    model.fit(&low).expect("first fit should succeed");
    let first = model.results().unwrap().estimate_map.threshold;

    let high = make_norm_data(&[-2.0, -1.0, 0.0, 1.0, 2.0, 3.0], 100, 1.0, 2.0, 0.02, 0.03);
    model.fit(&high).expect("second fit should succeed");
    let second = model.results().unwrap().estimate_map.threshold;

    assert!(first < 0.0 && second > 0.0, "thresholds {first} / {second} do not track the data");
}
