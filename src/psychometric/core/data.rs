//! Trial data containers for psychometric-function fitting.
//!
//! Purpose
//! -------
//! Provide a small, validated container for blocked psychophysical trial
//! data. This module centralizes input validation for raw block data so
//! the likelihood and grid layers can assume clean inputs.
//!
//! Key behaviors
//! -------------
//! - [`PsychData`] enforces basic data invariants (equal array lengths,
//!   non-empty, finite stimulus levels, strictly positive trial counts,
//!   and correct counts bounded by trial counts).
//! - Derives the stimulus range and a minimal plausible psychometric
//!   width from the observed levels, which drive the default parameter
//!   bounds.
//!
//! Invariants & assumptions
//! ------------------------
//! - `levels`, `correct`, and `trials` all have the same, nonzero length.
//! - Every stimulus level is finite; every block has `trials > 0` and
//!   `correct <= trials`.
//! - Blocks need not be sorted by stimulus level and levels may repeat.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; one index addresses one block across all three
//!   arrays.
//! - "Correct" counts successes for yes/no data as well; the naming
//!   follows the forced-choice convention.
//!
//! Downstream usage
//! ----------------
//! - Construct [`PsychData`] at the boundary where raw blocks enter the
//!   fitting stack; the likelihood, grid, and model layers rely on its
//!   invariants and avoid re-validating.
//! - [`PsychData::stimulus_range`] and [`PsychData::width_min_estimate`]
//!   seed the default parameter bounds.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction (happy path, empty data, length
//!   mismatches, non-finite levels, zero trials, correct > trials) and
//!   the derived range/width quantities.
use crate::psychometric::errors::{PsychError, PsychResult};
use ndarray::Array1;

/// Validated blocked trial data for a psychometric experiment.
///
/// Fields
/// ------
/// - `levels`: stimulus level of each block (finite, any order).
/// - `correct`: number of correct (or "yes") responses per block.
/// - `trials`: number of trials per block (strictly positive).
///
/// Invariants
/// ----------
/// - All three arrays have the same nonzero length.
/// - `correct[i] <= trials[i]` for every block.
#[derive(Debug, Clone, PartialEq)]
pub struct PsychData {
    /// Stimulus level per block (must be finite).
    pub levels: Array1<f64>,
    /// Correct-response count per block.
    pub correct: Array1<u64>,
    /// Trial count per block (must be > 0).
    pub trials: Array1<u64>,
}

impl PsychData {
    /// Construct validated [`PsychData`] from raw block arrays.
    ///
    /// Parameters
    /// ----------
    /// - `levels`: stimulus level per block.
    /// - `correct`: correct-response count per block.
    /// - `trials`: trial count per block.
    ///
    /// Returns
    /// -------
    /// `PsychResult<PsychData>` with all invariants checked.
    ///
    /// Errors
    /// ------
    /// - `PsychError::DataLengthMismatch` when the arrays differ in length.
    /// - `PsychError::EmptyData` when there are no blocks.
    /// - `PsychError::NonFiniteLevel` for NaN/±∞ stimulus levels; the
    ///   index points to the first offending block.
    /// - `PsychError::ZeroTrials` when a block has no trials.
    /// - `PsychError::CorrectExceedsTrials` when a block reports more
    ///   correct responses than trials.
    pub fn new(
        levels: Array1<f64>, correct: Array1<u64>, trials: Array1<u64>,
    ) -> PsychResult<Self> {
        if levels.len() != correct.len() || levels.len() != trials.len() {
            return Err(PsychError::DataLengthMismatch {
                levels: levels.len(),
                correct: correct.len(),
                trials: trials.len(),
            });
        }
        if levels.is_empty() {
            return Err(PsychError::EmptyData);
        }

        for (index, &value) in levels.iter().enumerate() {
            if !value.is_finite() {
                return Err(PsychError::NonFiniteLevel { index, value });
            }
        }
        for (index, (&k, &n)) in correct.iter().zip(trials.iter()).enumerate() {
            if n == 0 {
                return Err(PsychError::ZeroTrials { index });
            }
            if k > n {
                return Err(PsychError::CorrectExceedsTrials { index, correct: k, trials: n });
            }
        }

        Ok(PsychData { levels, correct, trials })
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the data set holds no blocks. Always `false` for a
    /// constructed instance; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate over `(level, correct, trials)` triples.
    pub fn blocks(&self) -> impl Iterator<Item = (f64, u64, u64)> + '_ {
        self.levels
            .iter()
            .zip(self.correct.iter())
            .zip(self.trials.iter())
            .map(|((&x, &k), &n)| (x, k, n))
    }

    /// Observed stimulus range `(min, max)`.
    ///
    /// # Errors
    /// - `PsychError::DegenerateStimulusRange` when every block uses the
    ///   same stimulus level, so no range can be inferred.
    pub fn stimulus_range(&self) -> PsychResult<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &x in self.levels.iter() {
            min = min.min(x);
            max = max.max(x);
        }
        if min == max {
            return Err(PsychError::DegenerateStimulusRange { value: min });
        }
        Ok((min, max))
    }

    /// Smallest spacing between distinct stimulus levels.
    ///
    /// This is the finest structure the data can resolve and serves as the
    /// lower bound for the psychometric width.
    ///
    /// # Errors
    /// - `PsychError::DegenerateStimulusRange` when fewer than two distinct
    ///   levels exist.
    pub fn width_min_estimate(&self) -> PsychResult<f64> {
        let mut unique: Vec<f64> = self.levels.to_vec();
        unique.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        unique.dedup();
        if unique.len() < 2 {
            return Err(PsychError::DegenerateStimulusRange { value: unique[0] });
        }
        let mut min_diff = f64::INFINITY;
        for pair in unique.windows(2) {
            min_diff = min_diff.min(pair[1] - pair[0]);
        }
        Ok(min_diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction behavior of `PsychData::new`.
    // - Enforcement of invariants: equal lengths, non-empty data, finite
    //   levels, positive trials, correct <= trials.
    // - Derived quantities: stimulus range and minimal width estimate.
    //
    // They intentionally DO NOT cover:
    // - Likelihood evaluation over the data (tested in the likelihood module).
    // -------------------------------------------------------------------------

    fn make_data() -> PsychData {
        PsychData::new(
            array![0.001, 0.002, 0.004, 0.006],
            array![2, 5, 9, 10],
            array![10, 10, 10, 10],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that `PsychData::new` succeeds on valid blocks and preserves
    // the input arrays exactly.
    //
    // Given
    // -----
    // - Four valid blocks with distinct levels.
    //
    // Expect
    // ------
    // - Construction succeeds and `len` reports 4 blocks.
    fn psychdata_new_returns_ok_for_valid_input() {
        let data = make_data();
        assert_eq!(data.len(), 4);
        assert!(!data.is_empty());
    }

    #[test]
    // Purpose
    // -------
    // Ensure mismatched array lengths are rejected with the observed
    // lengths in the error.
    //
    // Given
    // -----
    // - Three levels but only two correct/trial entries.
    //
    // Expect
    // ------
    // - `Err(PsychError::DataLengthMismatch { levels: 3, correct: 2, trials: 2 })`.
    fn psychdata_new_rejects_length_mismatch() {
        let result = PsychData::new(array![0.0, 1.0, 2.0], array![1, 2], array![5, 5]);
        assert_eq!(
            result.unwrap_err(),
            PsychError::DataLengthMismatch { levels: 3, correct: 2, trials: 2 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Ensure empty data, non-finite levels, zero-trial blocks, and
    // correct > trials are each rejected with their specific variant.
    fn psychdata_new_rejects_invalid_blocks() {
        assert_eq!(
            PsychData::new(array![], array![], array![]).unwrap_err(),
            PsychError::EmptyData
        );
        assert!(matches!(
            PsychData::new(array![0.0, f64::NAN], array![1, 1], array![5, 5]).unwrap_err(),
            PsychError::NonFiniteLevel { index: 1, .. },
        ));
        assert_eq!(
            PsychData::new(array![0.0, 1.0], array![1, 0], array![5, 0]).unwrap_err(),
            PsychError::ZeroTrials { index: 1 },
        );
        assert_eq!(
            PsychData::new(array![0.0, 1.0], array![6, 1], array![5, 5]).unwrap_err(),
            PsychError::CorrectExceedsTrials { index: 0, correct: 6, trials: 5 },
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the derived stimulus range and minimal width estimate.
    //
    // Given
    // -----
    // - Levels [0.001, 0.002, 0.004, 0.006].
    //
    // Expect
    // ------
    // - Range (0.001, 0.006) and minimal spacing 0.001.
    fn derived_range_and_width_min() {
        let data = make_data();
        let (lo, hi) = data.stimulus_range().unwrap();
        assert_eq!((lo, hi), (0.001, 0.006));
        assert!((data.width_min_estimate().unwrap() - 0.001).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A single repeated level cannot define a range or a width bound.
    //
    // Given
    // -----
    // - Two blocks at the same stimulus level.
    //
    // Expect
    // ------
    // - Both derived quantities fail with `DegenerateStimulusRange`.
    fn derived_quantities_reject_degenerate_levels() {
        let data = PsychData::new(array![0.5, 0.5], array![1, 2], array![5, 5]).unwrap();
        assert!(matches!(
            data.stimulus_range().unwrap_err(),
            PsychError::DegenerateStimulusRange { .. }
        ));
        assert!(matches!(
            data.width_min_estimate().unwrap_err(),
            PsychError::DegenerateStimulusRange { .. }
        ));
    }
}
