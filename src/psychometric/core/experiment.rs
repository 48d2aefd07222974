//! Experiment-type vocabulary and its parameter constraints.
//!
//! The experiment type determines how the guess rate `gamma` is treated:
//! free (yes/no), tied to the lapse rate (equal asymptote), or fixed at
//! `1/n` (n-alternative forced choice).
use crate::psychometric::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of psychophysical experiment being fitted.
///
/// Variants
/// --------
/// - `YesNo`: detection task; all five parameters are free by default.
/// - `EqualAsymptote`: the guess rate is constrained to equal the lapse
///   rate, removing one grid dimension.
/// - `Nafc(n)`: n-alternative forced choice; the guess rate is fixed at
///   `1/n` and must not be fixed manually to any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentType {
    YesNo,
    EqualAsymptote,
    Nafc(u32),
}

impl ExperimentType {
    /// Guess rate imposed by the experiment type, if any.
    ///
    /// Returns `Some(1/n)` for `Nafc(n)` and `None` otherwise.
    pub fn guess_rate(self) -> Option<f64> {
        match self {
            ExperimentType::Nafc(n) => Some(1.0 / n as f64),
            _ => None,
        }
    }

    /// Whether the guess rate occupies its own grid axis.
    ///
    /// `false` for `Nafc` (gamma is a known constant) and for
    /// `EqualAsymptote` (gamma mirrors lambda).
    pub fn gamma_is_free(self) -> bool {
        matches!(self, ExperimentType::YesNo)
    }

    /// Validate structural constraints of the variant itself.
    ///
    /// # Errors
    /// - `ConfigError::InvalidAlternatives` for `Nafc(n)` with `n < 2`.
    pub fn validate(self) -> ConfigResult<()> {
        if let ExperimentType::Nafc(n) = self {
            if n < 2 {
                return Err(ConfigError::InvalidAlternatives { n });
            }
        }
        Ok(())
    }
}

impl FromStr for ExperimentType {
    type Err = ConfigError;

    /// Parse an experiment-type string (case-insensitive).
    ///
    /// Accepts `"yes/no"`, `"equal asymptote"`, and `"<n>AFC"` for an
    /// integer `n >= 2` (e.g. `"2AFC"`, `"3afc"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "yes/no" | "yes-no" | "yesno" => return Ok(ExperimentType::YesNo),
            "equal asymptote" | "equal-asymptote" => return Ok(ExperimentType::EqualAsymptote),
            _ => {}
        }
        if let Some(prefix) = lower.strip_suffix("afc") {
            if let Ok(n) = prefix.trim().parse::<u32>() {
                let experiment = ExperimentType::Nafc(n);
                experiment.validate()?;
                return Ok(experiment);
            }
        }
        Err(ConfigError::InvalidExperiment { text: s.to_string() })
    }
}

impl std::fmt::Display for ExperimentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentType::YesNo => write!(f, "yes/no"),
            ExperimentType::EqualAsymptote => write!(f, "equal asymptote"),
            ExperimentType::Nafc(n) => write!(f, "{n}AFC"),
        }
    }
}
