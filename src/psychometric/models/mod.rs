//! Model-level fitting interfaces.
//!
//! Purpose
//! -------
//! Expose the high-level entry points: the configurable [`PsychModel`]
//! and the one-call [`fit`] function.
//!
//! Downstream usage
//! ----------------
//! - Library users start here; the grid, posterior and optimizer layers
//!   are implementation detail they only touch for custom workflows.
pub mod psychfit;

pub use psychfit::{PsychModel, fit};

/// Everything needed to configure and run a fit.
pub mod prelude {
    pub use super::psychfit::{PsychModel, fit};
}
