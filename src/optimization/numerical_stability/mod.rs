//! Numerical stability helpers shared across the posterior machinery.

pub mod transformations;

pub mod prelude {
    pub use super::transformations::{
        PROB_EPS, clamp_probability, trapezoid_weights,
    };
}
