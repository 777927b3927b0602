//! Numerical inversion of Laplace-space solutions and the log-time
//! derivative applied to the resulting curves.

pub mod derivative;
pub mod stehfest;

pub use derivative::{
    bourdet_derivative, smooth, MODEL_DERIVATIVE_SPACING, OBSERVED_DERIVATIVE_SPACING,
};
pub use stehfest::{
    apply_stress_sensitivity, stehfest_coefficient, Precision, StehfestInverter, MIN_INVERSION_TIME,
};
