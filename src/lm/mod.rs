//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the damped Gauss-Newton loop used for type-curve
//! matching. It is generic over [`crate::problem::Problem`], so any residual
//! function over a named parameter set can be minimized; the well-test fit
//! uses [`crate::problem::CurveMatchProblem`].

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;

pub use algorithm::{LevenbergMarquardt, LmObserver, LmResult};
pub use config::LmConfig;
pub use convergence::FitStatus;
pub use step::NormalEquations;
