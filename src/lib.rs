//! # shale-welltest
//!
//! `shale-welltest` computes pressure-transient type curves for a
//! multi-fractured horizontal well in a radial composite, dual-porosity
//! shale reservoir and matches them against field data.
//!
//! The library provides:
//! - A semi-analytical Laplace-space solver covering six model variants
//!   (infinite, closed or constant-pressure outer boundary, with or without
//!   variable wellbore storage and skin)
//! - Stehfest inversion and the Bourdet log-time derivative
//! - A Levenberg-Marquardt curve matcher over named, bounded parameters
//! - Background fit sessions with progress events and cancellation
//!
//! ## Basic Usage
//!
//! ```
//! use shale_welltest::config::ReservoirDefaults;
//! use shale_welltest::model::{compute_curve, default_parameters, ModelVariant};
//!
//! let variant = ModelVariant::Model2;
//! let params = default_parameters(variant, &ReservoirDefaults::default());
//! let curve = compute_curve(variant, &params, Some(&[0.1, 1.0, 10.0])).unwrap();
//!
//! assert_eq!(curve.pressure.len(), 3);
//! assert!(curve.pressure[2] > curve.pressure[0]);
//! ```

pub mod config;
pub mod error;
pub mod fitting;
pub mod inversion;
pub mod lm;
pub mod model;
pub mod observed;
pub mod parameters;
pub mod problem;
pub mod special;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, WellTestError};
pub use fitting::{FitEvent, FitRequest, FitSession};
pub use lm::{FitStatus, LevenbergMarquardt};
pub use model::{compute_curve, ModelCurveData, ModelVariant};
pub use parameters::{FitParameter, ParameterSet};
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
