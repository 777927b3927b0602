//! # Parameter System
//!
//! Named parameters for the forward model and the curve-matching fitter.
//!
//! ## Core Components
//!
//! - [`FitParameter`]: one row of the fitting table, with bounds and fit/visibility flags
//! - [`ParameterSet`]: the name → value map consumed by the forward model
//! - [`Bounds`]: closed intervals used as hard projections during fitting
//! - [`names`]: the canonical parameter names
//!
//! ## Example Usage
//!
//! ```rust
//! use shale_welltest::parameters::{names, FitParameter, ParameterSet};
//!
//! let rows = vec![
//!     FitParameter::with_bounds(names::KF, 1e-3, 1e-6, 1.0).unwrap(),
//!     FitParameter::new(names::L, 1000.0).fitted(false),
//!     FitParameter::new(names::LF, 100.0).fitted(false),
//! ];
//!
//! let set = ParameterSet::from_fit_parameters(&rows);
//! assert_eq!(set.get(names::LFD), Some(0.1));
//! ```

pub mod bounds;
pub mod names;
pub mod parameter;
#[allow(clippy::module_inception)]
pub mod parameters;

pub use bounds::{Bounds, BoundsError};
pub use parameter::{is_linear_parameter, is_log_sensitive, FitParameter, ParameterError};
pub use parameters::ParameterSet;
