//! # Composite Reservoir Model
//!
//! Semi-analytical pressure-transient model of a multi-fractured horizontal
//! well in a radial composite, dual-porosity shale reservoir. One solver
//! serves all six [`ModelVariant`]s; the variant only switches the outer
//! boundary treatment and the wellbore storage convolution.
//!
//! ## Example
//!
//! ```rust
//! use shale_welltest::config::ReservoirDefaults;
//! use shale_welltest::model::{compute_curve, default_parameters, ModelVariant};
//!
//! let variant = ModelVariant::Model4;
//! let params = default_parameters(variant, &ReservoirDefaults::default());
//! let curve = compute_curve(variant, &params, Some(&[1.0, 10.0, 100.0])).unwrap();
//!
//! assert_eq!(curve.time, vec![1.0, 10.0, 100.0]);
//! ```

pub mod defaults;
pub mod dimensionless;
pub mod forward;
pub mod laplace;
pub mod variant;

pub use defaults::{default_fit_parameters, default_parameters};
pub use dimensionless::{DimensionlessParams, PhysicalParams};
pub use forward::{compute_curve, ModelCurveData, SensitivityCurve, WellTestModel};
pub use laplace::{apply_wellbore_storage, CompositeSolver};
pub use variant::{ModelVariant, OuterBoundary, WellboreStorage};
