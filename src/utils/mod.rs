//! Utility functions and helpers for the shale-welltest library.

pub mod finite_difference;
pub mod matrix_convert;
pub mod parallel;

pub use finite_difference::{jacobian_central, DiffSteps, StepScale};
pub use matrix_convert::{nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};
pub use parallel::{map_ordered, try_map_ordered};
