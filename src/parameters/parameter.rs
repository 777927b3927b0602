//! Fit parameter definition
//!
//! A [`FitParameter`] is one row of the fitting table: a named value, the
//! interval it may move in, whether the optimizer may move it, and whether a
//! front end should show it. The optimizer only ever writes the value.

use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::names;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names that are always stepped additively, never in log10 space.
const LINEAR_PARAMETERS: [&str; 2] = [names::S, names::NF];

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Parameter '{name}' has a non-finite value")]
    NonFiniteValue { name: String },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },
}

/// A parameter taking part (or not) in curve matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    /// Name of the parameter, one of [`crate::parameters::names`]
    pub name: String,

    /// Current value of the parameter
    value: f64,

    /// Minimum and maximum bounds for the parameter value
    bounds: Bounds,

    /// Whether the optimizer may change this parameter
    pub is_fit: bool,

    /// Whether a front end should display this parameter
    pub is_visible: bool,
}

impl FitParameter {
    /// Create an unbounded, fitted, visible parameter
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            bounds: Bounds::default(),
            is_fit: true,
            is_visible: true,
        }
    }

    /// Create a new parameter with the given name, value, and bounds
    ///
    /// The value is clamped into the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use shale_welltest::parameters::FitParameter;
    ///
    /// let kf = FitParameter::with_bounds("kf", 1e-3, 1e-6, 1.0).unwrap();
    /// assert_eq!(kf.value(), 1e-3);
    /// assert!(kf.is_fit);
    ///
    /// let clamped = FitParameter::with_bounds("kf", 5.0, 1e-6, 1.0).unwrap();
    /// assert_eq!(clamped.value(), 1.0);
    /// ```
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        if !value.is_finite() {
            return Err(ParameterError::NonFiniteValue {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            value: bounds.clamp(value),
            bounds,
            is_fit: true,
            is_visible: true,
        })
    }

    /// Builder-style setter for the fit flag
    pub fn fitted(mut self, is_fit: bool) -> Self {
        self.is_fit = is_fit;
        self
    }

    /// Builder-style setter for the display flag
    pub fn visible(mut self, is_visible: bool) -> Self {
        self.is_visible = is_visible;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter
    ///
    /// Returns an error and leaves the value untouched if it lies outside the
    /// bounds or is not finite.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::NonFiniteValue {
                name: self.name.clone(),
            });
        }
        self.value = self.bounds.check(value)?;
        Ok(())
    }

    /// Store `value` after projecting it into the bounds, returning what was stored
    pub fn set_value_clamped(&mut self, value: f64) -> f64 {
        self.value = self.bounds.clamp(value);
        self.value
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Replace the bounds, clamping the current value into them
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        let bounds = Bounds::new(min, max)?;
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
        Ok(())
    }

    /// Whether finite-difference and update steps for this parameter are
    /// taken in log10 space.
    ///
    /// True for every parameter except skin and fracture count, as long as
    /// the current value exceeds `floor`.
    pub fn is_log_sensitive(&self, floor: f64) -> bool {
        is_log_sensitive(&self.name, self.value, floor)
    }
}

/// Free-standing form of [`FitParameter::is_log_sensitive`].
pub fn is_log_sensitive(name: &str, value: f64, floor: f64) -> bool {
    value > floor && !is_linear_parameter(name)
}

/// Whether `name` is always stepped additively (skin and fracture count).
pub fn is_linear_parameter(name: &str) -> bool {
    LINEAR_PARAMETERS.contains(&name)
}
