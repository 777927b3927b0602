//! Problem definition trait and the curve-matching problem.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem over named parameters, and [`CurveMatchProblem`],
//! which compares the forward model against observed pressure and derivative
//! curves on a log scale.

use crate::error::{Result, WellTestError};
use crate::inversion::Precision;
use crate::model::{ModelCurveData, ModelVariant, WellTestModel};
use crate::observed::ObservedDataset;
use crate::parameters::ParameterSet;
use ndarray::Array1;
use std::sync::Arc;

/// Values at or below this are excluded from the log residuals.
const MIN_LOG_VALUE: f64 = 1e-10;

/// A trait representing a nonlinear least squares problem.
///
/// Parameters are addressed by name so the optimizer can move a subset of
/// them while the rest of the set stays fixed.
pub trait Problem: Sync {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The full parameter set, fitted and fixed values alike
    ///
    /// # Returns
    ///
    /// * A vector of `residual_count()` residuals, or an error if the
    ///   evaluation fails
    fn eval(&self, params: &ParameterSet) -> Result<Array1<f64>>;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &ParameterSet) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(sum_of_squares(&residuals))
    }
}

/// Sum of squared residuals.
pub fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Log-scale misfit between a model curve and observed data.
///
/// The fitter evaluates the model at the observed times in fast precision.
/// Residuals are laid out as a pressure block followed by a derivative
/// block:
///
/// * `w·(ln ΔP_obs - ln ΔP_model)` for the first `min(|ΔP_obs|, |t|)` points,
/// * `(1-w)·(ln D_obs - ln D_model)` for the first
///   `min(|D_obs|, |t|, pressure count)` points.
///
/// An entry is 0 unless both of its values exceed 1e-10.
#[derive(Debug, Clone)]
pub struct CurveMatchProblem {
    model: WellTestModel,
    observed: Arc<ObservedDataset>,
    weight: f64,
}

impl CurveMatchProblem {
    /// # Errors
    ///
    /// * `EmptyObservedData` if the dataset has no times
    /// * `InvalidInput` if `weight` is outside `[0, 1]`
    pub fn new(
        variant: ModelVariant,
        observed: Arc<ObservedDataset>,
        weight: f64,
    ) -> Result<Self> {
        if observed.is_empty() {
            return Err(WellTestError::EmptyObservedData);
        }
        if !(0.0..=1.0).contains(&weight) {
            return Err(WellTestError::InvalidInput(format!(
                "pressure weight must lie in [0, 1], got {}",
                weight
            )));
        }

        Ok(Self {
            model: WellTestModel::new(variant, Precision::Fast),
            observed,
            weight,
        })
    }

    /// Use a different forward model (precision, inverter) for residuals.
    pub fn with_model(mut self, model: WellTestModel) -> Self {
        self.model = model;
        self
    }

    pub fn variant(&self) -> ModelVariant {
        self.model.variant()
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn observed(&self) -> &ObservedDataset {
        &self.observed
    }

    /// Number of pressure and derivative residuals.
    fn block_sizes(&self) -> (usize, usize) {
        let n_time = self.observed.len();
        let n_pressure = self.observed.pressure().len().min(n_time);
        let n_derivative = self.observed.derivative().len().min(n_pressure);
        (n_pressure, n_derivative)
    }
}

impl Problem for CurveMatchProblem {
    fn eval(&self, params: &ParameterSet) -> Result<Array1<f64>> {
        let time = self.observed.time();
        let curve = self.model.compute_curve(params, Some(time))?;
        Ok(curve_residuals(&self.observed, &curve, self.weight))
    }

    fn residual_count(&self) -> usize {
        let (n_pressure, n_derivative) = self.block_sizes();
        n_pressure + n_derivative
    }
}

/// Residual vector of `curve` against `observed` with pressure weight `weight`.
///
/// # Examples
///
/// ```
/// use shale_welltest::model::ModelCurveData;
/// use shale_welltest::observed::ObservedDataset;
/// use shale_welltest::problem::curve_residuals;
///
/// let observed = ObservedDataset::new(vec![1.0, 2.0], vec![1.0, 2.0], vec![0.5]).unwrap();
/// let curve = ModelCurveData {
///     time: vec![1.0, 2.0],
///     pressure: vec![1.0, 1.0],
///     derivative: vec![0.5, 0.5],
/// };
/// let r = curve_residuals(&observed, &curve, 1.0);
/// assert_eq!(r.len(), 3);
/// assert!((r[1] - 2f64.ln()).abs() < 1e-15);
/// assert_eq!(r[2], 0.0);
/// ```
pub fn curve_residuals(
    observed: &ObservedDataset,
    curve: &ModelCurveData,
    weight: f64,
) -> Array1<f64> {
    let n_pressure = observed.pressure().len().min(curve.pressure.len());
    let n_derivative = observed
        .derivative()
        .len()
        .min(curve.derivative.len())
        .min(n_pressure);

    let pressure = observed.pressure()[..n_pressure]
        .iter()
        .zip(&curve.pressure[..n_pressure])
        .map(|(&obs, &model)| weight * log_misfit(obs, model));
    let derivative = observed.derivative()[..n_derivative]
        .iter()
        .zip(&curve.derivative[..n_derivative])
        .map(|(&obs, &model)| (1.0 - weight) * log_misfit(obs, model));

    pressure.chain(derivative).collect()
}

fn log_misfit(observed: f64, model: f64) -> f64 {
    if observed > MIN_LOG_VALUE && model > MIN_LOG_VALUE {
        observed.ln() - model.ln()
    } else {
        0.0
    }
}
