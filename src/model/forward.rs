//! Forward model: physical parameters in, pressure and derivative curves out.
//!
//! [`WellTestModel`] ties the pieces together for one variant:
//!
//! 1. physical times are scaled to `tD = 14.4·kf·t / (φ·μ·Ct·L²)`,
//! 2. the composite Laplace solution is inverted at each `tD` (Stehfest),
//! 3. the stress-sensitivity correction is applied,
//! 4. the Bourdet derivative is taken in dimensionless time,
//! 5. both curves are scaled to MPa by `1.842e-3·q·μ·B / (kf·h)`.
//!
//! Evaluation is a pure function of its inputs; a model value can be shared
//! freely between threads.

use crate::config::TimeGrid;
use crate::error::Result;
use crate::inversion::{
    apply_stress_sensitivity, bourdet_derivative, Precision, StehfestInverter,
    MODEL_DERIVATIVE_SPACING,
};
use crate::model::dimensionless::{DimensionlessParams, PhysicalParams};
use crate::model::laplace::CompositeSolver;
use crate::model::variant::ModelVariant;
use crate::parameters::ParameterSet;
use crate::utils::parallel::{map_ordered, try_map_ordered};
use log::debug;
use serde::{Deserialize, Serialize};

/// Pressure and derivative curves, one entry per time point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCurveData {
    /// Time (h)
    pub time: Vec<f64>,
    /// Pressure difference (MPa)
    pub pressure: Vec<f64>,
    /// `dP / d ln t` (MPa)
    pub derivative: Vec<f64>,
}

impl ModelCurveData {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// One curve of a sensitivity study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCurve {
    /// Value the studied parameter took for this curve
    pub value: f64,
    pub curve: ModelCurveData,
}

/// Forward model for one variant at a given inversion precision.
#[derive(Debug, Clone)]
pub struct WellTestModel {
    variant: ModelVariant,
    inverter: StehfestInverter,
    time_grid: TimeGrid,
}

impl WellTestModel {
    /// Create a model evaluated with `precision`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shale_welltest::config::ReservoirDefaults;
    /// use shale_welltest::inversion::Precision;
    /// use shale_welltest::model::{default_parameters, ModelVariant, WellTestModel};
    ///
    /// let model = WellTestModel::new(ModelVariant::Model2, Precision::Fast);
    /// let params = default_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
    /// let curve = model.compute_curve(&params, Some(&[0.1, 1.0, 10.0])).unwrap();
    ///
    /// assert_eq!(curve.len(), 3);
    /// assert!(curve.pressure.iter().all(|p| p.is_finite()));
    /// ```
    pub fn new(variant: ModelVariant, precision: Precision) -> Self {
        Self {
            variant,
            inverter: StehfestInverter::with_precision(precision),
            time_grid: TimeGrid::default(),
        }
    }

    /// Replace the inverter, e.g. to use a non-standard number of terms.
    pub fn with_inverter(mut self, inverter: StehfestInverter) -> Self {
        self.inverter = inverter;
        self
    }

    /// Grid used when [`compute_curve`](Self::compute_curve) receives no times.
    pub fn with_time_grid(mut self, time_grid: TimeGrid) -> Self {
        self.time_grid = time_grid;
        self
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn stehfest_terms(&self) -> usize {
        self.inverter.terms()
    }

    /// Evaluate pressure and derivative at `times` (hours), or on the
    /// model's default log grid when `times` is `None`.
    ///
    /// Output order matches input order. Times mapping to `tD ≤ 1e-12` yield
    /// zero pressure and derivative.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the parameter set fails validation. No work is
    /// done in that case.
    pub fn compute_curve(
        &self,
        params: &ParameterSet,
        times: Option<&[f64]>,
    ) -> Result<ModelCurveData> {
        let physical = PhysicalParams::from_parameters(params)?;
        let dimensionless = DimensionlessParams::from_parameters(params, self.variant)?;

        let time = match times {
            Some(t) => t.to_vec(),
            None => self.time_grid.points(),
        };

        let t_d: Vec<f64> = time
            .iter()
            .map(|&t| physical.dimensionless_time(t))
            .collect();

        let solver = CompositeSolver::new(dimensionless, self.variant);
        let gama_d = dimensionless.gama_d;
        let p_d = map_ordered(&t_d, |&td| {
            let raw = self.inverter.invert(td, |z| solver.laplace_pressure(z));
            apply_stress_sensitivity(raw, gama_d)
        });

        let dp_d = bourdet_derivative(&t_d, &p_d, MODEL_DERIVATIVE_SPACING);

        let factor = physical.pressure_factor();
        debug!(
            "{}: {} points, N = {}, factor = {:e}",
            self.variant,
            time.len(),
            self.inverter.terms(),
            factor
        );

        Ok(ModelCurveData {
            pressure: p_d.iter().map(|p| factor * p).collect(),
            derivative: dp_d.iter().map(|d| factor * d).collect(),
            time,
        })
    }

    /// One curve per value of a single parameter, all other parameters held
    /// at `base`.
    ///
    /// Writing `L` or `Lf` keeps `LfD` consistent. Curves are returned in the
    /// order of `values`.
    pub fn sensitivity_curves(
        &self,
        base: &ParameterSet,
        name: &str,
        values: &[f64],
        times: Option<&[f64]>,
    ) -> Result<Vec<SensitivityCurve>> {
        try_map_ordered(values, |&value| {
            let mut params = base.clone();
            params.set(name, value);
            let curve = self.compute_curve(&params, times)?;
            Ok(SensitivityCurve { value, curve })
        })
    }
}

/// Evaluate a curve at display precision.
///
/// Shorthand for `WellTestModel::new(variant, Precision::High).compute_curve(..)`.
pub fn compute_curve(
    variant: ModelVariant,
    params: &ParameterSet,
    times: Option<&[f64]>,
) -> Result<ModelCurveData> {
    WellTestModel::new(variant, Precision::High).compute_curve(params, times)
}
