//! Finite difference Jacobian over named parameters.
//!
//! Well-test parameters span many decades (`lambda1` around 1e-7, `L` around
//! 1e3), so most of them are differentiated with respect to `log10(value)`.
//! Skin and fracture count can be zero or negative and are differentiated
//! linearly.

use crate::error::Result;
use crate::parameters::{is_log_sensitive, ParameterError, ParameterSet};
use crate::problem::Problem;
use crate::utils::parallel::map_ordered;
use log::trace;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Coordinate a parameter is differentiated and stepped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepScale {
    /// Steps act on `log10(value)`
    Log10,
    /// Steps act on `value`
    Linear,
}

impl StepScale {
    /// Scale for parameter `name` at its current `value`.
    pub fn for_parameter(name: &str, value: f64, log_floor: f64) -> Self {
        if is_log_sensitive(name, value, log_floor) {
            StepScale::Log10
        } else {
            StepScale::Linear
        }
    }

    /// Move `value` by `delta` in this coordinate.
    ///
    /// # Examples
    ///
    /// ```
    /// use shale_welltest::utils::finite_difference::StepScale;
    ///
    /// assert!((StepScale::Log10.perturb(1e-3, 1.0) - 1e-2).abs() < 1e-15);
    /// assert_eq!(StepScale::Linear.perturb(2.0, -0.5), 1.5);
    /// ```
    pub fn perturb(self, value: f64, delta: f64) -> f64 {
        match self {
            StepScale::Log10 => 10f64.powf(value.log10() + delta),
            StepScale::Linear => value + delta,
        }
    }
}

/// Step sizes of the central-difference Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSteps {
    /// Step in log10 space. Default: 0.01
    pub log10: f64,
    /// Step in linear space. Default: 1e-4
    pub linear: f64,
    /// Values at or below this are stepped linearly. Default: 1e-12
    pub log_floor: f64,
}

impl Default for DiffSteps {
    fn default() -> Self {
        Self {
            log10: 0.01,
            linear: 1e-4,
            log_floor: 1e-12,
        }
    }
}

impl DiffSteps {
    fn step_for(&self, scale: StepScale) -> f64 {
        match scale {
            StepScale::Log10 => self.log10,
            StepScale::Linear => self.linear,
        }
    }
}

/// Central-difference Jacobian of `problem` with respect to the `active`
/// parameters.
///
/// Column `j` is `(r(p + h e_j) - r(p - h e_j)) / 2h`, the step taken in the
/// coordinate given by [`StepScale::for_parameter`]. Perturbed values are not
/// clamped into any bounds. Writing `L` or `Lf` refreshes `LfD`.
///
/// A column whose perturbed evaluations fail is left at zero, so the
/// optimizer simply does not move that parameter this iteration.
///
/// # Errors
///
/// [`ParameterError::ParameterNotFound`] if an active name is missing from
/// `params`.
pub fn jacobian_central<P: Problem + ?Sized>(
    problem: &P,
    params: &ParameterSet,
    active: &[String],
    n_residuals: usize,
    steps: &DiffSteps,
) -> Result<Array2<f64>> {
    let mut centres = Vec::with_capacity(active.len());
    for name in active {
        let value = params
            .get(name)
            .ok_or_else(|| ParameterError::ParameterNotFound { name: name.clone() })?;
        centres.push((name.as_str(), value));
    }

    let columns = map_ordered(&centres, |&(name, value)| {
        let scale = StepScale::for_parameter(name, value, steps.log_floor);
        let h = steps.step_for(scale);

        let mut forward = params.clone();
        forward.set(name, scale.perturb(value, h));
        let mut backward = params.clone();
        backward.set(name, scale.perturb(value, -h));

        match (problem.eval(&forward), problem.eval(&backward)) {
            (Ok(r_plus), Ok(r_minus)) => Some((r_plus - r_minus) / (2.0 * h)),
            (Err(e), _) | (_, Err(e)) => {
                trace!("Jacobian column for {} left at zero: {}", name, e);
                None
            }
        }
    });

    let mut jac = Array2::zeros((n_residuals, active.len()));
    for (j, column) in columns.into_iter().enumerate() {
        let Some(column) = column else { continue };
        copy_column(&mut jac, j, &column);
    }

    Ok(jac)
}

/// Copy as many entries as both the column and the matrix hold.
fn copy_column(jac: &mut Array2<f64>, j: usize, column: &Array1<f64>) {
    let n = column.len().min(jac.nrows());
    for i in 0..n {
        jac[[i, j]] = column[i];
    }
}
