//! Observed well-test data.
//!
//! The fitter consumes three sequences: elapsed time, pressure difference and
//! its log-time derivative. [`ObservedDataset::new`] accepts them as-is;
//! [`ObservedDataset::from_gauge`] turns raw gauge pressures into pressure
//! differences for drawdown or build-up tests and computes the Bourdet
//! derivative when no derivative column is available.

use crate::error::{Result, WellTestError};
use crate::inversion::{bourdet_derivative, smooth, OBSERVED_DERIVATIVE_SPACING};
use log::debug;
use serde::{Deserialize, Serialize};

/// Kind of pressure-transient test the gauge data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum TestType {
    /// `ΔP = |p_i - p(t)|` against the initial reservoir pressure
    Drawdown { initial_pressure: f64 },
    /// `ΔP = |p(Δt) - p(Δt = 0)|`, the first sample being the shut-in pressure
    #[default]
    BuildUp,
}

/// How gauge readings are turned into a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub test_type: TestType,
    /// Moving-average window applied to the derivative, if any
    pub smoothing_span: Option<usize>,
}

/// Time, pressure difference and derivative of one test.
///
/// The three sequences may differ in length; consumers use the common
/// prefix. Times are strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedDataset {
    time: Vec<f64>,
    pressure: Vec<f64>,
    derivative: Vec<f64>,
}

impl ObservedDataset {
    /// Wrap already processed sequences.
    ///
    /// # Errors
    ///
    /// * `EmptyObservedData` if `time` is empty
    /// * `InvalidInput` if a time is not finite and positive, or a pressure or
    ///   derivative value is not finite
    ///
    /// # Examples
    ///
    /// ```
    /// use shale_welltest::observed::ObservedDataset;
    ///
    /// let data = ObservedDataset::new(
    ///     vec![0.1, 1.0, 10.0],
    ///     vec![0.5, 1.0, 1.8],
    ///     vec![0.2, 0.3, 0.4],
    /// ).unwrap();
    /// assert_eq!(data.len(), 3);
    ///
    /// assert!(ObservedDataset::new(vec![], vec![], vec![]).is_err());
    /// ```
    pub fn new(time: Vec<f64>, pressure: Vec<f64>, derivative: Vec<f64>) -> Result<Self> {
        if time.is_empty() {
            return Err(WellTestError::EmptyObservedData);
        }
        if let Some(bad) = time.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
            return Err(WellTestError::InvalidInput(format!(
                "observed times must be finite and positive, got {}",
                bad
            )));
        }
        let all_finite = pressure.iter().chain(&derivative).all(|v| v.is_finite());
        if !all_finite {
            return Err(WellTestError::InvalidInput(
                "observed pressure and derivative must be finite".to_string(),
            ));
        }

        Ok(Self {
            time,
            pressure,
            derivative,
        })
    }

    /// Build a dataset from pressure differences, deriving the Bourdet
    /// derivative with an L-spacing of 0.15.
    pub fn from_pressure_difference(time: Vec<f64>, delta_p: Vec<f64>) -> Result<Self> {
        let derivative = bourdet_derivative(&time, &delta_p, OBSERVED_DERIVATIVE_SPACING);
        Self::new(time, delta_p, derivative)
    }

    /// Build a dataset from raw gauge readings.
    ///
    /// Rows with a non-positive or non-finite time, or a non-finite pressure,
    /// are skipped. When `derivative` is `None` the Bourdet derivative of the
    /// pressure difference is computed; a supplied derivative column is
    /// aligned with the kept rows and padded with zeros where it is short.
    /// Smoothing, when requested, applies to either.
    ///
    /// # Errors
    ///
    /// `EmptyObservedData` if no row survives filtering.
    pub fn from_gauge(
        time: &[f64],
        pressure: &[f64],
        derivative: Option<&[f64]>,
        settings: &ImportSettings,
    ) -> Result<Self> {
        let rows: Vec<usize> = (0..time.len().min(pressure.len()))
            .filter(|&i| time[i].is_finite() && time[i] > 0.0 && pressure[i].is_finite())
            .collect();
        if rows.is_empty() {
            return Err(WellTestError::EmptyObservedData);
        }
        if rows.len() < time.len() {
            debug!("skipped {} invalid gauge rows", time.len() - rows.len());
        }

        let kept_time: Vec<f64> = rows.iter().map(|&i| time[i]).collect();
        let raw: Vec<f64> = rows.iter().map(|&i| pressure[i]).collect();

        let delta_p: Vec<f64> = match settings.test_type {
            TestType::Drawdown { initial_pressure } => {
                raw.iter().map(|p| (initial_pressure - p).abs()).collect()
            }
            TestType::BuildUp => {
                let shut_in = raw[0];
                raw.iter().map(|p| (p - shut_in).abs()).collect()
            }
        };

        let mut deriv = match derivative {
            Some(column) => rows
                .iter()
                .map(|&i| column.get(i).copied().filter(|d| d.is_finite()))
                .map(|d| d.unwrap_or(0.0))
                .collect(),
            None => bourdet_derivative(&kept_time, &delta_p, OBSERVED_DERIVATIVE_SPACING),
        };
        if let Some(span) = settings.smoothing_span {
            deriv = smooth(&deriv, span);
        }

        Self::new(kept_time, delta_p, deriv)
    }

    /// Copy with the derivative smoothed by a centred moving average.
    pub fn smoothed(&self, span: usize) -> Self {
        Self {
            time: self.time.clone(),
            pressure: self.pressure.clone(),
            derivative: smooth(&self.derivative, span),
        }
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn derivative(&self) -> &[f64] {
        &self.derivative
    }

    /// Number of time samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
