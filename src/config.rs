//! Configuration values shared across the crate.
//!
//! Every configuration struct is plain data with a [`Default`] and serde
//! support, so a front end can keep it in a JSON file and hand the parsed
//! value to the library. Nothing here is global: callers own the values and
//! pass them in.

use crate::error::Result;
use crate::parameters::{names, ParameterSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON loading for configuration structs.
pub trait JsonConfig: DeserializeOwned + Serialize {
    /// Parse from a JSON string. Missing fields take their default.
    fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reservoir and fluid properties shared by every model variant.
///
/// These are the values a project-settings screen would edit once per well.
/// Units: `phi` fraction, `h` m, `mu` mPa·s, `b` dimensionless,
/// `ct` 1/MPa, `q` m³/d.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirDefaults {
    /// Porosity
    pub phi: f64,

    /// Net thickness
    pub h: f64,

    /// Oil viscosity
    pub mu: f64,

    /// Formation volume factor
    #[serde(rename = "B")]
    pub b: f64,

    /// Total compressibility
    #[serde(rename = "Ct")]
    pub ct: f64,

    /// Production rate
    pub q: f64,
}

impl Default for ReservoirDefaults {
    fn default() -> Self {
        Self {
            phi: 0.05,
            h: 20.0,
            mu: 0.5,
            b: 1.05,
            ct: 5e-4,
            q: 5.0,
        }
    }
}

impl JsonConfig for ReservoirDefaults {}

impl ReservoirDefaults {
    /// Write these values into a parameter set under their canonical names.
    pub fn apply_to(&self, set: &mut ParameterSet) {
        set.set(names::PHI, self.phi);
        set.set(names::H, self.h);
        set.set(names::MU, self.mu);
        set.set(names::B, self.b);
        set.set(names::CT, self.ct);
        set.set(names::Q, self.q);
    }
}

/// Log-spaced evaluation grid used when the caller supplies no time points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeGrid {
    /// Number of points
    pub count: usize,

    /// log10 of the first time (h)
    pub start_exp: f64,

    /// log10 of the last time (h)
    pub end_exp: f64,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            count: 100,
            start_exp: -3.0,
            end_exp: 3.0,
        }
    }
}

impl JsonConfig for TimeGrid {}

impl TimeGrid {
    pub fn new(count: usize, start_exp: f64, end_exp: f64) -> Self {
        Self {
            count,
            start_exp,
            end_exp,
        }
    }

    /// Materialize the grid.
    pub fn points(&self) -> Vec<f64> {
        log_time_grid(self.count, self.start_exp, self.end_exp)
    }
}

/// `count` times evenly spaced in log10 between `10^start_exp` and `10^end_exp`.
///
/// # Examples
///
/// ```
/// use shale_welltest::config::log_time_grid;
///
/// assert!(log_time_grid(0, -3.0, 3.0).is_empty());
/// assert_eq!(log_time_grid(1, 2.0, 3.0), vec![100.0]);
///
/// let grid = log_time_grid(7, -3.0, 3.0);
/// assert_eq!(grid.len(), 7);
/// assert!((grid[3] - 1.0).abs() < 1e-12);
/// ```
pub fn log_time_grid(count: usize, start_exp: f64, end_exp: f64) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![10f64.powf(start_exp)],
        _ => {
            let step = (end_exp - start_exp) / (count - 1) as f64;
            (0..count)
                .map(|i| 10f64.powf(start_exp + i as f64 * step))
                .collect()
        }
    }
}
