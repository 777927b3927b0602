//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! The defaults reproduce the curve-matching behaviour well-test analysts
//! are used to: a modest starting damping, decade-sized damping changes and
//! a mean-squared log misfit of 3e-3 counted as a match.

use crate::config::JsonConfig;
use crate::utils::finite_difference::DiffSteps;
use serde::{Deserialize, Serialize};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of outer iterations. Default: 50
    pub max_iterations: usize,

    /// Initial value for the damping parameter. Default: 0.01
    pub initial_lambda: f64,

    /// Factor by which to increase lambda after a rejected trial. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda after an accepted trial. Default: 0.1
    pub lambda_down_factor: f64,

    /// Once lambda exceeds this without an accepted trial the fit stops. Default: 1e10
    pub max_lambda: f64,

    /// Damping trials per outer iteration. Default: 5
    pub damping_tries: usize,

    /// Mean squared residual below which the fit has converged. Default: 3e-3
    pub mse_tolerance: f64,

    /// Finite-difference steps for the Jacobian
    pub diff_steps: DiffSteps,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            initial_lambda: 0.01,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            max_lambda: 1e10,
            damping_tries: 5,
            mse_tolerance: 3e-3,
            diff_steps: DiffSteps::default(),
        }
    }
}

impl JsonConfig for LmConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LmConfig::default();
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.initial_lambda, 0.01);
        assert_eq!(config.damping_tries, 5);
        assert_eq!(config.mse_tolerance, 3e-3);
        assert_eq!(config.diff_steps.log10, 0.01);
        assert_eq!(config.diff_steps.linear, 1e-4);
    }

    #[test]
    fn test_partial_json() {
        let config = LmConfig::from_json_str(r#"{ "max_iterations": 10 }"#).unwrap();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_lambda, 1e10);

        let text = config.to_json_string().unwrap();
        assert_eq!(LmConfig::from_json_str(&text).unwrap(), config);
    }
}
