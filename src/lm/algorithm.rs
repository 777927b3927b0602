//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! The optimizer works on a named [`ParameterSet`] and moves only the rows of
//! the fit table flagged `is_fit`. Log-sensitive parameters are stepped in
//! log10 space, the rest additively, and every trial value is clamped into
//! its row's bounds.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use ndarray::Array1;

use crate::error::Result;
use crate::parameters::{FitParameter, ParameterSet};
use crate::problem::{sum_of_squares, Problem};
use crate::utils::finite_difference::{jacobian_central, DiffSteps, StepScale};

use super::config::LmConfig;
use super::convergence::FitStatus;
use super::step::NormalEquations;

/// Receives the optimizer's intermediate state.
///
/// Both hooks run on the optimizer's thread, in iteration order.
pub trait LmObserver {
    /// Called at the start of each outer iteration with
    /// `iteration·100 / max_iterations`.
    fn on_progress(&mut self, _percent: usize) {}

    /// Called with the starting point and after every accepted trial.
    fn on_update(&mut self, _mse: f64, _params: &ParameterSet) {}
}

impl LmObserver for () {}

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Why the loop stopped
    pub status: FitStatus,

    /// Best parameters found, fitted and fixed alike
    pub params: ParameterSet,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub sse: f64,

    /// Mean squared residual
    pub mse: f64,

    /// Number of outer iterations that computed a Jacobian
    pub iterations: usize,

    /// Number of residual evaluations
    pub evaluations: usize,

    /// Damping parameter at termination
    pub lambda: f64,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Status: {}", self.status)?;
        writeln!(f, "  MSE: {:.6e}", self.mse)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Evaluations: {}", self.evaluations)?;
        for (name, value) in self.params.iter() {
            writeln!(f, "  {} = {:.6e}", name, value)?;
        }
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of outer iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the factor by which to increase lambda.
    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    /// Set the factor by which to decrease lambda.
    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    /// Set the damping cap past which a fit without progress stops.
    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.config.max_lambda = max_lambda;
        self
    }

    /// Set the number of damping trials per outer iteration.
    pub fn with_damping_tries(mut self, tries: usize) -> Self {
        self.config.damping_tries = tries;
        self
    }

    /// Set the mean squared residual counted as a match.
    pub fn with_mse_tolerance(mut self, tolerance: f64) -> Self {
        self.config.mse_tolerance = tolerance;
        self
    }

    /// Set the finite-difference steps of the Jacobian.
    pub fn with_diff_steps(mut self, steps: DiffSteps) -> Self {
        self.config.diff_steps = steps;
        self
    }

    /// Minimize the problem over the rows of `params` flagged for fitting.
    ///
    /// The best parameters found are written back into `params` whatever the
    /// termination reason. With no row flagged the problem is never evaluated
    /// and `params` is left untouched.
    ///
    /// `cancel` is checked once at the top of every outer iteration.
    ///
    /// # Errors
    ///
    /// Returns the problem's error if the starting point cannot be
    /// evaluated. Failures at trial points count as rejected trials.
    pub fn minimize<P, O>(
        &self,
        problem: &P,
        params: &mut [FitParameter],
        observer: &mut O,
        cancel: &AtomicBool,
    ) -> Result<LmResult>
    where
        P: Problem + ?Sized,
        O: LmObserver + ?Sized,
    {
        let cfg = &self.config;
        let active: Vec<usize> = (0..params.len()).filter(|&i| params[i].is_fit).collect();

        if active.is_empty() {
            debug!("No active parameters, skipping fit");
            return Ok(LmResult {
                status: FitStatus::NoActiveParameters,
                params: ParameterSet::from_fit_parameters(params),
                residuals: Array1::zeros(0),
                sse: 0.0,
                mse: 0.0,
                iterations: 0,
                evaluations: 0,
                lambda: cfg.initial_lambda,
            });
        }

        let names: Vec<String> = active.iter().map(|&i| params[i].name.clone()).collect();

        let mut current = ParameterSet::from_fit_parameters(params);
        let mut residuals = problem.eval(&current)?;
        let mut sse = sum_of_squares(&residuals);
        let mut evaluations = 1;
        let mut lambda = cfg.initial_lambda;
        let mut iterations = 0;

        observer.on_update(mean_squared(sse, residuals.len()), &current);

        let mut status = FitStatus::MaxIterationsReached;
        for iter in 0..cfg.max_iterations {
            if cancel.load(Ordering::Relaxed) {
                status = FitStatus::Cancelled;
                break;
            }
            if self.has_converged(sse, residuals.len()) {
                status = FitStatus::Converged;
                break;
            }

            observer.on_progress(iter * 100 / cfg.max_iterations);
            iterations += 1;

            let jac =
                jacobian_central(problem, &current, &names, residuals.len(), &cfg.diff_steps)?;
            evaluations += 2 * names.len();
            let normal = NormalEquations::new(&jac, &residuals);

            let mut accepted = false;
            for _ in 0..cfg.damping_tries {
                let Some(delta) = normal.damped_step(lambda) else {
                    trace!("Singular damped system at lambda = {:e}", lambda);
                    lambda *= cfg.lambda_up_factor;
                    continue;
                };

                let trial = self.trial_point(&current, params, &active, &delta);
                evaluations += 1;
                match problem.eval(&trial) {
                    Ok(trial_residuals) => {
                        let trial_sse = sum_of_squares(&trial_residuals);
                        if trial_sse < sse {
                            current = trial;
                            residuals = trial_residuals;
                            sse = trial_sse;
                            lambda *= cfg.lambda_down_factor;
                            accepted = true;
                            break;
                        }
                    }
                    Err(e) => trace!("Trial evaluation failed: {}", e),
                }
                lambda *= cfg.lambda_up_factor;
            }

            let mse = mean_squared(sse, residuals.len());
            debug!(
                "LM iteration {}: mse = {:.6e}, lambda = {:.1e}, accepted = {}",
                iter, mse, lambda, accepted
            );

            if accepted {
                observer.on_update(mse, &current);
            } else if lambda > cfg.max_lambda {
                status = FitStatus::StalledAtMaxDamping;
                break;
            }
        }

        if status == FitStatus::MaxIterationsReached && self.has_converged(sse, residuals.len()) {
            status = FitStatus::Converged;
        }

        current.write_to(params);

        Ok(LmResult {
            status,
            params: current,
            mse: mean_squared(sse, residuals.len()),
            residuals,
            sse,
            iterations,
            evaluations,
            lambda,
        })
    }

    fn has_converged(&self, sse: f64, n: usize) -> bool {
        n > 0 && mean_squared(sse, n) < self.config.mse_tolerance
    }

    /// Apply `delta` to the active parameters of `current`.
    fn trial_point(
        &self,
        current: &ParameterSet,
        params: &[FitParameter],
        active: &[usize],
        delta: &Array1<f64>,
    ) -> ParameterSet {
        let log_floor = self.config.diff_steps.log_floor;
        let mut trial = current.clone();
        for (k, &i) in active.iter().enumerate() {
            let param = &params[i];
            let old = current.get_or(param.name(), param.value());
            let scale = StepScale::for_parameter(param.name(), old, log_floor);
            let value = param.bounds().clamp(scale.perturb(old, delta[k]));
            trial.set(param.name(), value);
        }
        trial
    }
}

/// `sse / n`, zero for an empty residual vector.
fn mean_squared(sse: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sse / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WellTestError;
    use approx::assert_relative_eq;
    use std::sync::atomic::AtomicUsize;

    /// r_i = kf·x_i + S - y_i
    struct LineFit {
        x: Vec<f64>,
        y: Vec<f64>,
        evaluations: AtomicUsize,
    }

    impl LineFit {
        fn new(slope: f64, intercept: f64) -> Self {
            let x = vec![1.0, 2.0, 3.0, 4.0];
            let y = x.iter().map(|x| slope * x + intercept).collect();
            Self {
                x,
                y,
                evaluations: AtomicUsize::new(0),
            }
        }
    }

    impl Problem for LineFit {
        fn eval(&self, params: &ParameterSet) -> Result<Array1<f64>> {
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            let kf = params
                .get("kf")
                .ok_or_else(|| WellTestError::InvalidParameter("kf".to_string()))?;
            let s = params.get_or("S", 0.0);
            Ok(self
                .x
                .iter()
                .zip(&self.y)
                .map(|(x, y)| kf * x + s - y)
                .collect())
        }

        fn residual_count(&self) -> usize {
            self.x.len()
        }
    }

    #[derive(Default)]
    struct Recorder {
        updates: Vec<f64>,
        progress: Vec<usize>,
    }

    impl LmObserver for Recorder {
        fn on_progress(&mut self, percent: usize) {
            self.progress.push(percent);
        }

        fn on_update(&mut self, mse: f64, _params: &ParameterSet) {
            self.updates.push(mse);
        }
    }

    fn not_cancelled() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn test_no_active_parameters() {
        let problem = LineFit::new(2.0, 0.0);
        let mut params = vec![FitParameter::with_bounds("kf", 0.5, 1e-3, 10.0)
            .unwrap()
            .fitted(false)];
        let mut recorder = Recorder::default();

        let result = LevenbergMarquardt::new()
            .minimize(&problem, &mut params, &mut recorder, &not_cancelled())
            .unwrap();

        assert_eq!(result.status, FitStatus::NoActiveParameters);
        assert_eq!(params[0].value(), 0.5);
        assert_eq!(problem.evaluations.load(Ordering::SeqCst), 0);
        assert!(recorder.updates.is_empty());
    }

    #[test]
    fn test_converges_in_log_space() {
        let problem = LineFit::new(2.0, 0.0);
        let mut params = vec![FitParameter::with_bounds("kf", 0.5, 1e-3, 10.0).unwrap()];
        let mut recorder = Recorder::default();

        let result = LevenbergMarquardt::new()
            .minimize(&problem, &mut params, &mut recorder, &not_cancelled())
            .unwrap();

        assert_eq!(result.status, FitStatus::Converged);
        assert!(result.mse < 3e-3);
        assert_relative_eq!(params[0].value(), 2.0, epsilon = 0.03);
        assert_eq!(result.params.get("kf"), Some(params[0].value()));

        // the starting point is reported first, then strictly better points
        assert!(recorder.updates.len() >= 2);
        assert!(recorder.updates.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(recorder.progress.first(), Some(&0));
    }

    #[test]
    fn test_linear_parameter_and_fixed_rows() {
        let problem = LineFit::new(2.0, 3.0);
        let mut params = vec![
            FitParameter::with_bounds("kf", 2.0, 1e-3, 10.0)
                .unwrap()
                .fitted(false),
            FitParameter::with_bounds("S", 0.0, -5.0, 50.0).unwrap(),
        ];

        let result = LevenbergMarquardt::new()
            .minimize(&problem, &mut params, &mut (), &not_cancelled())
            .unwrap();

        assert!(result.status.is_converged());
        assert_eq!(params[0].value(), 2.0);
        assert_relative_eq!(params[1].value(), 3.0, epsilon = 0.06);
    }

    #[test]
    fn test_bounds_are_hard() {
        let problem = LineFit::new(2.0, 0.0);
        let mut params = vec![FitParameter::with_bounds("kf", 0.5, 1e-3, 1.5).unwrap()];

        let result = LevenbergMarquardt::new()
            .minimize(&problem, &mut params, &mut (), &not_cancelled())
            .unwrap();

        assert_eq!(result.status, FitStatus::StalledAtMaxDamping);
        assert!(params[0].value() <= 1.5);
        assert_relative_eq!(params[0].value(), 1.5, epsilon = 1e-12);
        assert!(result.lambda > 1e10);
    }

    #[test]
    fn test_cancel_before_first_iteration() {
        let problem = LineFit::new(2.0, 0.0);
        let mut params = vec![FitParameter::with_bounds("kf", 0.5, 1e-3, 10.0).unwrap()];
        let mut recorder = Recorder::default();

        let result = LevenbergMarquardt::new()
            .minimize(&problem, &mut params, &mut recorder, &AtomicBool::new(true))
            .unwrap();

        assert_eq!(result.status, FitStatus::Cancelled);
        assert_eq!(result.iterations, 0);
        assert_eq!(recorder.updates.len(), 1);
        assert_eq!(params[0].value(), 0.5);
    }

    #[test]
    fn test_iteration_cap() {
        let problem = LineFit::new(2.0, 0.0);
        let mut params = vec![FitParameter::with_bounds("kf", 1e-3, 1e-3, 10.0).unwrap()];

        let result = LevenbergMarquardt::new()
            .with_max_iterations(1)
            .minimize(&problem, &mut params, &mut (), &not_cancelled())
            .unwrap();

        assert_eq!(result.iterations, 1);
        assert!(params[0].value() > 1e-3);
    }
}
