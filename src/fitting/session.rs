//! Background fit execution.
//!
//! A [`FitSession`] runs at most one fit at a time on a worker thread.
//! The worker streams [`FitEvent`]s through a channel in the order the
//! optimizer produces them and always finishes with exactly one
//! [`FitEvent::Finished`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::TimeGrid;
use crate::error::{Result, WellTestError};
use crate::inversion::Precision;
use crate::lm::{FitStatus, LevenbergMarquardt, LmConfig, LmObserver};
use crate::model::{
    DimensionlessParams, ModelCurveData, ModelVariant, PhysicalParams, WellTestModel,
};
use crate::observed::ObservedDataset;
use crate::parameters::{is_linear_parameter, FitParameter, ParameterSet};
use crate::problem::CurveMatchProblem;

/// Everything a fit needs.
#[derive(Debug, Clone)]
pub struct FitRequest {
    pub variant: ModelVariant,
    /// Full fit table; rows flagged `is_fit` are optimized
    pub parameters: Vec<FitParameter>,
    /// Share of the misfit given to pressure, the rest goes to the derivative
    pub weight: f64,
    pub observed: Option<Arc<ObservedDataset>>,
    pub config: LmConfig,
    /// Grid of the curves attached to events
    pub time_grid: TimeGrid,
}

impl FitRequest {
    pub fn new(variant: ModelVariant, parameters: Vec<FitParameter>, weight: f64) -> Self {
        Self {
            variant,
            parameters,
            weight,
            observed: None,
            config: LmConfig::default(),
            time_grid: TimeGrid::default(),
        }
    }

    pub fn with_observed(mut self, observed: Arc<ObservedDataset>) -> Self {
        self.observed = Some(observed);
        self
    }

    pub fn with_config(mut self, config: LmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_time_grid(mut self, time_grid: TimeGrid) -> Self {
        self.time_grid = time_grid;
        self
    }

    /// Check the request and build the problem it describes.
    fn validate(&self) -> Result<CurveMatchProblem> {
        let observed = match &self.observed {
            Some(data) if !data.is_empty() => Arc::clone(data),
            _ => return Err(WellTestError::EmptyObservedData),
        };

        let active: Vec<&FitParameter> = self.parameters.iter().filter(|p| p.is_fit).collect();
        if active.is_empty() {
            return Err(WellTestError::NoActiveParameters);
        }

        for param in &active {
            let value = param.value();
            param.bounds().check(value)?;
            if !is_linear_parameter(param.name()) && value <= 0.0 {
                return Err(WellTestError::InvalidParameter(format!(
                    "{} must be positive to be fitted, got {}",
                    param.name(),
                    value
                )));
            }
        }

        let start = ParameterSet::from_fit_parameters(&self.parameters);
        PhysicalParams::from_parameters(&start)?;
        DimensionlessParams::from_parameters(&start, self.variant)?;

        CurveMatchProblem::new(self.variant, observed, self.weight)
    }
}

/// Final state of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub status: FitStatus,
    pub iterations: usize,
    pub mse: f64,
    /// Fit table with the best values written back
    pub parameters: Vec<FitParameter>,
    /// Model curve at the best values, full precision
    pub curve: ModelCurveData,
}

/// Message from the fit worker.
#[derive(Debug)]
pub enum FitEvent {
    /// Percentage of the iteration budget used
    Progress(usize),
    /// Starting point or an accepted step, with a fast-precision curve
    Iteration {
        mse: f64,
        parameters: ParameterSet,
        curve: ModelCurveData,
    },
    /// Always the last event of a run
    Finished(Result<FitReport>),
}

/// Outcome of [`FitSession::start`].
#[derive(Debug)]
pub enum FitStart {
    Started(FitHandle),
    /// Another fit is running; the request was ignored
    AlreadyRunning,
}

impl FitStart {
    /// The handle, or `FitInProgress` if the request was ignored.
    pub fn into_handle(self) -> Result<FitHandle> {
        match self {
            FitStart::Started(handle) => Ok(handle),
            FitStart::AlreadyRunning => Err(WellTestError::FitInProgress),
        }
    }
}

/// Consumer side of a running fit.
#[derive(Debug)]
pub struct FitHandle {
    events: Receiver<FitEvent>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FitHandle {
    /// Ask the worker to stop at its next iteration boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Event receiver; iterate it to follow the fit.
    pub fn events(&self) -> &Receiver<FitEvent> {
        &self.events
    }

    /// Next event, if one is waiting.
    pub fn try_next(&self) -> Option<FitEvent> {
        self.events.try_recv().ok()
    }

    /// Every event waiting right now, oldest first.
    pub fn drain(&self) -> Vec<FitEvent> {
        let mut pending = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => pending.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        pending
    }

    /// Block until the worker thread exits.
    pub fn join(&mut self) -> Result<()> {
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| WellTestError::WorkerDisconnected),
            None => Ok(()),
        }
    }

    /// Block until the fit finishes, discarding intermediate events.
    ///
    /// # Errors
    ///
    /// The fit's own error, or `WorkerDisconnected` if the worker died
    /// without reporting.
    pub fn wait(mut self) -> Result<FitReport> {
        let outcome = loop {
            match self.events.recv() {
                Ok(FitEvent::Finished(outcome)) => break outcome,
                Ok(_) => continue,
                Err(_) => break Err(WellTestError::WorkerDisconnected),
            }
        };
        self.join()?;
        outcome
    }
}

/// Cancel flag of the fit a session is running, if any.
type CancelSlot = Arc<Mutex<Option<Arc<AtomicBool>>>>;

/// Runs fits one at a time.
#[derive(Debug, Default)]
pub struct FitSession {
    running: Arc<AtomicBool>,
    current_cancel: CancelSlot,
}

impl FitSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Cancel the running fit, if any.
    pub fn cancel(&self) {
        if let Ok(current) = self.current_cancel.lock() {
            if let Some(flag) = current.as_ref() {
                flag.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Validate `request` and run it on a worker thread.
    ///
    /// A request made while another fit runs is ignored and reported as
    /// [`FitStart::AlreadyRunning`].
    ///
    /// # Errors
    ///
    /// Invalid requests are rejected before any thread is spawned:
    ///
    /// * `EmptyObservedData` without observed points
    /// * `NoActiveParameters` if no row is flagged for fitting
    /// * `InvalidInput` for a weight outside `[0, 1]`
    /// * `BoundsError` or `InvalidParameter` for bad starting values
    pub fn start(&self, request: FitRequest) -> Result<FitStart> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Fit request ignored, a fit is already running");
            return Ok(FitStart::AlreadyRunning);
        }
        let guard = RunningGuard {
            running: Arc::clone(&self.running),
            current_cancel: Arc::clone(&self.current_cancel),
        };

        let problem = request.validate().map_err(|e| {
            warn!("Fit request rejected: {}", e);
            e
        })?;

        let cancel = Arc::new(AtomicBool::new(false));
        if let Ok(mut current) = self.current_cancel.lock() {
            *current = Some(Arc::clone(&cancel));
        }

        let (sender, events) = mpsc::channel();
        let worker_cancel = Arc::clone(&cancel);
        info!(
            "Starting {} fit of {} parameters",
            request.variant,
            request.parameters.iter().filter(|p| p.is_fit).count()
        );

        let worker = thread::Builder::new()
            .name("welltest-fit".to_string())
            .spawn(move || {
                let outcome = run_fit(request, problem, &sender, &worker_cancel);
                drop(guard);
                let _ = sender.send(FitEvent::Finished(outcome));
            })?;

        Ok(FitStart::Started(FitHandle {
            events,
            cancel,
            worker: Some(worker),
        }))
    }
}

/// Clears the session's cancel slot and running flag when the worker is
/// done, even if it panics.
#[derive(Debug)]
struct RunningGuard {
    running: Arc<AtomicBool>,
    current_cancel: CancelSlot,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if let Ok(mut current) = self.current_cancel.lock() {
            *current = None;
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Forwards optimizer callbacks as events.
struct ChannelObserver<'a> {
    sender: &'a Sender<FitEvent>,
    cancel: &'a AtomicBool,
    model: WellTestModel,
}

impl ChannelObserver<'_> {
    fn send(&self, event: FitEvent) {
        if self.sender.send(event).is_err() {
            debug!("Fit handle dropped, cancelling");
            self.cancel.store(true, Ordering::Relaxed);
        }
    }
}

impl LmObserver for ChannelObserver<'_> {
    fn on_progress(&mut self, percent: usize) {
        self.send(FitEvent::Progress(percent));
    }

    /// Updates whose curve cannot be computed are not forwarded.
    fn on_update(&mut self, mse: f64, params: &ParameterSet) {
        match self.model.compute_curve(params, None) {
            Ok(curve) => self.send(FitEvent::Iteration {
                mse,
                parameters: params.clone(),
                curve,
            }),
            Err(e) => warn!("Skipping iteration update at mse = {:.4e}: {}", mse, e),
        }
    }
}

fn run_fit(
    request: FitRequest,
    problem: CurveMatchProblem,
    sender: &Sender<FitEvent>,
    cancel: &AtomicBool,
) -> Result<FitReport> {
    let FitRequest {
        variant,
        mut parameters,
        config,
        time_grid,
        ..
    } = request;

    let mut observer = ChannelObserver {
        sender,
        cancel,
        model: WellTestModel::new(variant, Precision::Fast).with_time_grid(time_grid),
    };

    let result = LevenbergMarquardt::with_config(config).minimize(
        &problem,
        &mut parameters,
        &mut observer,
        cancel,
    )?;

    let curve = WellTestModel::new(variant, Precision::High)
        .with_time_grid(time_grid)
        .compute_curve(&result.params, None)?;

    info!(
        "{} fit finished: {} after {} iterations, mse = {:.4e}",
        variant, result.status, result.iterations, result.mse
    );

    Ok(FitReport {
        status: result.status,
        iterations: result.iterations,
        mse: result.mse,
        parameters,
        curve,
    })
}
