//! Integration tests for curve matching.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shale_welltest::config::{log_time_grid, ReservoirDefaults, TimeGrid};
use shale_welltest::fitting::{FitEvent, FitRequest, FitSession};
use shale_welltest::inversion::Precision;
use shale_welltest::lm::{FitStatus, LevenbergMarquardt, LmConfig, LmObserver};
use shale_welltest::model::{
    default_fit_parameters, default_parameters, ModelVariant, WellTestModel,
};
use shale_welltest::observed::ObservedDataset;
use shale_welltest::parameters::{names, FitParameter, ParameterSet};
use shale_welltest::problem::CurveMatchProblem;
use shale_welltest::WellTestError;

/// Records every update the optimizer reports.
#[derive(Default)]
struct Trace {
    mse: Vec<f64>,
    kf: Vec<f64>,
}

impl LmObserver for Trace {
    fn on_update(&mut self, mse: f64, params: &ParameterSet) {
        self.mse.push(mse);
        self.kf.push(params.get(names::KF).unwrap_or(f64::NAN));
    }
}

fn five_points() -> Arc<ObservedDataset> {
    Arc::new(
        ObservedDataset::new(
            vec![0.1, 1.0, 10.0, 100.0, 1000.0],
            vec![0.5, 1.0, 1.8, 2.5, 3.0],
            vec![0.2, 0.3, 0.4, 0.45, 0.46],
        )
        .unwrap(),
    )
}

/// Model2 fit table with only `kf` free, starting at 1e-3 in [1e-6, 1].
fn kf_table() -> Vec<FitParameter> {
    let mut table = default_fit_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
    for row in table.iter_mut() {
        row.is_fit = row.name == names::KF;
        if row.name == names::KF {
            row.set_bounds(1e-6, 1.0).unwrap();
            row.set_value(1e-3).unwrap();
        }
    }
    table
}

fn kf_of(table: &[FitParameter]) -> &FitParameter {
    table.iter().find(|p| p.name == names::KF).unwrap()
}

#[test]
fn test_five_point_kf_fit() {
    let problem = CurveMatchProblem::new(ModelVariant::Model2, five_points(), 0.5).unwrap();
    let mut table = kf_table();
    let mut trace = Trace::default();

    let result = LevenbergMarquardt::new()
        .minimize(&problem, &mut table, &mut trace, &AtomicBool::new(false))
        .unwrap();

    // SSE never increases across accepted iterations
    assert!(trace.mse.len() >= 2, "no step was accepted: {}", result.status);
    assert!(trace.mse.windows(2).all(|w| w[1] <= w[0]));

    // the fit improves on the starting guess and ends where the trace ends
    let initial_mse = trace.mse[0];
    assert!(result.mse < initial_mse, "{} !< {}", result.mse, initial_mse);
    assert_eq!(Some(&result.mse), trace.mse.last());
    assert_ne!(result.status, FitStatus::Cancelled);
    assert!(result.iterations >= 1);

    // every reported point respects the bounds
    assert!(trace.kf.iter().all(|kf| (1e-6..=1.0).contains(kf)));
    let kf = kf_of(&table);
    assert!(kf.value() >= 1e-6 && kf.value() <= 1.0);
    assert_ne!(kf.value(), 1e-3);
    assert_eq!(Some(&kf.value()), trace.kf.last());

    // only kf moved
    let defaults = default_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
    for row in &table {
        let name = row.name();
        if name == names::KF || name == names::LFD {
            continue;
        }
        assert_eq!(Some(row.value()), defaults.get(name), "{}", name);
    }
}

#[test]
fn test_recovers_kf_from_noisy_synthetic_data() {
    let true_kf = 3e-3;
    let times = log_time_grid(8, -1.0, 3.0);

    let mut truth = default_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
    truth.set(names::KF, true_kf);
    let curve = WellTestModel::new(ModelVariant::Model2, Precision::Fast)
        .compute_curve(&truth, Some(&times))
        .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut noisy = |v: f64| v * (1.0 + rng.gen_range(-0.005..0.005));
    let pressure: Vec<f64> = curve.pressure.iter().map(|p| noisy(*p)).collect();
    let derivative: Vec<f64> = curve.derivative.iter().map(|d| noisy(*d)).collect();
    let observed = Arc::new(ObservedDataset::new(times, pressure, derivative).unwrap());

    let problem = CurveMatchProblem::new(ModelVariant::Model2, observed, 0.5).unwrap();
    let mut table = kf_table();
    let result = LevenbergMarquardt::new()
        .with_mse_tolerance(1e-8)
        .minimize(&problem, &mut table, &mut (), &AtomicBool::new(false))
        .unwrap();

    assert_ne!(result.status, FitStatus::Cancelled);
    assert_relative_eq!(kf_of(&table).value(), true_kf, max_relative = 0.05);
    assert!(result.mse < 1e-4);
}

#[test]
fn test_no_active_parameters_changes_nothing() {
    let problem = CurveMatchProblem::new(ModelVariant::Model2, five_points(), 0.5).unwrap();
    let mut table = kf_table();
    table.iter_mut().for_each(|p| p.is_fit = false);
    let before = table.clone();

    let result = LevenbergMarquardt::new()
        .minimize(&problem, &mut table, &mut (), &AtomicBool::new(false))
        .unwrap();

    assert_eq!(result.status, FitStatus::NoActiveParameters);
    assert_eq!(result.iterations, 0);
    assert_eq!(result.evaluations, 0);
    assert_eq!(table, before);
}

#[test]
fn test_empty_observed_data_is_rejected_up_front() {
    assert!(matches!(
        ObservedDataset::new(vec![], vec![], vec![]),
        Err(WellTestError::EmptyObservedData)
    ));

    let session = FitSession::new();
    let request = FitRequest::new(ModelVariant::Model2, kf_table(), 0.5);
    assert!(matches!(
        session.start(request),
        Err(WellTestError::EmptyObservedData)
    ));
    assert!(!session.is_running());
}

#[test]
fn test_background_fit_reports_in_order() {
    let session = FitSession::new();
    let request = FitRequest::new(ModelVariant::Model2, kf_table(), 0.5)
        .with_observed(five_points())
        .with_config(LmConfig {
            max_iterations: 3,
            ..LmConfig::default()
        })
        .with_time_grid(TimeGrid::new(20, -2.0, 3.0));

    let handle = session.start(request).unwrap().into_handle().unwrap();
    let events: Vec<FitEvent> = handle.events().iter().collect();

    let mut last_progress = None;
    for event in &events {
        if let FitEvent::Progress(p) = event {
            assert!(last_progress.map_or(true, |last| *p > last));
            last_progress = Some(*p);
        }
    }

    match events.last() {
        Some(FitEvent::Finished(Ok(report))) => {
            assert_eq!(report.curve.len(), 20);
            let kf = kf_of(&report.parameters);
            assert!(kf.value() >= kf.min() && kf.value() <= kf.max());
        }
        other => panic!("unexpected final event: {:?}", other),
    }
}

#[test]
fn test_cancelled_fit_keeps_best_parameters() {
    let session = FitSession::new();
    let request = FitRequest::new(ModelVariant::Model2, kf_table(), 0.5)
        .with_observed(five_points())
        .with_config(LmConfig {
            mse_tolerance: 0.0,
            ..LmConfig::default()
        })
        .with_time_grid(TimeGrid::new(10, -2.0, 3.0));

    let handle = session.start(request).unwrap().into_handle().unwrap();
    handle.cancel();
    assert!(handle.is_cancelled());

    let report = handle.wait().unwrap();
    assert_eq!(report.status, FitStatus::Cancelled);
    let kf = kf_of(&report.parameters);
    assert!(kf.value() >= 1e-6 && kf.value() <= 1.0);
}
