//! # Curve Matching
//!
//! Runs the Levenberg-Marquardt fit of a model variant against observed
//! data on a background thread, reporting progress through a channel.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shale_welltest::config::ReservoirDefaults;
//! use shale_welltest::fitting::{FitEvent, FitRequest, FitSession};
//! use shale_welltest::model::{default_fit_parameters, ModelVariant};
//! use shale_welltest::observed::ObservedDataset;
//!
//! let observed = ObservedDataset::from_pressure_difference(
//!     vec![0.1, 1.0, 10.0, 100.0],
//!     vec![0.4, 0.9, 1.6, 2.2],
//! ).unwrap();
//!
//! let variant = ModelVariant::Model2;
//! let params = default_fit_parameters(variant, &ReservoirDefaults::default());
//! let request = FitRequest::new(variant, params, 0.5).with_observed(Arc::new(observed));
//!
//! let session = FitSession::new();
//! let handle = session.start(request).unwrap().into_handle().unwrap();
//! for event in handle.events() {
//!     match event {
//!         FitEvent::Iteration { mse, .. } => println!("mse = {mse:.4e}"),
//!         FitEvent::Progress(percent) => println!("{percent}%"),
//!         FitEvent::Finished(report) => println!("{:?}", report.map(|r| r.status)),
//!     }
//! }
//! ```

pub mod session;

pub use session::{FitEvent, FitHandle, FitReport, FitRequest, FitSession, FitStart};
