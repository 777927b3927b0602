use thiserror::Error;

/// Error types for the shale-welltest library.
///
/// Only caller-input problems surface here. Numerical degeneracies inside the
/// solver (non-finite Laplace values, near-singular denominators) are handled
/// locally and never become errors.
#[derive(Error, Debug)]
pub enum WellTestError {
    /// Error for invalid parameter values.
    #[error("Invalid parameter value: {0}")]
    InvalidParameter(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    BoundsError(#[from] crate::parameters::bounds::BoundsError),

    /// A fit was requested without any observed points.
    #[error("Observed data set is empty")]
    EmptyObservedData,

    /// A fit was requested with no parameter flagged for fitting.
    #[error("No parameter is flagged for fitting")]
    NoActiveParameters,

    /// A fit is already running in this session.
    #[error("A fit is already running")]
    FitInProgress,

    /// The background fit worker stopped without reporting a result.
    #[error("Fit worker disconnected before completion")]
    WorkerDisconnected,

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<crate::parameters::parameter::ParameterError> for WellTestError {
    fn from(err: crate::parameters::parameter::ParameterError) -> Self {
        WellTestError::ParameterError(format!("{}", err))
    }
}

/// Result type alias for shale-welltest operations.
pub type Result<T> = std::result::Result<T, WellTestError>;
