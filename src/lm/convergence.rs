//! Termination states of a fit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the Levenberg-Marquardt loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStatus {
    /// Mean squared residual fell below the tolerance.
    Converged,

    /// The cancellation flag was observed at the top of an iteration.
    Cancelled,

    /// No damping trial reduced the error and lambda exceeded its cap.
    StalledAtMaxDamping,

    /// The iteration cap was reached.
    MaxIterationsReached,

    /// No parameter was flagged for fitting; nothing was evaluated.
    NoActiveParameters,
}

impl FitStatus {
    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, FitStatus::Converged)
    }

    /// Returns a description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            FitStatus::Converged => "Converged: mean squared error below tolerance",
            FitStatus::Cancelled => "Stopped: cancelled by the caller",
            FitStatus::StalledAtMaxDamping => "Stopped: no improvement at maximum damping",
            FitStatus::MaxIterationsReached => "Stopped: maximum iterations reached",
            FitStatus::NoActiveParameters => "Nothing to do: no parameter is fitted",
        }
    }
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_converged_is_converged() {
        assert!(FitStatus::Converged.is_converged());
        assert!(!FitStatus::StalledAtMaxDamping.is_converged());
        assert!(!FitStatus::Cancelled.is_converged());
        assert!(format!("{}", FitStatus::Cancelled).contains("cancelled"));
    }
}
