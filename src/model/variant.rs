//! The six boundary/storage combinations of the composite model.

use crate::error::WellTestError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition at the outer radius `reD` of the outer region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OuterBoundary {
    Infinite,
    /// No-flow
    Closed,
    ConstantPressure,
}

/// Wellbore storage treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellboreStorage {
    /// Storage coefficient `cD` and skin `S` are applied
    Variable,
    /// No storage or skin convolution
    Constant,
}

/// Model variant selector.
///
/// Fixed for the duration of a calculation or fit. The variant decides which
/// solver branches run and which parameters mean anything: `reD` only for
/// bounded variants, `cD` and `S` only for variable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    #[default]
    Model1,
    Model2,
    Model3,
    Model4,
    Model5,
    Model6,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 6] = [
        ModelVariant::Model1,
        ModelVariant::Model2,
        ModelVariant::Model3,
        ModelVariant::Model4,
        ModelVariant::Model5,
        ModelVariant::Model6,
    ];

    pub fn boundary(self) -> OuterBoundary {
        match self {
            ModelVariant::Model1 | ModelVariant::Model2 => OuterBoundary::Infinite,
            ModelVariant::Model3 | ModelVariant::Model4 => OuterBoundary::Closed,
            ModelVariant::Model5 | ModelVariant::Model6 => OuterBoundary::ConstantPressure,
        }
    }

    pub fn storage(self) -> WellboreStorage {
        match self {
            ModelVariant::Model1 | ModelVariant::Model3 | ModelVariant::Model5 => {
                WellboreStorage::Variable
            }
            ModelVariant::Model2 | ModelVariant::Model4 | ModelVariant::Model6 => {
                WellboreStorage::Constant
            }
        }
    }

    /// Whether `cD` and `S` take part in the solution.
    pub fn has_variable_storage(self) -> bool {
        self.storage() == WellboreStorage::Variable
    }

    /// Whether `reD` takes part in the solution.
    pub fn has_outer_boundary(self) -> bool {
        self.boundary() != OuterBoundary::Infinite
    }

    /// Zero-based position in [`ModelVariant::ALL`].
    pub fn index(self) -> usize {
        match self {
            ModelVariant::Model1 => 0,
            ModelVariant::Model2 => 1,
            ModelVariant::Model3 => 2,
            ModelVariant::Model4 => 3,
            ModelVariant::Model5 => 4,
            ModelVariant::Model6 => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable description
    pub fn name(self) -> &'static str {
        match self {
            ModelVariant::Model1 => "Model 1: variable storage, infinite boundary",
            ModelVariant::Model2 => "Model 2: constant storage, infinite boundary",
            ModelVariant::Model3 => "Model 3: variable storage, closed boundary",
            ModelVariant::Model4 => "Model 4: constant storage, closed boundary",
            ModelVariant::Model5 => "Model 5: variable storage, constant-pressure boundary",
            ModelVariant::Model6 => "Model 6: constant storage, constant-pressure boundary",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a variant from its model number, 1 through 6.
impl TryFrom<u8> for ModelVariant {
    type Error = WellTestError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        code.checked_sub(1)
            .and_then(|idx| Self::from_index(idx as usize))
            .ok_or_else(|| WellTestError::InvalidInput(format!("unknown model number {}", code)))
    }
}
