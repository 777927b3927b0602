//! Default parameter values and fit-table rows per model variant.

use crate::config::ReservoirDefaults;
use crate::model::variant::ModelVariant;
use crate::parameters::{names, FitParameter, ParameterSet};

/// Model parameters shared by all six variants.
const MODEL_DEFAULTS: [(&str, f64); 11] = [
    (names::NF, 4.0),
    (names::KF, 1e-3),
    (names::KM, 1e-4),
    (names::L, 1000.0),
    (names::LF, 100.0),
    (names::LFD, 0.1),
    (names::RMD, 4.0),
    (names::OMEGA1, 0.4),
    (names::OMEGA2, 0.08),
    (names::LAMBDA1, 1e-3),
    (names::GAMA_D, 0.02),
];

const DEFAULT_CD: f64 = 0.01;
const DEFAULT_SKIN: f64 = 1.0;
const DEFAULT_RED: f64 = 10.0;

/// Search interval and default fit flag for each name.
///
/// `LfD` has no row of its own in the fit table: it is derived from `Lf`
/// and `L` and carried as a hidden, fixed row.
fn fit_row(name: &str) -> (f64, f64, bool) {
    match name {
        names::PHI => (1e-3, 0.5, false),
        names::H => (1.0, 500.0, false),
        names::MU => (0.01, 100.0, false),
        names::B => (1.0, 3.0, false),
        names::CT => (1e-6, 0.1, false),
        names::Q => (0.01, 1e4, false),
        names::NF => (1.0, 50.0, false),
        names::KF => (1e-6, 10.0, true),
        names::KM => (1e-8, 1.0, true),
        names::L => (10.0, 1e4, false),
        names::LF => (1.0, 1e3, false),
        names::LFD => (1e-4, 10.0, false),
        names::RMD => (1.0, 100.0, false),
        names::OMEGA1 => (1e-4, 1.0, true),
        names::OMEGA2 => (1e-4, 1.0, true),
        names::LAMBDA1 => (1e-9, 1.0, true),
        names::GAMA_D => (0.0, 0.5, false),
        names::CD => (0.0, 100.0, true),
        names::S => (-5.0, 50.0, true),
        names::RED => (1.0, 1e3, false),
        _ => (f64::NEG_INFINITY, f64::INFINITY, false),
    }
}

/// Initial parameter set for `variant`.
///
/// Reservoir and fluid properties come from `reservoir`; model parameters
/// take fixed defaults. `cD` and `S` are 0 unless the variant has variable
/// storage, and `reD` is only present for bounded variants.
///
/// # Examples
///
/// ```
/// use shale_welltest::config::ReservoirDefaults;
/// use shale_welltest::model::{default_parameters, ModelVariant};
///
/// let set = default_parameters(ModelVariant::Model3, &ReservoirDefaults::default());
/// assert_eq!(set.get("reD"), Some(10.0));
/// assert_eq!(set.get("cD"), Some(0.01));
///
/// let set = default_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
/// assert_eq!(set.get("reD"), None);
/// assert_eq!(set.get("S"), Some(0.0));
/// ```
pub fn default_parameters(variant: ModelVariant, reservoir: &ReservoirDefaults) -> ParameterSet {
    let mut set = ParameterSet::new();
    reservoir.apply_to(&mut set);
    for (name, value) in MODEL_DEFAULTS {
        set.set(name, value);
    }

    if variant.has_variable_storage() {
        set.set(names::CD, DEFAULT_CD);
        set.set(names::S, DEFAULT_SKIN);
    } else {
        set.set(names::CD, 0.0);
        set.set(names::S, 0.0);
    }

    if variant.has_outer_boundary() {
        set.set(names::RED, DEFAULT_RED);
    }

    set
}

/// Fit-table rows for `variant`, built from [`default_parameters`].
///
/// Rows for parameters the variant does not use (`cD` and `S` without
/// variable storage) are hidden and fixed. `LfD` is always hidden and fixed.
pub fn default_fit_parameters(
    variant: ModelVariant,
    reservoir: &ReservoirDefaults,
) -> Vec<FitParameter> {
    let set = default_parameters(variant, reservoir);
    set.iter()
        .map(|(name, value)| {
            let (min, max, fitted) = fit_row(name);
            let inactive = name == names::LFD
                || (!variant.has_variable_storage() && (name == names::CD || name == names::S));

            let row = match FitParameter::with_bounds(name, value, min.min(value), max.max(value)) {
                Ok(row) => row,
                Err(_) => FitParameter::new(name, value),
            };
            row.fitted(fitted && !inactive).visible(!inactive)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservoir_values_are_injected() {
        let reservoir = ReservoirDefaults {
            phi: 0.1,
            q: 12.0,
            ..ReservoirDefaults::default()
        };
        let set = default_parameters(ModelVariant::Model1, &reservoir);
        assert_eq!(set.get(names::PHI), Some(0.1));
        assert_eq!(set.get(names::Q), Some(12.0));
        assert_eq!(set.get(names::LFD), Some(0.1));
        assert_eq!(set.get(names::KF), Some(1e-3));
    }

    #[test]
    fn test_variant_specific_entries() {
        let reservoir = ReservoirDefaults::default();
        for variant in ModelVariant::ALL {
            let set = default_parameters(variant, &reservoir);
            assert_eq!(set.contains(names::RED), variant.has_outer_boundary());
            let expected_cd = if variant.has_variable_storage() {
                0.01
            } else {
                0.0
            };
            assert_eq!(set.get(names::CD), Some(expected_cd));
        }
    }

    #[test]
    fn test_fit_rows() {
        let rows = default_fit_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
        let row = |name: &str| rows.iter().find(|p| p.name() == name).unwrap();

        assert!(row(names::KF).is_fit);
        assert!(row(names::KF).bounds().is_within_bounds(1e-3));
        assert!(!row(names::PHI).is_fit);
        assert!(row(names::PHI).is_visible);
        assert!(!row(names::LFD).is_visible);
        assert!(!row(names::S).is_fit);
        assert!(!row(names::S).is_visible);

        let rows = default_fit_parameters(ModelVariant::Model1, &ReservoirDefaults::default());
        let skin = rows.iter().find(|p| p.name() == names::S).unwrap();
        assert!(skin.is_fit && skin.is_visible);
    }
}
