//! Validated physical and dimensionless inputs of the forward model.
//!
//! A [`ParameterSet`] is an open map; before any numerical work starts its
//! contents are pulled into two typed structs here. Anything the solver
//! would choke on (zero or negative permeabilities, lengths, radii) is
//! rejected at this point with [`WellTestError::InvalidParameter`].

use crate::error::{Result, WellTestError};
use crate::model::variant::ModelVariant;
use crate::parameters::{names, ParameterSet};

/// Conversion constant in `tD = 14.4·kf·t / (φ·μ·Ct·L²)`.
const TIME_CONSTANT: f64 = 14.4;

/// Conversion constant in `P = 1.842e-3·q·μ·B / (kf·h) · PD`.
const PRESSURE_CONSTANT: f64 = 1.842e-3;

/// Below this `L` is treated as missing when deriving `LfD`.
const MIN_WELL_LENGTH: f64 = 1e-9;

/// Largest fracture count the solver accepts. The influence system is
/// `(nf+1)×(nf+1)`.
pub const MAX_FRACTURES: usize = 100;

/// Reservoir, fluid and well properties in field units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParams {
    pub phi: f64,
    pub mu: f64,
    pub b: f64,
    pub ct: f64,
    pub q: f64,
    pub h: f64,
    pub kf: f64,
    pub l: f64,
}

impl Default for PhysicalParams {
    fn default() -> Self {
        Self {
            phi: 0.05,
            mu: 0.5,
            b: 1.05,
            ct: 5e-4,
            q: 5.0,
            h: 20.0,
            kf: 1e-3,
            l: 1000.0,
        }
    }
}

impl PhysicalParams {
    /// Read from a parameter set, falling back to the defaults for missing
    /// names.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `phi`, `mu`, `Ct`, `L`, `kf` or `h` is not
    /// finite and positive, or if `B` or `q` is not finite.
    pub fn from_parameters(set: &ParameterSet) -> Result<Self> {
        let fallback = Self::default();
        let params = Self {
            phi: positive(set, names::PHI, fallback.phi)?,
            mu: positive(set, names::MU, fallback.mu)?,
            b: finite(set, names::B, fallback.b)?,
            ct: positive(set, names::CT, fallback.ct)?,
            q: finite(set, names::Q, fallback.q)?,
            h: positive(set, names::H, fallback.h)?,
            kf: positive(set, names::KF, fallback.kf)?,
            l: positive(set, names::L, fallback.l)?,
        };
        Ok(params)
    }

    /// `tD = 14.4·kf·t / (φ·μ·Ct·L²)` for time `t` in hours.
    pub fn dimensionless_time(&self, t: f64) -> f64 {
        TIME_CONSTANT * self.kf * t / (self.phi * self.mu * self.ct * self.l * self.l)
    }

    /// Factor turning dimensionless pressure into MPa.
    pub fn pressure_factor(&self) -> f64 {
        PRESSURE_CONSTANT * self.q * self.mu * self.b / (self.kf * self.h)
    }
}

/// Inputs of the Laplace-space solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionlessParams {
    /// Inner-region permeability
    pub kf: f64,
    /// Outer-region permeability
    pub km: f64,
    /// Fracture half-length over well length
    pub lfd: f64,
    /// Radius of the inner region
    pub rmd: f64,
    /// Outer-boundary radius, 0 for infinite-acting variants
    pub red: f64,
    pub omega1: f64,
    pub omega2: f64,
    pub lambda1: f64,
    /// Stress-sensitivity coefficient
    pub gama_d: f64,
    /// Storage coefficient, 0 for constant-storage variants
    pub cd: f64,
    /// Skin, 0 for constant-storage variants
    pub skin: f64,
    /// Number of fractures, at least 1
    pub nf: usize,
}

impl DimensionlessParams {
    /// Extract and validate the solver inputs for `variant`.
    ///
    /// `LfD` is taken from the set when present, otherwise derived from
    /// `Lf / L`. `reD` is only read for bounded variants, `cD` and `S` only
    /// for variable-storage variants.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `kf`, `km`, `LfD`, `rmD` (or `reD` for bounded
    /// variants) is missing, non-finite or not positive; if `nf` does not
    /// round into `1..=MAX_FRACTURES`; or if `omega1`, `omega2`, `lambda1` are
    /// negative or non-finite.
    pub fn from_parameters(set: &ParameterSet, variant: ModelVariant) -> Result<Self> {
        let lfd = match set.get(names::LFD) {
            Some(v) => v,
            None => match (set.get(names::L), set.get(names::LF)) {
                (Some(l), Some(lf)) if l > MIN_WELL_LENGTH => lf / l,
                _ => 0.0,
            },
        };
        check_positive(names::LFD, lfd)?;

        let nf_raw = set.get_or(names::NF, 4.0);
        let nf_rounded = nf_raw.round();
        if !nf_rounded.is_finite() || nf_rounded < 1.0 || nf_rounded > MAX_FRACTURES as f64 {
            return Err(WellTestError::InvalidParameter(format!(
                "{} must be between 1 and {}, got {}",
                names::NF,
                MAX_FRACTURES,
                nf_raw
            )));
        }

        let red = if variant.has_outer_boundary() {
            required_positive(set, names::RED)?
        } else {
            0.0
        };

        let (cd, skin) = if variant.has_variable_storage() {
            (finite(set, names::CD, 0.0)?, finite(set, names::S, 0.0)?)
        } else {
            (0.0, 0.0)
        };

        Ok(Self {
            kf: positive(set, names::KF, 1e-3)?,
            km: required_positive(set, names::KM)?,
            lfd,
            rmd: required_positive(set, names::RMD)?,
            red,
            omega1: required_non_negative(set, names::OMEGA1)?,
            omega2: required_non_negative(set, names::OMEGA2)?,
            lambda1: required_non_negative(set, names::LAMBDA1)?,
            gama_d: finite(set, names::GAMA_D, 0.0)?,
            cd,
            skin,
            nf: nf_rounded as usize,
        })
    }

    /// Permeability contrast `M12 = kf / km`.
    pub fn mobility_ratio(&self) -> f64 {
        self.kf / self.km
    }

    /// Fracture centres along the well: 0 for a single fracture, otherwise
    /// evenly spaced over `[-0.9, 0.9]`.
    pub fn fracture_positions(&self) -> Vec<f64> {
        fracture_positions(self.nf)
    }
}

/// See [`DimensionlessParams::fracture_positions`].
pub fn fracture_positions(nf: usize) -> Vec<f64> {
    const SPAN: (f64, f64) = (-0.9, 0.9);
    match nf {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = (SPAN.1 - SPAN.0) / (nf - 1) as f64;
            (0..nf).map(|i| SPAN.0 + i as f64 * step).collect()
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(WellTestError::InvalidParameter(format!(
            "{} must be finite and positive, got {}",
            name, value
        )))
    }
}

fn positive(set: &ParameterSet, name: &str, default: f64) -> Result<f64> {
    check_positive(name, set.get_or(name, default))
}

fn required_positive(set: &ParameterSet, name: &str) -> Result<f64> {
    match set.get(name) {
        Some(value) => check_positive(name, value),
        None => Err(missing(name)),
    }
}

fn required_non_negative(set: &ParameterSet, name: &str) -> Result<f64> {
    match set.get(name) {
        Some(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Some(value) => Err(WellTestError::InvalidParameter(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        ))),
        None => Err(missing(name)),
    }
}

fn finite(set: &ParameterSet, name: &str, default: f64) -> Result<f64> {
    let value = set.get_or(name, default);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WellTestError::InvalidParameter(format!(
            "{} must be finite, got {}",
            name, value
        )))
    }
}

fn missing(name: &str) -> WellTestError {
    WellTestError::InvalidParameter(format!("{} is required", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReservoirDefaults;
    use crate::model::defaults::default_parameters;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimensionless_time_scales_with_kf() {
        let set = default_parameters(ModelVariant::Model2, &ReservoirDefaults::default());
        let base = PhysicalParams::from_parameters(&set).unwrap();
        let mut doubled_set = set.clone();
        doubled_set.set(names::KF, 2.0 * base.kf);
        let doubled = PhysicalParams::from_parameters(&doubled_set).unwrap();

        assert_relative_eq!(
            doubled.dimensionless_time(5.0),
            base.dimensionless_time(10.0),
            max_relative = 1e-14
        );
        assert_relative_eq!(
            base.dimensionless_time(1.0),
            14.4 * 1e-3 / (0.05 * 0.5 * 5e-4 * 1e6),
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_missing_physical_values_use_defaults() {
        let params = PhysicalParams::from_parameters(&ParameterSet::new()).unwrap();
        assert_eq!(params, PhysicalParams::default());
        assert_relative_eq!(
            params.pressure_factor(),
            1.842e-3 * 5.0 * 0.5 * 1.05 / (1e-3 * 20.0),
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        use names::{CT, H, KF, L, MU, PHI};
        let defaults = ReservoirDefaults::default();
        for name in [PHI, MU, CT, L, KF, H] {
            let mut set = default_parameters(ModelVariant::Model1, &defaults);
            set.set(name, 0.0);
            assert!(PhysicalParams::from_parameters(&set).is_err(), "{}", name);
        }
        for name in [names::KM, names::LFD, names::RMD] {
            let mut set = default_parameters(ModelVariant::Model1, &defaults);
            set.set(name, -1.0);
            assert!(
                DimensionlessParams::from_parameters(&set, ModelVariant::Model1).is_err(),
                "{}",
                name
            );
        }

        let mut set = default_parameters(ModelVariant::Model1, &defaults);
        set.set(names::NF, 0.4);
        assert!(DimensionlessParams::from_parameters(&set, ModelVariant::Model1).is_err());
        set.set(names::NF, 2.6);
        let params = DimensionlessParams::from_parameters(&set, ModelVariant::Model1).unwrap();
        assert_eq!(params.nf, 3);
    }

    #[test]
    fn test_rejects_oversized_fracture_count() {
        let mut set = default_parameters(ModelVariant::Model2, &ReservoirDefaults::default());

        set.set(names::NF, MAX_FRACTURES as f64);
        let params = DimensionlessParams::from_parameters(&set, ModelVariant::Model2).unwrap();
        assert_eq!(params.nf, MAX_FRACTURES);

        for nf in [MAX_FRACTURES as f64 + 1.0, 1e9, f64::INFINITY] {
            set.set(names::NF, nf);
            match DimensionlessParams::from_parameters(&set, ModelVariant::Model2) {
                Err(WellTestError::InvalidParameter(msg)) => assert!(msg.contains("nf"), "{}", msg),
                other => panic!("nf = {} was accepted: {:?}", nf, other),
            }
        }
    }

    #[test]
    fn test_variant_gates_optional_inputs() {
        let defaults = ReservoirDefaults::default();
        let mut set = default_parameters(ModelVariant::Model3, &defaults);
        set.set(names::RED, 25.0);

        let bounded = DimensionlessParams::from_parameters(&set, ModelVariant::Model3).unwrap();
        assert_eq!(bounded.red, 25.0);
        assert_eq!(bounded.cd, 0.01);
        assert_eq!(bounded.skin, 1.0);

        let infinite = DimensionlessParams::from_parameters(&set, ModelVariant::Model2).unwrap();
        assert_eq!(infinite.red, 0.0);
        assert_eq!(infinite.cd, 0.0);
        assert_eq!(infinite.skin, 0.0);

        set.remove(names::RED);
        assert!(DimensionlessParams::from_parameters(&set, ModelVariant::Model3).is_err());
        assert!(DimensionlessParams::from_parameters(&set, ModelVariant::Model1).is_ok());
    }

    #[test]
    fn test_fracture_positions() {
        assert_eq!(fracture_positions(1), vec![0.0]);
        let four = fracture_positions(4);
        assert_eq!(four.len(), 4);
        assert_relative_eq!(four[0], -0.9);
        assert_relative_eq!(four[1], -0.3, epsilon = 1e-15);
        assert_relative_eq!(four[3], 0.9, epsilon = 1e-15);
    }
}
