//! Laplace-space solution for a multi-fractured horizontal well in a
//! radial composite, dual-porosity reservoir.
//!
//! The inner region (radius `rmD`) holds the stimulated fracture network,
//! the outer region is tight matrix bounded at `reD` (or infinite). Each
//! fracture is a uniform-flux line source of half-length `LfD`; pressure
//! continuity between fractures and the total-rate constraint give a dense
//! `(nf+1)×(nf+1)` system whose last unknown is the wellbore pressure.

use crate::model::dimensionless::DimensionlessParams;
use crate::model::variant::{ModelVariant, OuterBoundary};
use crate::special::{adaptive_gauss, bessel_k, scaled_bessel_i, BesselOrder, DEFAULT_MAX_DEPTH};
use log::trace;
use nalgebra::{DMatrix, DVector};

/// Absolute tolerance for each influence integral.
pub const INFLUENCE_TOLERANCE: f64 = 1e-5;

/// Magnitude floor for ill-posed denominators.
const DENOMINATOR_FLOOR: f64 = 1e-100;

/// Floor on `γ₁·d` so the self-influence singularity stays integrable.
const MIN_BESSEL_ARGUMENT: f64 = 1e-10;

/// Image terms with a smaller exponent underflow and are dropped.
const MIN_IMAGE_EXPONENT: f64 = -700.0;

/// Storage and skin below this magnitude are treated as absent.
const MIN_STORAGE: f64 = 1e-12;

/// Laplace-space solver bound to one parameter set and variant.
///
/// Construction precomputes the fracture layout; each call to
/// [`CompositeSolver::laplace_pressure`] is independent and side-effect free.
#[derive(Debug, Clone)]
pub struct CompositeSolver {
    params: DimensionlessParams,
    variant: ModelVariant,
    positions: Vec<f64>,
}

impl CompositeSolver {
    pub fn new(params: DimensionlessParams, variant: ModelVariant) -> Self {
        Self {
            positions: params.fracture_positions(),
            params,
            variant,
        }
    }

    pub fn params(&self) -> &DimensionlessParams {
        &self.params
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Dimensionless wellbore pressure in Laplace space, including wellbore
    /// storage and skin for variable-storage variants.
    ///
    /// May return NaN or ±∞ for degenerate inputs; callers decide how to
    /// treat those.
    pub fn laplace_pressure(&self, z: f64) -> f64 {
        let pf = self.fracture_pressure(z);
        if self.variant.has_variable_storage() {
            apply_wellbore_storage(z, pf, self.params.cd, self.params.skin)
        } else {
            pf
        }
    }

    /// Laplace-space pressure at the fractures, before storage and skin.
    pub fn fracture_pressure(&self, z: f64) -> f64 {
        let p = &self.params;
        let m12 = p.mobility_ratio();

        // dual-porosity transfer function of the inner region
        let fs1 = p.omega1 + p.lambda1 * p.omega2 / (p.lambda1 + z * p.omega2);
        let fs2 = m12 * p.omega2;
        let gama1 = (z * fs1).sqrt();
        let gama2 = (z * fs2).sqrt();

        let coefficient =
            image_coefficient(gama1, gama2, m12, p.rmd, p.red, self.variant.boundary());

        let nf = self.positions.len();
        let influence = self.influence_by_offset(gama1, coefficient, m12);

        let size = nf + 1;
        let mut matrix = DMatrix::<f64>::zeros(size, size);
        for i in 0..nf {
            for j in 0..nf {
                matrix[(i, j)] = influence[i.abs_diff(j)];
            }
            matrix[(i, nf)] = -1.0;
            matrix[(nf, i)] = z;
        }
        let mut rhs = DVector::<f64>::zeros(size);
        rhs[nf] = 1.0;

        match matrix.full_piv_lu().solve(&rhs) {
            Some(solution) => solution[nf],
            None => {
                trace!("singular influence system at z = {:e}", z);
                f64::NAN
            }
        }
    }

    /// Influence of fracture `j` on fracture `i` depends only on `|i - j|`
    /// for an evenly spaced layout, so one integral per offset suffices.
    fn influence_by_offset(&self, gama1: f64, coefficient: f64, m12: f64) -> Vec<f64> {
        let p = &self.params;
        let Some(&origin) = self.positions.first() else {
            return Vec::new();
        };
        let decay = gama1 * p.rmd;
        let scale = 1.0 / (2.0 * m12 * p.lfd);

        self.positions
            .iter()
            .map(|&x| {
                let dx = x - origin;
                let integrand = |a: f64| {
                    let arg = (gama1 * (dx - a).abs()).max(MIN_BESSEL_ARGUMENT);
                    let exponent = arg - decay;
                    let image = if exponent > MIN_IMAGE_EXPONENT {
                        coefficient * scaled_bessel_i(BesselOrder::Zero, arg) * exponent.exp()
                    } else {
                        0.0
                    };
                    bessel_k(BesselOrder::Zero, arg) + image
                };
                scale
                    * adaptive_gauss(
                        &integrand,
                        -p.lfd,
                        p.lfd,
                        INFLUENCE_TOLERANCE,
                        0,
                        DEFAULT_MAX_DEPTH,
                    )
            })
            .collect()
    }
}

/// Coefficient of the `I₀` image term in the inner region.
///
/// Matches the inner solution `K₀ + A·I₀` to the outer solution at `rmD`
/// (continuity of pressure and of flux weighted by `M12`). The `I` functions
/// enter in scaled form and the exponential factors are carried by the caller.
fn image_coefficient(
    gama1: f64,
    gama2: f64,
    m12: f64,
    rmd: f64,
    red: f64,
    boundary: OuterBoundary,
) -> f64 {
    let arg_g1_rm = gama1 * rmd;
    let arg_g2_rm = gama2 * rmd;

    let (outer_i0, outer_i1) = outer_boundary_terms(arg_g2_rm, gama2 * red, boundary);

    let term1 = outer_i0 + bessel_k(BesselOrder::Zero, arg_g2_rm);
    let term2 = outer_i1 - bessel_k(BesselOrder::One, arg_g2_rm);

    let numerator = m12 * gama1 * bessel_k(BesselOrder::One, arg_g1_rm) * term1
        + gama2 * bessel_k(BesselOrder::Zero, arg_g1_rm) * term2;
    let mut denominator = m12 * gama1 * scaled_bessel_i(BesselOrder::One, arg_g1_rm) * term1
        - gama2 * scaled_bessel_i(BesselOrder::Zero, arg_g1_rm) * term2;
    if denominator.abs() < DENOMINATOR_FLOOR {
        denominator = DENOMINATOR_FLOOR;
    }

    numerator / denominator
}

/// Reflection of the outer region off the boundary at `reD`, evaluated at
/// `rmD`: the `I₀` and `I₁` coefficients added to `K₀` and `-K₁`.
fn outer_boundary_terms(arg_rm: f64, arg_re: f64, boundary: OuterBoundary) -> (f64, f64) {
    let ratio = match boundary {
        OuterBoundary::Infinite => return (0.0, 0.0),
        OuterBoundary::Closed => {
            let i1 = scaled_bessel_i(BesselOrder::One, arg_re);
            if i1 <= DENOMINATOR_FLOOR {
                return (0.0, 0.0);
            }
            bessel_k(BesselOrder::One, arg_re) / i1
        }
        OuterBoundary::ConstantPressure => {
            let i0 = scaled_bessel_i(BesselOrder::Zero, arg_re);
            if i0 <= DENOMINATOR_FLOOR {
                return (0.0, 0.0);
            }
            -bessel_k(BesselOrder::Zero, arg_re) / i0
        }
    };

    let shift = (arg_rm - arg_re).exp();
    (
        ratio * scaled_bessel_i(BesselOrder::Zero, arg_rm) * shift,
        ratio * scaled_bessel_i(BesselOrder::One, arg_rm) * shift,
    )
}

/// Wellbore storage and skin by Laplace-domain convolution.
///
/// `p = (z·pf + S) / (z + cD·z²·(z·pf + S))`, skipped when both `cD` and
/// `S` are negligible.
pub fn apply_wellbore_storage(z: f64, pf: f64, cd: f64, skin: f64) -> f64 {
    if cd <= MIN_STORAGE && skin.abs() <= MIN_STORAGE {
        return pf;
    }
    let with_skin = z * pf + skin;
    with_skin / (z + cd * z * z * with_skin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReservoirDefaults;
    use crate::model::defaults::default_parameters;
    use crate::parameters::names;
    use approx::assert_relative_eq;

    fn solver(variant: ModelVariant, overrides: &[(&str, f64)]) -> CompositeSolver {
        let mut set = default_parameters(variant, &ReservoirDefaults::default());
        for &(name, value) in overrides {
            set.set(name, value);
        }
        let params = DimensionlessParams::from_parameters(&set, variant).unwrap();
        CompositeSolver::new(params, variant)
    }

    #[test]
    fn test_solution_is_positive_and_decreasing() {
        let s = solver(ModelVariant::Model2, &[]);
        let values: Vec<f64> = [0.01, 0.1, 1.0, 10.0, 100.0]
            .iter()
            .map(|&z| s.laplace_pressure(z))
            .collect();
        assert!(
            values.iter().all(|v| v.is_finite() && *v > 0.0),
            "{:?}",
            values
        );
        assert!(values.windows(2).all(|w| w[1] < w[0]), "{:?}", values);
    }

    #[test]
    fn test_zero_storage_matches_constant_storage() {
        let variable = solver(ModelVariant::Model1, &[(names::CD, 0.0), (names::S, 0.0)]);
        let constant = solver(ModelVariant::Model2, &[]);
        for &z in &[0.05, 1.0, 30.0] {
            assert_eq!(variable.laplace_pressure(z), constant.laplace_pressure(z));
        }
    }

    #[test]
    fn test_skin_only_adds_skin_over_z() {
        let skin = 1.5;
        let variable = solver(ModelVariant::Model1, &[(names::CD, 0.0), (names::S, skin)]);
        let constant = solver(ModelVariant::Model2, &[]);
        for &z in &[0.05, 1.0, 30.0] {
            assert_relative_eq!(
                variable.laplace_pressure(z),
                constant.laplace_pressure(z) + skin / z,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_infinite_variant_ignores_red() {
        let near = solver(ModelVariant::Model2, &[(names::RED, 5.0)]);
        let far = solver(ModelVariant::Model2, &[(names::RED, 500.0)]);
        assert_eq!(near.laplace_pressure(0.3), far.laplace_pressure(0.3));
    }

    #[test]
    fn test_distant_boundaries_look_infinite() {
        let z = 1.0;
        let infinite = solver(ModelVariant::Model2, &[]).laplace_pressure(z);
        let closed = solver(ModelVariant::Model4, &[(names::RED, 200.0)]).laplace_pressure(z);
        let constant_p = solver(ModelVariant::Model6, &[(names::RED, 200.0)]).laplace_pressure(z);
        assert_relative_eq!(closed, infinite, max_relative = 1e-6);
        assert_relative_eq!(constant_p, infinite, max_relative = 1e-6);
    }

    #[test]
    fn test_boundary_type_orders_late_time_response() {
        // at small z (late time) a closed boundary raises pressure and a
        // constant-pressure boundary lowers it
        let z = 1e-4;
        let infinite = solver(ModelVariant::Model2, &[]).laplace_pressure(z);
        let closed = solver(ModelVariant::Model4, &[(names::RED, 6.0)]).laplace_pressure(z);
        let constant_p = solver(ModelVariant::Model6, &[(names::RED, 6.0)]).laplace_pressure(z);
        assert!(closed > infinite);
        assert!(constant_p < infinite);
    }

    #[test]
    fn test_repeatable() {
        let s = solver(ModelVariant::Model5, &[]);
        let first = s.laplace_pressure(2.5);
        let second = s.laplace_pressure(2.5);
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn test_storage_formula() {
        assert_eq!(apply_wellbore_storage(2.0, 0.7, 0.0, 0.0), 0.7);
        let expected = (2.0 * 0.7 + 1.0) / (2.0 + 0.01 * 4.0 * (2.0 * 0.7 + 1.0));
        assert_relative_eq!(apply_wellbore_storage(2.0, 0.7, 0.01, 1.0), expected);
    }
}
