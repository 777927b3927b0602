//! Modified Bessel functions of orders 0 and 1.
//!
//! The composite solver needs `Kₙ(x)` and the exponentially scaled
//! `e^{-x}·Iₙ(x)` over a very wide argument range: from the `1e-10` floor used
//! for self-influence terms up to the thousands reached at early times. The
//! evaluation strategy per function:
//!
//! * `Iₙ`: power series for `x ≤ 30`, Hankel asymptotic expansion above,
//!   and the leading asymptotic term `1/√(2πx)` beyond 600.
//! * `Kₙ`: logarithmic power series for `x ≤ 2`; above that the trapezoidal
//!   rule applied to `∫₀^∞ e^{-x(cosh t - 1)} cosh(nt) dt = eˣ·Kₙ(x)`, which
//!   converges geometrically in the step size.
//!
//! All routines are accurate to a few ulps over the ranges the solver uses.

use std::f64::consts::PI;

/// Euler–Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Above this the scaled `Iₙ` is replaced by its leading asymptotic term.
const SCALED_I_CUTOFF: f64 = 600.0;

/// Switch from the power series to the asymptotic expansion for `Iₙ`.
const I_SERIES_LIMIT: f64 = 30.0;

/// Switch from the power series to the integral representation for `Kₙ`.
const K_SERIES_LIMIT: f64 = 2.0;

const MAX_SERIES_TERMS: usize = 500;
const MAX_ASYMPTOTIC_TERMS: usize = 40;
const MAX_TRAPEZOID_NODES: usize = 10_000;

/// Order of a modified Bessel function.
///
/// Only orders 0 and 1 appear in the solver, so other orders are not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BesselOrder {
    Zero,
    One,
}

impl BesselOrder {
    fn index(self) -> u32 {
        match self {
            BesselOrder::Zero => 0,
            BesselOrder::One => 1,
        }
    }

    /// `4ν²`, the quantity the asymptotic expansions are written in.
    fn mu(self) -> f64 {
        let nu = self.index() as f64;
        4.0 * nu * nu
    }
}

/// Exponentially scaled modified Bessel function of the first kind, `e^{-x}·Iₙ(x)`.
///
/// Negative arguments are replaced by `|x|` (the odd symmetry of `I₁` is
/// not applied). For `x > 600` the leading asymptotic term
/// `1/√(2πx)` is returned for both orders.
///
/// # Examples
///
/// ```
/// use shale_welltest::special::{scaled_bessel_i, BesselOrder};
///
/// // I0(1) = 1.2660658777520082
/// let v = scaled_bessel_i(BesselOrder::Zero, 1.0);
/// assert!((v - 1.2660658777520082 * (-1.0f64).exp()).abs() < 1e-14);
/// ```
pub fn scaled_bessel_i(order: BesselOrder, x: f64) -> f64 {
    let x = x.abs();
    if x > SCALED_I_CUTOFF {
        return 1.0 / (2.0 * PI * x).sqrt();
    }
    if x <= I_SERIES_LIMIT {
        i_series(order, x) * (-x).exp()
    } else {
        scaled_i_asymptotic(order, x)
    }
}

/// Modified Bessel function of the first kind, `Iₙ(|x|)`.
///
/// Overflows to `+∞` for arguments beyond roughly 713.
pub fn bessel_i(order: BesselOrder, x: f64) -> f64 {
    let x = x.abs();
    if x <= I_SERIES_LIMIT {
        i_series(order, x)
    } else {
        scaled_i_asymptotic(order, x) * x.exp()
    }
}

/// Modified Bessel function of the second kind, `Kₙ(x)`.
///
/// `x ≤ 0` yields `+∞`, NaN propagates. Underflows to 0 for large `x`.
pub fn bessel_k(order: BesselOrder, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x <= K_SERIES_LIMIT {
        k_series(order, x)
    } else {
        scaled_k_integral(order, x) * (-x).exp()
    }
}

/// Exponentially scaled modified Bessel function of the second kind, `eˣ·Kₙ(x)`.
pub fn scaled_bessel_k(order: BesselOrder, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x <= K_SERIES_LIMIT {
        k_series(order, x) * x.exp()
    } else {
        scaled_k_integral(order, x)
    }
}

/// `Iₙ(x) = Σ (x/2)^{2k+n} / (k!(k+n)!)`, all terms positive.
fn i_series(order: BesselOrder, x: f64) -> f64 {
    let nu = order.index();
    let q = 0.25 * x * x;
    let mut term = match order {
        BesselOrder::Zero => 1.0,
        BesselOrder::One => 0.5 * x,
    };
    let mut sum = term;
    for k in 1..MAX_SERIES_TERMS {
        term *= q / (k as f64 * (k as u32 + nu) as f64);
        sum += term;
        if term <= sum * f64::EPSILON {
            break;
        }
    }
    sum
}

/// Hankel expansion `e^{-x}Iₙ(x) ~ (2πx)^{-1/2} Σ Π((2j-1)² - 4n²) / (k!(8x)^k)`.
fn scaled_i_asymptotic(order: BesselOrder, x: f64) -> f64 {
    let mu = order.mu();
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..MAX_ASYMPTOTIC_TERMS {
        let odd = (2 * k - 1) as f64;
        let next = term * (odd * odd - mu) / (8.0 * k as f64 * x);
        if next.abs() > term.abs() {
            // series has started to diverge
            break;
        }
        term = next;
        sum += term;
        if term.abs() <= sum.abs() * f64::EPSILON {
            break;
        }
    }
    sum / (2.0 * PI * x).sqrt()
}

/// Small-argument series for `K₀` and `K₁`.
///
/// `K₀(x) = -(ln(x/2) + γ)·I₀(x) + Σ_{k≥1} H_k q^k/(k!)²`
///
/// `K₁(x) = 1/x + ln(x/2)·I₁(x) - (x/4) Σ_{k≥0} (ψ(k+1) + ψ(k+2)) q^k/(k!(k+1)!)`
///
/// with `q = x²/4`, `H_k` the harmonic numbers and `ψ(k+1) = H_k - γ`.
fn k_series(order: BesselOrder, x: f64) -> f64 {
    let q = 0.25 * x * x;
    let log_half = (0.5 * x).ln();

    match order {
        BesselOrder::Zero => {
            let mut term = 1.0;
            let mut harmonic = 0.0;
            let mut sum = 0.0;
            for k in 1..MAX_SERIES_TERMS {
                let kf = k as f64;
                term *= q / (kf * kf);
                harmonic += 1.0 / kf;
                let contribution = harmonic * term;
                sum += contribution;
                if contribution <= sum * f64::EPSILON {
                    break;
                }
            }
            -(log_half + EULER_GAMMA) * i_series(BesselOrder::Zero, x) + sum
        }
        BesselOrder::One => {
            // k = 0 term: ψ(1) + ψ(2) = 1 - 2γ
            let mut term = 1.0;
            let mut psi_k1 = -EULER_GAMMA;
            let mut psi_k2 = 1.0 - EULER_GAMMA;
            let mut sum = term * (psi_k1 + psi_k2);
            for k in 1..MAX_SERIES_TERMS {
                let kf = k as f64;
                term *= q / (kf * (kf + 1.0));
                psi_k1 += 1.0 / kf;
                psi_k2 += 1.0 / (kf + 1.0);
                let contribution = term * (psi_k1 + psi_k2);
                sum += contribution;
                if contribution.abs() <= sum.abs() * f64::EPSILON {
                    break;
                }
            }
            1.0 / x + log_half * i_series(BesselOrder::One, x) - 0.25 * x * sum
        }
    }
}

/// Trapezoidal rule on `eˣKₙ(x) = ∫₀^∞ e^{-x(cosh t - 1)} cosh(nt) dt`.
///
/// The integrand is analytic in a strip around the real axis and decays
/// double-exponentially, so the plain trapezoidal rule is spectrally
/// accurate. The step shrinks like `1/√x` to resolve the peak at `t = 0`.
fn scaled_k_integral(order: BesselOrder, x: f64) -> f64 {
    let nu = order.index() as f64;
    let h = (0.5 / x.sqrt()).min(0.2);
    let integrand = |t: f64| (-x * (t.cosh() - 1.0)).exp() * (nu * t).cosh();

    let mut sum = 0.5 * integrand(0.0);
    for k in 1..MAX_TRAPEZOID_NODES {
        let value = integrand(k as f64 * h);
        sum += value;
        if value <= sum * 1e-18 {
            break;
        }
    }
    sum * h
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Reference values from standard tables.
    const I0_1: f64 = 1.266_065_877_752_008_4;
    const I1_1: f64 = 0.565_159_103_992_485_1;
    const K0_1: f64 = 0.421_024_438_240_708_3;
    const K1_1: f64 = 0.601_907_230_197_234_6;
    const K0_2: f64 = 0.113_893_872_749_533_4;
    const K1_2: f64 = 0.139_865_881_816_522_4;
    const K0_5: f64 = 0.003_691_098_334_042_594;
    const I0_5: f64 = 27.239_871_823_604_44;

    #[test]
    fn test_reference_values() {
        assert_relative_eq!(bessel_i(BesselOrder::Zero, 1.0), I0_1, max_relative = 1e-14);
        assert_relative_eq!(bessel_i(BesselOrder::One, 1.0), I1_1, max_relative = 1e-14);
        assert_relative_eq!(bessel_i(BesselOrder::Zero, 5.0), I0_5, max_relative = 1e-13);
        assert_relative_eq!(bessel_k(BesselOrder::Zero, 1.0), K0_1, max_relative = 1e-13);
        assert_relative_eq!(bessel_k(BesselOrder::One, 1.0), K1_1, max_relative = 1e-13);
        assert_relative_eq!(bessel_k(BesselOrder::Zero, 2.0), K0_2, max_relative = 1e-13);
        assert_relative_eq!(bessel_k(BesselOrder::One, 2.0), K1_2, max_relative = 1e-13);
        assert_relative_eq!(bessel_k(BesselOrder::Zero, 5.0), K0_5, max_relative = 1e-12);
    }

    #[test]
    fn test_wronskian_across_branches() {
        // I0(x)K1(x) + I1(x)K0(x) = 1/x, in scaled form so that large x stays finite
        for &x in &[1e-6, 0.01, 0.5, 1.9, 2.1, 7.0, 29.0, 31.0, 150.0, 599.0] {
            let lhs = scaled_bessel_i(BesselOrder::Zero, x) * scaled_bessel_k(BesselOrder::One, x)
                + scaled_bessel_i(BesselOrder::One, x) * scaled_bessel_k(BesselOrder::Zero, x);
            assert_relative_eq!(lhs * x, 1.0, max_relative = 1e-11);
        }
    }

    #[test]
    fn test_scaled_i_edge_cases() {
        assert_eq!(scaled_bessel_i(BesselOrder::Zero, 0.0), 1.0);
        assert_eq!(scaled_bessel_i(BesselOrder::One, 0.0), 0.0);

        // negative arguments are folded onto |x|
        assert_eq!(
            scaled_bessel_i(BesselOrder::One, -3.0),
            scaled_bessel_i(BesselOrder::One, 3.0)
        );

        let far = scaled_bessel_i(BesselOrder::One, 800.0);
        assert_eq!(far, 1.0 / (2.0 * PI * 800.0).sqrt());
        assert_eq!(far, scaled_bessel_i(BesselOrder::Zero, 800.0));
    }

    #[test]
    fn test_k_edge_cases() {
        assert_eq!(bessel_k(BesselOrder::Zero, 0.0), f64::INFINITY);
        assert_eq!(bessel_k(BesselOrder::One, -1.0), f64::INFINITY);
        assert!(bessel_k(BesselOrder::Zero, f64::NAN).is_nan());
        assert_eq!(bessel_k(BesselOrder::Zero, 1000.0), 0.0);

        // K0 ~ -ln(x/2) - γ near the origin
        let x = 1e-10;
        assert_relative_eq!(
            bessel_k(BesselOrder::Zero, x),
            -(0.5 * x).ln() - EULER_GAMMA,
            max_relative = 1e-12
        );
        assert_relative_eq!(bessel_k(BesselOrder::One, x), 1.0 / x, max_relative = 1e-12);
    }

    #[test]
    fn test_continuity_at_switch_points() {
        for order in [BesselOrder::Zero, BesselOrder::One] {
            let below = bessel_k(order, K_SERIES_LIMIT);
            let above = bessel_k(order, K_SERIES_LIMIT + 1e-12);
            assert_relative_eq!(below, above, max_relative = 1e-10);

            let below = scaled_bessel_i(order, I_SERIES_LIMIT);
            let above = scaled_bessel_i(order, I_SERIES_LIMIT + 1e-12);
            assert_relative_eq!(below, above, max_relative = 1e-10);
        }
    }
}
