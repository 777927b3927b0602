//! Gaver–Stehfest numerical Laplace inversion.
//!
//! `f(t) ≈ (ln 2 / t) · Σ_{i=1}^{N} V_i · F(i·ln 2 / t)` with the classical
//! alternating coefficients `V_i`. Only real evaluations of `F` are needed,
//! which suits the Bessel-function solutions of the reservoir model.

use crate::error::{Result, WellTestError};
use log::trace;
use std::f64::consts::LN_2;

/// Below this dimensionless time the inverted value is defined as 0.
pub const MIN_INVERSION_TIME: f64 = 1e-12;

/// Threshold on `|gamaD|` below which stress sensitivity is ignored.
const MIN_STRESS_SENSITIVITY: f64 = 1e-9;

/// Smallest admissible argument of the stress-sensitivity logarithm.
const MIN_LOG_ARGUMENT: f64 = 1e-12;

/// Accuracy/speed trade-off for the inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// Eight Stehfest terms, for display curves
    #[default]
    High,

    /// Four Stehfest terms, for the inner loop of fitting
    Fast,
}

impl Precision {
    /// Number of Stehfest terms used at this precision.
    pub fn stehfest_terms(self) -> usize {
        match self {
            Precision::High => 8,
            Precision::Fast => 4,
        }
    }
}

/// Precomputed Stehfest weights for a fixed, even number of terms.
#[derive(Debug, Clone, PartialEq)]
pub struct StehfestInverter {
    coefficients: Vec<f64>,
}

impl StehfestInverter {
    /// Largest supported number of terms. Beyond this the alternating
    /// coefficients lose all precision in double arithmetic.
    pub const MAX_TERMS: usize = 20;

    /// Build an inverter with `n` terms.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `n` is odd or outside `2..=20`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shale_welltest::inversion::StehfestInverter;
    ///
    /// let inverter = StehfestInverter::new(4).unwrap();
    /// assert_eq!(inverter.coefficients(), &[-2.0, 26.0, -48.0, 24.0]);
    ///
    /// assert!(StehfestInverter::new(7).is_err());
    /// ```
    pub fn new(n: usize) -> Result<Self> {
        if n % 2 != 0 || !(2..=Self::MAX_TERMS).contains(&n) {
            return Err(WellTestError::InvalidInput(format!(
                "Stehfest term count must be even and within 2..={}, got {}",
                Self::MAX_TERMS,
                n
            )));
        }

        let coefficients = (1..=n).map(|i| stehfest_coefficient(i, n)).collect();
        Ok(Self { coefficients })
    }

    pub fn with_precision(precision: Precision) -> Self {
        let n = precision.stehfest_terms();
        Self {
            coefficients: (1..=n).map(|i| stehfest_coefficient(i, n)).collect(),
        }
    }

    /// Number of terms `N`.
    pub fn terms(&self) -> usize {
        self.coefficients.len()
    }

    /// Weights `V_1..V_N`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Invert `laplace` at dimensionless time `t_d`.
    ///
    /// Returns 0 for `t_d ≤ 1e-12`. Non-finite samples of the transform are
    /// dropped from the sum.
    pub fn invert<F>(&self, t_d: f64, laplace: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        if t_d.is_nan() || t_d <= MIN_INVERSION_TIME {
            return 0.0;
        }

        let scale = LN_2 / t_d;
        let sum: f64 = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(idx, &v)| {
                let z = (idx + 1) as f64 * scale;
                let value = laplace(z);
                if value.is_finite() {
                    v * value
                } else {
                    trace!("dropping non-finite Laplace sample at z = {:e}", z);
                    0.0
                }
            })
            .sum();

        sum * scale
    }
}

/// Stehfest weight `V_i` for `n` terms (1-based `i`).
///
/// `V_i = (-1)^{i+n/2} Σ_{k=⌊(i+1)/2⌋}^{min(i,n/2)} k^{n/2}(2k)! / ((n/2-k)! k! (k-1)! (i-k)! (2k-i)!)`
///
/// The summation bounds keep every factorial argument non-negative; a term
/// that would need a negative factorial is skipped rather than evaluated.
pub fn stehfest_coefficient(i: usize, n: usize) -> f64 {
    let half = n / 2;
    let k_start = (i + 1) / 2;
    let k_end = i.min(half);

    let mut sum = 0.0;
    for k in k_start.max(1)..=k_end {
        let (Some(a), Some(b), Some(c)) = (
            half.checked_sub(k),
            i.checked_sub(k),
            (2 * k).checked_sub(i),
        ) else {
            continue;
        };
        let numerator = (k as f64).powi(half as i32) * factorial(2 * k);
        let denominator =
            factorial(a) * factorial(k) * factorial(k - 1) * factorial(b) * factorial(c);
        sum += numerator / denominator;
    }

    if (i + half) % 2 == 0 {
        sum
    } else {
        -sum
    }
}

fn factorial(n: usize) -> f64 {
    (2..=n).fold(1.0, |acc, k| acc * k as f64)
}

/// Pressure-dependent permeability correction
///
/// `p' = -ln(1 - γ_D·p) / γ_D` when `|γ_D| > 1e-9` and the log argument
/// exceeds 1e-12; otherwise `p` is returned unchanged.
pub fn apply_stress_sensitivity(p_d: f64, gama_d: f64) -> f64 {
    if gama_d.abs() <= MIN_STRESS_SENSITIVITY {
        return p_d;
    }
    let argument = 1.0 - gama_d * p_d;
    if argument > MIN_LOG_ARGUMENT {
        -argument.ln() / gama_d
    } else {
        p_d
    }
}
