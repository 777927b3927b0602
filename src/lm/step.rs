//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! The step solves the damped normal equations
//! `(H + λ·diag(1 + |H_ii|))·δ = -g` with `H = JᵀJ` and `g = Jᵀr`.

use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
use log::trace;
use nalgebra::DVector;
use ndarray::{Array1, Array2};

/// Normal equations of a linearized least-squares problem.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    /// `JᵀJ`, symmetric
    pub hessian: Array2<f64>,
    /// `Jᵀr`
    pub gradient: Array1<f64>,
}

impl NormalEquations {
    /// Form `JᵀJ` and `Jᵀr`.
    ///
    /// Only the lower triangle of `JᵀJ` is accumulated; the upper triangle is
    /// mirrored from it, so the result is exactly symmetric.
    pub fn new(jacobian: &Array2<f64>, residuals: &Array1<f64>) -> Self {
        let n = jacobian.ncols();
        let rows = jacobian.nrows().min(residuals.len());

        let mut hessian = Array2::zeros((n, n));
        let mut gradient = Array1::zeros(n);
        for k in 0..rows {
            for i in 0..n {
                let jki = jacobian[[k, i]];
                gradient[i] += jki * residuals[k];
                for j in 0..=i {
                    hessian[[i, j]] += jki * jacobian[[k, j]];
                }
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                hessian[[i, j]] = hessian[[j, i]];
            }
        }

        Self { hessian, gradient }
    }

    /// Solve the damped system for the step `δ`.
    ///
    /// Cholesky is tried first; if the damped matrix is not positive definite
    /// the system is solved by LU instead. Returns `None` when neither
    /// factorization yields a finite step.
    pub fn damped_step(&self, lambda: f64) -> Option<Array1<f64>> {
        let mut damped = self.hessian.clone();
        for i in 0..damped.nrows() {
            damped[[i, i]] += lambda * (1.0 + self.hessian[[i, i]].abs());
        }
        let rhs = self.gradient.mapv(|g| -g);
        solve_symmetric(&damped, &rhs)
    }
}

/// Solve `a·x = b` for symmetric `a`.
pub fn solve_symmetric(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let a = ndarray_to_nalgebra(a);
    let b = ndarray_vec_to_nalgebra(b);

    let finite = |x: &DVector<f64>| x.iter().all(|v| v.is_finite());

    if let Some(chol) = a.clone().cholesky() {
        let x = chol.solve(&b);
        if finite(&x) {
            return Some(nalgebra_vec_to_ndarray(&x));
        }
    }

    trace!("Cholesky failed, falling back to LU");
    let x = a.lu().solve(&b)?;
    finite(&x).then(|| nalgebra_vec_to_ndarray(&x))
}
