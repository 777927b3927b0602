//! Special functions used by the Laplace-space solver.
//!
//! Modified Bessel functions of orders 0 and 1 and an adaptive Gauss–Legendre
//! integrator for the line-source influence integrals.

pub mod bessel;
pub mod quadrature;

pub use bessel::{bessel_i, bessel_k, scaled_bessel_i, scaled_bessel_k, BesselOrder};
pub use quadrature::{adaptive_gauss, gauss15, DEFAULT_MAX_DEPTH};
