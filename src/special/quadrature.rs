//! Adaptive Gauss–Legendre quadrature.

/// Positive nodes of the 15-point Gauss–Legendre rule on [-1, 1].
const GL15_NODES: [f64; 8] = [
    0.0,
    0.201_194_093_997_434_5,
    0.394_151_347_077_563_4,
    0.570_972_172_608_538_8,
    0.724_417_731_360_170_1,
    0.848_206_583_410_427_2,
    0.937_273_392_400_706_0,
    0.987_992_518_020_485_4,
];

/// Weights matching [`GL15_NODES`].
const GL15_WEIGHTS: [f64; 8] = [
    0.202_578_241_925_561_3,
    0.198_431_485_327_111_6,
    0.186_161_000_015_562_2,
    0.166_269_205_816_993_9,
    0.139_570_677_926_154_3,
    0.107_159_220_467_171_9,
    0.070_366_047_488_108_1,
    0.030_753_241_996_117_3,
];

/// Relative part of the acceptance test in [`adaptive_gauss`].
const RELATIVE_TOLERANCE: f64 = 1e-10;

/// Default recursion cap used by the solver.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// 15-point Gauss–Legendre estimate of `∫ₐᵇ f`.
pub fn gauss15<F>(f: &F, a: f64, b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let half = 0.5 * (b - a);
    let centre = 0.5 * (a + b);

    let mut sum = GL15_WEIGHTS[0] * f(centre);
    for (&node, &weight) in GL15_NODES.iter().zip(GL15_WEIGHTS.iter()).skip(1) {
        let dx = half * node;
        sum += weight * (f(centre - dx) + f(centre + dx));
    }
    sum * half
}

/// Adaptive bisection on top of [`gauss15`].
///
/// Compares the one-panel estimate against the sum over both halves and
/// accepts the two-panel value when they agree to within
/// `1e-10·|fine| + tol`, or when `depth` has reached `max_depth`. Otherwise
/// each half is refined with `tol / 2`. Recursion is bounded by `max_depth`
/// regardless of how the estimates behave, so NaN integrands terminate too.
///
/// # Arguments
///
/// * `f` - The integrand
/// * `a`, `b` - Integration limits
/// * `tol` - Absolute tolerance for this panel
/// * `depth` - Current recursion depth, 0 for a top-level call
/// * `max_depth` - Recursion cap
///
/// # Examples
///
/// ```
/// use shale_welltest::special::adaptive_gauss;
///
/// let area = adaptive_gauss(&|x: f64| x.sin(), 0.0, std::f64::consts::PI, 1e-10, 0, 10);
/// assert!((area - 2.0).abs() < 1e-12);
/// ```
pub fn adaptive_gauss<F>(f: &F, a: f64, b: f64, tol: f64, depth: u32, max_depth: u32) -> f64
where
    F: Fn(f64) -> f64,
{
    let mid = 0.5 * (a + b);
    let coarse = gauss15(f, a, b);
    let fine = gauss15(f, a, mid) + gauss15(f, mid, b);

    if depth >= max_depth || (coarse - fine).abs() < RELATIVE_TOLERANCE * fine.abs() + tol {
        return fine;
    }

    adaptive_gauss(f, a, mid, tol / 2.0, depth + 1, max_depth)
        + adaptive_gauss(f, mid, b, tol / 2.0, depth + 1, max_depth)
}
