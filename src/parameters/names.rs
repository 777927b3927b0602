//! Canonical parameter names shared by the solver, the defaults and the fitter.

/// Porosity (fraction)
pub const PHI: &str = "phi";
/// Net thickness (m)
pub const H: &str = "h";
/// Oil viscosity (mPa·s)
pub const MU: &str = "mu";
/// Formation volume factor
pub const B: &str = "B";
/// Total compressibility (1/MPa)
pub const CT: &str = "Ct";
/// Flow rate (m³/d)
pub const Q: &str = "q";

/// Number of hydraulic fractures
pub const NF: &str = "nf";
/// Inner-region (fracture network) permeability (mD)
pub const KF: &str = "kf";
/// Outer-region (matrix) permeability (mD)
pub const KM: &str = "km";
/// Horizontal well length (m)
pub const L: &str = "L";
/// Fracture half-length (m)
pub const LF: &str = "Lf";
/// Dimensionless fracture half-length, always `Lf / L`
pub const LFD: &str = "LfD";
/// Dimensionless radius of the inner composite region
pub const RMD: &str = "rmD";
/// Storativity ratio of the fracture system
pub const OMEGA1: &str = "omega1";
/// Storativity ratio of the matrix system
pub const OMEGA2: &str = "omega2";
/// Interporosity flow coefficient
pub const LAMBDA1: &str = "lambda1";
/// Dimensionless stress-sensitivity coefficient
pub const GAMA_D: &str = "gamaD";
/// Dimensionless wellbore storage coefficient
pub const CD: &str = "cD";
/// Skin factor
pub const S: &str = "S";
/// Dimensionless outer-boundary radius
pub const RED: &str = "reD";
