//! Root-zone numerical constants and model contract.
//!
//! Centralises the fixed values used by the partition, flux and stepping code.

// -- Storage initialization --

/// Fraction of `max_storage` a unit starts with the first time it is seen.
pub const INITIAL_STORAGE_FRACTION: f64 = 0.5;

/// Rainfall substituted on the very first step when the observed rainfall is zero.
pub const BOOTSTRAP_RAINFALL: f64 = 1.0;

// -- Evapotranspiration --

/// Slope of the supply-limited AET curve: AET reaches PET at S / Smax = 1 / 1.33.
pub const AET_SUPPLY_FACTOR: f64 = 1.33;

// -- Input handling --

/// Sentinel marking a missing value in input series.
pub const NO_VALUE: f64 = -9999.0;

/// Tolerance below which a negative base in the partition formula is treated as round-off.
pub const DOMAIN_EPSILON: f64 = 1e-12;

// -- Unit conversion for quick flow --

/// Millimetres per metre.
pub const MM_PER_M: f64 = 1000.0;

/// Square metres per square kilometre.
pub const M2_PER_KM2: f64 = 1.0e6;

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

// -- Integration --

/// Length of the integration interval. Rates are expressed per time step.
pub const STEP_LENGTH: f64 = 1.0;

/// Default relative tolerance of the adaptive integrator.
pub const DEFAULT_RTOL: f64 = 1e-10;

/// Default absolute tolerance of the adaptive integrator.
pub const DEFAULT_ATOL: f64 = 1e-10;

/// Default bound on accepted + rejected adaptive sub-steps per integration.
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// Default smallest adaptive sub-step, as a fraction of the interval.
pub const DEFAULT_MIN_STEP_FRACTION: f64 = 1e-12;

/// Default number of Euler sub-steps.
pub const DEFAULT_EULER_SUBSTEPS: usize = 1;

// -- Model contract constants --

/// Numeric parameter names in `Parameters::to_array` order.
pub const PARAM_NAMES: &[&str] = &[
    "max_storage",
    "pore_size_index",
    "uptake_coeff",
    "uptake_exponent",
    "drainage_rate",
    "drainage_exponent",
    "unit_area",
    "timestep_minutes",
];

/// Number of numeric parameters.
pub const N_PARAMS: usize = 8;
