//! JSON run configuration.
//!
//! ```json
//! {
//!   "parameters": {
//!     "max_storage": 4.0, "pore_size_index": 0.33,
//!     "drainage_rate": 0.000958, "drainage_exponent": 1.83,
//!     "unit_area": 3.79, "timestep_minutes": 60.0
//!   },
//!   "integrator": { "method": "dp853", "rtol": 1e-10 },
//!   "first_step": "partition-probe"
//! }
//! ```
//!
//! Everything outside `parameters` is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ATOL, DEFAULT_EULER_SUBSTEPS, DEFAULT_MAX_STEPS, DEFAULT_MIN_STEP_FRACTION,
    DEFAULT_RTOL,
};
use crate::error::RootZoneError;
use crate::integrator::{AdaptiveSettings, Integrator, IntegratorChoice};
use crate::params::Parameters;
use crate::run::{FirstStepPolicy, RootZoneModel, StepSettings};

/// Complete configuration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub parameters: ParameterConfig,

    #[serde(default)]
    pub integrator: IntegratorConfig,

    #[serde(default)]
    pub first_step: FirstStepPolicy,
}

/// Root-zone parameters as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterConfig {
    pub max_storage: f64,
    pub pore_size_index: f64,

    #[serde(default)]
    pub uptake_coeff: f64,
    #[serde(default = "default_uptake_exponent")]
    pub uptake_exponent: f64,

    pub drainage_rate: f64,
    pub drainage_exponent: f64,

    #[serde(default)]
    pub connect_to_canopy: bool,

    pub unit_area: f64,
    #[serde(default = "default_timestep_minutes")]
    pub timestep_minutes: f64,
}

fn default_uptake_exponent() -> f64 { 1.0 }
fn default_timestep_minutes() -> f64 { 60.0 }

/// Integrator selection and its tuning knobs.
///
/// Tolerances only apply to the adaptive method, `euler_substeps` only to the
/// fixed-step one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    #[serde(default = "default_method")]
    pub method: IntegratorChoice,
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_min_step_fraction")]
    pub min_step_fraction: f64,
    #[serde(default = "default_euler_substeps")]
    pub euler_substeps: usize,
}

fn default_method() -> IntegratorChoice { IntegratorChoice::HighOrderAdaptive }
fn default_rtol() -> f64 { DEFAULT_RTOL }
fn default_atol() -> f64 { DEFAULT_ATOL }
fn default_max_steps() -> usize { DEFAULT_MAX_STEPS }
fn default_min_step_fraction() -> f64 { DEFAULT_MIN_STEP_FRACTION }
fn default_euler_substeps() -> usize { DEFAULT_EULER_SUBSTEPS }

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            rtol: default_rtol(),
            atol: default_atol(),
            max_steps: default_max_steps(),
            min_step_fraction: default_min_step_fraction(),
            euler_substeps: default_euler_substeps(),
        }
    }
}

impl IntegratorConfig {
    /// Resolve the configured method into an [`Integrator`].
    pub fn to_integrator(&self) -> Integrator {
        match self.method {
            IntegratorChoice::HighOrderAdaptive => Integrator::HighOrderAdaptive(AdaptiveSettings {
                rtol: self.rtol,
                atol: self.atol,
                max_steps: self.max_steps,
                min_step_fraction: self.min_step_fraction,
            }),
            IntegratorChoice::FixedStepExplicit => Integrator::fixed_step(self.euler_substeps),
        }
    }
}

impl RunConfig {
    /// Load and validate a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RootZoneError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RootZoneError::ConfigIo(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, RootZoneError> {
        let config: RunConfig = serde_json::from_str(content)
            .map_err(|e| RootZoneError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameters and integrator settings.
    pub fn validate(&self) -> Result<(), RootZoneError> {
        self.to_parameters()?;
        self.integrator.to_integrator().validate()
    }

    /// Validated model parameters.
    pub fn to_parameters(&self) -> Result<Parameters, RootZoneError> {
        let p = &self.parameters;
        Parameters::new(
            p.max_storage,
            p.pore_size_index,
            p.uptake_coeff,
            p.uptake_exponent,
            p.drainage_rate,
            p.drainage_exponent,
            p.connect_to_canopy,
            p.unit_area,
            p.timestep_minutes,
        )
    }

    pub fn step_settings(&self) -> StepSettings {
        StepSettings::new(self.integrator.to_integrator(), self.first_step)
    }

    /// Build a ready-to-step model.
    pub fn build_model(&self) -> Result<RootZoneModel, RootZoneError> {
        RootZoneModel::with_settings(self.to_parameters()?, self.step_settings())
    }
}
