/// Root-zone parameters shared by every unit of a run.
///
/// - `max_storage`: root-zone capacity Smax [mm]
/// - `pore_size_index`: pB, spatial variability of the storage capacity [-]
/// - `uptake_coeff`, `uptake_exponent`: power-law root uptake
/// - `drainage_rate`, `drainage_exponent`: power-law drainage to the lower layer
/// - `connect_to_canopy`: enables the root uptake diagnostic
/// - `unit_area`: area of each unit [km²]
/// - `timestep_minutes`: length of a step [min]
use crate::constants::{N_PARAMS, PARAM_NAMES};
use crate::error::RootZoneError;
use crate::traits::ModelParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    pub max_storage: f64,
    pub pore_size_index: f64,
    pub uptake_coeff: f64,
    pub uptake_exponent: f64,
    pub drainage_rate: f64,
    pub drainage_exponent: f64,
    pub connect_to_canopy: bool,
    pub unit_area: f64,
    pub timestep_minutes: f64,
}

impl Parameters {
    /// Create new Parameters, returning an error if any value is outside its domain.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        max_storage: f64,
        pore_size_index: f64,
        uptake_coeff: f64,
        uptake_exponent: f64,
        drainage_rate: f64,
        drainage_exponent: f64,
        connect_to_canopy: bool,
        unit_area: f64,
        timestep_minutes: f64,
    ) -> Result<Self, RootZoneError> {
        let params = Self {
            max_storage,
            pore_size_index,
            uptake_coeff,
            uptake_exponent,
            drainage_rate,
            drainage_exponent,
            connect_to_canopy,
            unit_area,
            timestep_minutes,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check every invariant. Called by `new` and by the configuration loader.
    pub fn validate(&self) -> Result<(), RootZoneError> {
        let values = <Self as ModelParams>::to_array(self);
        for (name, val) in PARAM_NAMES.iter().zip(&values) {
            if !val.is_finite() {
                return Err(RootZoneError::config(name, val, "must be finite"));
            }
        }

        if self.max_storage <= 0.0 {
            return Err(RootZoneError::config(
                "max_storage",
                self.max_storage,
                "capacity must be positive",
            ));
        }
        // The partition formula divides by pB + 1 and raises to 1 / (pB + 1).
        if self.pore_size_index <= -1.0 {
            return Err(RootZoneError::config(
                "pore_size_index",
                self.pore_size_index,
                "must be greater than -1",
            ));
        }
        for (name, val) in [
            ("uptake_coeff", self.uptake_coeff),
            ("uptake_exponent", self.uptake_exponent),
            ("drainage_rate", self.drainage_rate),
            ("drainage_exponent", self.drainage_exponent),
        ] {
            if val < 0.0 {
                return Err(RootZoneError::config(name, val, "must be non-negative"));
            }
        }
        if self.unit_area <= 0.0 {
            return Err(RootZoneError::config(
                "unit_area",
                self.unit_area,
                "area must be positive",
            ));
        }
        if self.timestep_minutes <= 0.0 {
            return Err(RootZoneError::config(
                "timestep_minutes",
                self.timestep_minutes,
                "step length must be positive",
            ));
        }
        Ok(())
    }

    /// Storage a unit is seeded with the first time it appears.
    pub fn initial_storage(&self) -> f64 {
        crate::constants::INITIAL_STORAGE_FRACTION * self.max_storage
    }

    /// Step length in seconds.
    pub fn timestep_seconds(&self) -> f64 {
        self.timestep_minutes * crate::constants::SECONDS_PER_MINUTE
    }

    /// Same parameters with the canopy connection switched.
    pub fn with_canopy(mut self, connect_to_canopy: bool) -> Self {
        self.connect_to_canopy = connect_to_canopy;
        self
    }
}

impl ModelParams for Parameters {
    const N_PARAMS: usize = N_PARAMS;
    const PARAM_NAMES: &'static [&'static str] = PARAM_NAMES;

    /// The canopy flag is not part of the flat layout and defaults to `false`.
    fn from_array(arr: &[f64]) -> Result<Self, RootZoneError> {
        if arr.len() != N_PARAMS {
            return Err(RootZoneError::config(
                "params",
                arr.len(),
                format!("expected {} parameters", N_PARAMS),
            ));
        }
        Self::new(
            arr[0], arr[1], arr[2], arr[3], arr[4], arr[5], false, arr[6], arr[7],
        )
    }

    fn to_array(&self) -> Vec<f64> {
        vec![
            self.max_storage,
            self.pore_size_index,
            self.uptake_coeff,
            self.uptake_exponent,
            self.drainage_rate,
            self.drainage_exponent,
            self.unit_area,
            self.timestep_minutes,
        ]
    }
}
