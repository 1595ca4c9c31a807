/// Forcing inputs for the root-zone stepper.
///
/// - [`StepInputs`]: the three scalars one unit receives in one step
/// - [`StepForcing`]: inputs of one step for many units, keyed by unit ID
/// - [`ForcingSeries`]: validated single-unit series for [`crate::run::run`]
use std::collections::BTreeMap;

use crate::error::RootZoneError;
use crate::processes;
use crate::UnitId;

/// Inputs of one unit for one step [mm per step].
///
/// No-value entries (`-9999` or NaN) are read as zero by [`StepInputs::normalized`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInputs {
    pub rainfall: f64,
    pub pet: f64,
    pub wet_canopy: f64,
}

impl StepInputs {
    pub fn new(rainfall: f64, pet: f64, wet_canopy: f64) -> Self {
        Self {
            rainfall,
            pet,
            wet_canopy,
        }
    }

    /// Rainfall only, no evaporative demand.
    pub fn rain(rainfall: f64) -> Self {
        Self {
            rainfall,
            ..Self::default()
        }
    }

    /// Copy with every no-value entry replaced by zero.
    pub fn normalized(&self) -> Self {
        Self {
            rainfall: processes::normalize_input(self.rainfall),
            pet: processes::normalize_input(self.pet),
            wet_canopy: processes::normalize_input(self.wet_canopy),
        }
    }

    /// Potential ET left for the root zone after wet-canopy evaporation.
    pub fn net_pet(&self) -> f64 {
        processes::net_pet(self.pet, self.wet_canopy)
    }
}

/// Inputs of one step for a set of units.
///
/// The rainfall map decides which units take part in the step. PET and wet-canopy
/// maps are optional; a unit missing from them gets zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepForcing {
    pub rainfall: BTreeMap<UnitId, f64>,
    pub pet: Option<BTreeMap<UnitId, f64>>,
    pub wet_canopy: Option<BTreeMap<UnitId, f64>>,
}

impl StepForcing {
    pub fn new(rainfall: BTreeMap<UnitId, f64>) -> Self {
        Self {
            rainfall,
            pet: None,
            wet_canopy: None,
        }
    }

    /// Build from `(unit, rainfall)` pairs.
    pub fn from_rainfall<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (UnitId, f64)>,
    {
        Self::new(pairs.into_iter().collect())
    }

    pub fn with_pet(mut self, pet: BTreeMap<UnitId, f64>) -> Self {
        self.pet = Some(pet);
        self
    }

    pub fn with_wet_canopy(mut self, wet_canopy: BTreeMap<UnitId, f64>) -> Self {
        self.wet_canopy = Some(wet_canopy);
        self
    }

    /// Units taking part in this step, in ascending ID order.
    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.rainfall.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rainfall.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rainfall.is_empty()
    }

    /// Raw inputs of every participating unit, in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, StepInputs)> + '_ {
        let lookup = |map: &Option<BTreeMap<UnitId, f64>>, id: UnitId| {
            map.as_ref()
                .and_then(|m| m.get(&id).copied())
                .unwrap_or(0.0)
        };
        self.rainfall.iter().map(move |(&id, &rainfall)| {
            (
                id,
                StepInputs {
                    rainfall,
                    pet: lookup(&self.pet, id),
                    wet_canopy: lookup(&self.wet_canopy, id),
                },
            )
        })
    }

    /// Raw inputs for `id`, or `None` if the unit has no rainfall entry.
    pub fn inputs_for(&self, id: UnitId) -> Option<StepInputs> {
        let rainfall = *self.rainfall.get(&id)?;
        let lookup = |map: &Option<BTreeMap<UnitId, f64>>| {
            map.as_ref()
                .and_then(|m| m.get(&id).copied())
                .unwrap_or(0.0)
        };
        Some(StepInputs {
            rainfall,
            pet: lookup(&self.pet),
            wet_canopy: lookup(&self.wet_canopy),
        })
    }
}

/// Validated single-unit forcing series.
///
/// All arrays have the same non-zero length. No-value entries are allowed and are
/// normalized when the step runs; infinities are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcingSeries {
    pub rainfall: Vec<f64>,
    pub pet: Vec<f64>,
    pub wet_canopy: Vec<f64>,
}

impl ForcingSeries {
    /// Create a series with validation.
    ///
    /// `pet` and `wet_canopy` default to zeros when `None`.
    pub fn new(
        rainfall: Vec<f64>,
        pet: Option<Vec<f64>>,
        wet_canopy: Option<Vec<f64>>,
    ) -> Result<Self, RootZoneError> {
        if rainfall.is_empty() {
            return Err(RootZoneError::config("rainfall", 0, "series is empty"));
        }
        let n = rainfall.len();
        let pet = pet.unwrap_or_else(|| vec![0.0; n]);
        let wet_canopy = wet_canopy.unwrap_or_else(|| vec![0.0; n]);

        for (name, series) in [("pet", &pet), ("wet_canopy", &wet_canopy)] {
            if series.len() != n {
                return Err(RootZoneError::config(
                    name,
                    series.len(),
                    format!("length does not match rainfall length {n}"),
                ));
            }
        }
        for (name, series) in [
            ("rainfall", &rainfall),
            ("pet", &pet),
            ("wet_canopy", &wet_canopy),
        ] {
            if let Some(v) = series.iter().find(|v| v.is_infinite()) {
                return Err(RootZoneError::config(name, v, "series contains infinite values"));
            }
        }

        Ok(Self {
            rainfall,
            pet,
            wet_canopy,
        })
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.rainfall.len()
    }

    /// Returns `true` if there are no timesteps.
    pub fn is_empty(&self) -> bool {
        self.rainfall.is_empty()
    }

    /// Inputs at timestep `t`.
    pub fn inputs_at(&self, t: usize) -> StepInputs {
        StepInputs::new(self.rainfall[t], self.pet[t], self.wet_canopy[t])
    }

    pub fn iter(&self) -> impl Iterator<Item = StepInputs> + '_ {
        (0..self.len()).map(|t| self.inputs_at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NO_VALUE;

    // -- StepInputs --

    #[test]
    fn normalized_replaces_no_value() {
        let i = StepInputs::new(NO_VALUE, f64::NAN, 0.4).normalized();
        assert_eq!(i, StepInputs::new(0.0, 0.0, 0.4));
    }

    #[test]
    fn net_pet_uses_normalized_terms() {
        assert_eq!(StepInputs::new(1.0, 3.0, 0.5).net_pet(), 2.5);
        assert_eq!(StepInputs::new(1.0, NO_VALUE, 0.5).net_pet(), -0.5);
    }

    // -- StepForcing --

    #[test]
    fn missing_optional_inputs_read_as_zero() {
        let f = StepForcing::from_rainfall([(1, 2.0), (5, 0.0)])
            .with_pet(BTreeMap::from([(1, 3.0)]));
        assert_eq!(f.inputs_for(1), Some(StepInputs::new(2.0, 3.0, 0.0)));
        assert_eq!(f.inputs_for(5), Some(StepInputs::rain(0.0)));
        let all: Vec<_> = f.iter().collect();
        assert_eq!(all, vec![(1, StepInputs::new(2.0, 3.0, 0.0)), (5, StepInputs::rain(0.0))]);
    }

    #[test]
    fn unit_without_rainfall_is_absent() {
        let f = StepForcing::from_rainfall([(1, 2.0)]).with_pet(BTreeMap::from([(9, 3.0)]));
        assert_eq!(f.inputs_for(9), None);
        assert_eq!(f.units().collect::<Vec<_>>(), vec![1]);
        assert_eq!(f.len(), 1);
    }

    // -- ForcingSeries --

    #[test]
    fn valid_series_defaults_optional_arrays() {
        let fs = ForcingSeries::new(vec![0.0, 5.0, 0.0], None, None).unwrap();
        assert_eq!(fs.len(), 3);
        assert_eq!(fs.pet, vec![0.0; 3]);
        assert_eq!(fs.inputs_at(1), StepInputs::rain(5.0));
        assert_eq!(fs.iter().count(), 3);
    }

    #[test]
    fn rejects_empty_series() {
        let err = ForcingSeries::new(vec![], None, None).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = ForcingSeries::new(vec![1.0, 2.0], Some(vec![0.5]), None).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn accepts_no_value_rejects_infinity() {
        assert!(ForcingSeries::new(vec![NO_VALUE, f64::NAN], None, None).is_ok());
        assert!(ForcingSeries::new(vec![1.0, f64::INFINITY], None, None).is_err());
    }
}
