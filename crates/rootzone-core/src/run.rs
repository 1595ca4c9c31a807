/// Root-zone model orchestration.
///
/// - `step_unit()`: advance one unit by one step
/// - `run()`: single-unit run over a forcing series
/// - [`RootZoneModel`]: multi-unit stepper owning the per-unit storage and the clock
///
/// Each step integrates the storage first and then evaluates the diagnostic fluxes
/// on the post-step storage. The diagnostics re-evaluate terms the integrator has
/// already applied and are reported, not subtracted a second time.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{BOOTSTRAP_RAINFALL, STEP_LENGTH};
use crate::error::{NumericalFault, RootZoneError};
use crate::forcing::{ForcingSeries, StepForcing, StepInputs};
use crate::integrator::Integrator;
use crate::ode::RootZoneOde;
use crate::outputs::{StepOutputs, StepOutputsTimeseries};
use crate::params::Parameters;
use crate::processes;
use crate::state::UnitStore;
use crate::UnitId;

/// Unit ID attached to errors raised by the single-unit [`run`].
pub const SINGLE_UNIT: UnitId = 0;

/// Handling of a dry first step.
///
/// Applies only at global step 0 and only when the normalized rainfall is exactly 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstStepPolicy {
    /// Evaluate the partition with unit rainfall so the initial storage is checked
    /// against the partition domain. Fluxes use the real rainfall and alpha is reported
    /// as 0.
    #[default]
    PartitionProbe,
    /// Treat the step as if one unit of rainfall had fallen.
    #[serde(alias = "legacy")]
    SubstituteRainfall,
    /// No special casing.
    #[serde(alias = "none")]
    Disabled,
}

impl FirstStepPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PartitionProbe => "partition-probe",
            Self::SubstituteRainfall => "substitute-rainfall",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for FirstStepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FirstStepPolicy {
    type Err = RootZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partition-probe" => Ok(Self::PartitionProbe),
            "substitute-rainfall" | "legacy" => Ok(Self::SubstituteRainfall),
            "disabled" | "none" => Ok(Self::Disabled),
            _ => Err(RootZoneError::config(
                "first_step",
                s,
                "expected 'partition-probe', 'substitute-rainfall' or 'disabled'",
            )),
        }
    }
}

/// Run-wide numerical settings, fixed before the first step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepSettings {
    pub integrator: Integrator,
    pub first_step: FirstStepPolicy,
}

impl StepSettings {
    pub fn new(integrator: Integrator, first_step: FirstStepPolicy) -> Self {
        Self {
            integrator,
            first_step,
        }
    }
}

/// Execute one step for a single unit.
///
/// `step_index` is the global step counter; it only matters for the first-step policy.
/// Returns (new_storage, outputs). On failure the caller keeps the prior storage.
pub fn step_unit(
    storage: f64,
    params: &Parameters,
    settings: &StepSettings,
    inputs: &StepInputs,
    step_index: u64,
) -> Result<(f64, StepOutputs), NumericalFault> {
    let inputs = inputs.normalized();
    let net_pet = inputs.net_pet();

    // 1. First-step bootstrap
    let mut rainfall = inputs.rainfall;
    let mut partition_rainfall = rainfall;
    if step_index == 0 && rainfall == 0.0 {
        match settings.first_step {
            FirstStepPolicy::PartitionProbe => partition_rainfall = BOOTSTRAP_RAINFALL,
            FirstStepPolicy::SubstituteRainfall => {
                rainfall = BOOTSTRAP_RAINFALL;
                partition_rainfall = BOOTSTRAP_RAINFALL;
            }
            FirstStepPolicy::Disabled => {}
        }
    }

    // 2. Partition
    let partition = processes::partition(
        storage,
        partition_rainfall,
        params.max_storage,
        params.pore_size_index,
    )?;
    let alpha = if rainfall == 0.0 { 0.0 } else { partition.alpha };

    // 3. Infiltration and quick flow
    let actual_input = (1.0 - alpha) * rainfall;
    let quick_flow = processes::quick_flow_rate(alpha * rainfall, params);

    // 4. Storage equation
    let ode = RootZoneOde::new(actual_input, net_pet, params);
    let y = settings.integrator.integrate(
        &ode,
        RootZoneOde::initial_state(storage, params.max_storage),
        STEP_LENGTH,
    )?;
    let new_storage = y[0];
    if !new_storage.is_finite() {
        return Err(NumericalFault::Integration(format!(
            "non-finite storage: {storage} -> {new_storage}"
        )));
    }
    let scale = storage.abs().max(params.max_storage);
    if let Some(allowance) = settings.integrator.empty_store_allowance(scale) {
        if new_storage < -allowance {
            return Err(NumericalFault::Integration(format!(
                "storage left its domain: {storage} -> {new_storage} (allowance {allowance:e})"
            )));
        }
    }
    let new_storage = new_storage.max(0.0);

    // 5. Diagnostics on the post-step storage
    let outputs = StepOutputs {
        actual_input,
        storage: new_storage,
        root_uptake: processes::root_uptake(new_storage, params),
        actual_et: processes::actual_et(new_storage, net_pet, params.max_storage),
        drainage: processes::drainage(
            new_storage,
            params.drainage_rate,
            params.drainage_exponent,
        ),
        quick_flow,
        alpha,
    };

    Ok((new_storage, outputs))
}

/// Run a single unit over a forcing series.
///
/// `initial_storage` defaults to half the capacity. The first entry of `forcing` is
/// global step 0. Stops at the first failing step.
pub fn run(
    params: &Parameters,
    settings: &StepSettings,
    forcing: &ForcingSeries,
    initial_storage: Option<f64>,
) -> Result<StepOutputsTimeseries, RootZoneError> {
    params.validate()?;
    settings.integrator.validate()?;

    let mut storage = initial_storage.unwrap_or_else(|| params.initial_storage());
    if !storage.is_finite() || storage < 0.0 {
        return Err(RootZoneError::config(
            "initial_storage",
            storage,
            "must be finite and non-negative",
        ));
    }

    let mut outputs = StepOutputsTimeseries::with_capacity(forcing.len());
    for (t, inputs) in forcing.iter().enumerate() {
        let step = t as u64;
        let (new_storage, out) = step_unit(storage, params, settings, &inputs, step)
            .map_err(|fault| fault.at(SINGLE_UNIT, step))?;
        outputs.push(&out);
        storage = new_storage;
    }

    Ok(outputs)
}

/// Outcome of one multi-unit step.
///
/// Units that failed keep their previous storage and have no entry in `outputs`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Global index of the step that produced this report.
    pub step: u64,
    pub outputs: BTreeMap<UnitId, StepOutputs>,
    pub failures: SmallVec<[RootZoneError; 2]>,
}

impl StepReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Units that failed this step.
    pub fn failed_units(&self) -> Vec<UnitId> {
        self.failures.iter().filter_map(RootZoneError::unit).collect()
    }

    /// Outputs of the step, or the first unit failure.
    pub fn into_result(self) -> Result<BTreeMap<UnitId, StepOutputs>, RootZoneError> {
        match self.failures.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.outputs),
        }
    }
}

/// Multi-unit root-zone model.
///
/// Owns the storage of every unit seen so far and the global step counter.
#[derive(Debug, Clone)]
pub struct RootZoneModel {
    params: Parameters,
    settings: StepSettings,
    store: UnitStore,
}

impl RootZoneModel {
    /// Build a model after validating parameters and integrator settings.
    pub fn new(
        params: Parameters,
        integrator: Integrator,
        first_step: FirstStepPolicy,
    ) -> Result<Self, RootZoneError> {
        Self::with_settings(params, StepSettings::new(integrator, first_step))
    }

    pub fn with_settings(
        params: Parameters,
        settings: StepSettings,
    ) -> Result<Self, RootZoneError> {
        params.validate()?;
        settings.integrator.validate()?;
        Ok(Self {
            params,
            settings,
            store: UnitStore::new(),
        })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    /// Advance every unit present in `forcing.rainfall` by one step.
    ///
    /// New units are seeded at half the capacity before the step. The clock advances
    /// even when some units fail.
    pub fn step(&mut self, forcing: &StepForcing) -> StepReport {
        let step = self.store.current_step();

        let mut work = Vec::with_capacity(forcing.len());
        for (id, inputs) in forcing.iter() {
            let (storage, created) = self.store.get_or_seed(id, self.params.initial_storage());
            if created {
                log::debug!("unit {id} seeded with storage {storage} at step {step}");
            }
            work.push((id, storage, inputs));
        }

        let results = self.compute(&work, step);

        let mut report = StepReport {
            step,
            outputs: BTreeMap::new(),
            failures: SmallVec::new(),
        };
        for (id, result) in results {
            match result {
                Ok((storage, outputs)) => {
                    self.store.commit(id, storage);
                    report.outputs.insert(id, outputs);
                }
                Err(fault) => {
                    let err = fault.at(id, step);
                    log::warn!("{err}; storage kept at previous value");
                    report.failures.push(err);
                }
            }
        }

        self.store.advance();
        log::debug!(
            "step {step}: {} units updated, {} failed",
            report.outputs.len(),
            report.failures.len()
        );
        report
    }

    #[cfg(not(feature = "parallel"))]
    fn compute(
        &self,
        work: &[(UnitId, f64, StepInputs)],
        step: u64,
    ) -> Vec<(UnitId, Result<(f64, StepOutputs), NumericalFault>)> {
        work.iter()
            .map(|&(id, storage, inputs)| {
                (id, step_unit(storage, &self.params, &self.settings, &inputs, step))
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn compute(
        &self,
        work: &[(UnitId, f64, StepInputs)],
        step: u64,
    ) -> Vec<(UnitId, Result<(f64, StepOutputs), NumericalFault>)> {
        use rayon::prelude::*;

        work.par_iter()
            .map(|&(id, storage, inputs)| {
                (id, step_unit(storage, &self.params, &self.settings, &inputs, step))
            })
            .collect()
    }

    /// Storage of `id`, or `None` if the unit has never appeared.
    pub fn storage(&self, id: UnitId) -> Option<f64> {
        self.store.get(id)
    }

    /// Storage of `id` divided by the capacity.
    pub fn saturation_degree(&self, id: UnitId) -> Option<f64> {
        self.store.get(id).map(|s| s / self.params.max_storage)
    }

    /// Saturation degree of every known unit.
    pub fn saturation_degrees(&self) -> BTreeMap<UnitId, f64> {
        self.store.saturation_degrees(self.params.max_storage)
    }

    /// Import an initial condition for `id`, replacing the default seed.
    pub fn seed_storage(&mut self, id: UnitId, storage: f64) -> Result<(), RootZoneError> {
        self.store.seed(id, storage)
    }

    /// Known units in ascending ID order.
    pub fn units(&self) -> Vec<UnitId> {
        self.store.units().collect()
    }

    /// Number of completed steps.
    pub fn current_step(&self) -> u64 {
        self.store.current_step()
    }
}
