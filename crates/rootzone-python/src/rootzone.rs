use std::collections::BTreeMap;

use numpy::PyReadonlyArray1;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::convert::{checked_slice, contiguous_slice, to_py_err};

use rootzone_core::constants::N_PARAMS;
use rootzone_core::run;
use rootzone_core::traits::ModelParams;
use rootzone_core::{
    FirstStepPolicy, ForcingSeries, Integrator, IntegratorChoice, Parameters, RootZoneModel,
    RunConfig, StepForcing, StepInputs, StepSettings, UnitId,
};

// ---------------------------------------------------------------------------
// Typed pyclass result objects
// ---------------------------------------------------------------------------

define_timeseries_result! {
    /// Single-unit run results with typed numpy array attributes.
    pub struct RootZoneResult from rootzone_core::StepOutputsTimeseries {
        actual_input, storage, root_uptake, actual_et, drainage, quick_flow, alpha,
    }
}

define_step_result! {
    /// Outputs of one unit for one step.
    pub struct RootZoneStepOutputs from rootzone_core::StepOutputs {
        actual_input, storage, root_uptake, actual_et, drainage, quick_flow, alpha,
    }
}

// ---------------------------------------------------------------------------
// Argument conversion
// ---------------------------------------------------------------------------

fn build_params(
    params: &PyReadonlyArray1<'_, f64>,
    connect_to_canopy: bool,
) -> PyResult<Parameters> {
    let p_slice = checked_slice(params, N_PARAMS, "params")?;
    Parameters::from_array(p_slice)
        .map(|p| p.with_canopy(connect_to_canopy))
        .map_err(to_py_err)
}

fn build_settings(
    integrator: &str,
    first_step: &str,
    euler_substeps: usize,
) -> PyResult<StepSettings> {
    let choice: IntegratorChoice = integrator.parse().map_err(to_py_err)?;
    let integrator = match choice {
        IntegratorChoice::FixedStepExplicit => Integrator::fixed_step(euler_substeps),
        IntegratorChoice::HighOrderAdaptive => Integrator::from(choice),
    };
    integrator.validate().map_err(to_py_err)?;
    let first_step: FirstStepPolicy = first_step.parse().map_err(to_py_err)?;
    Ok(StepSettings::new(integrator, first_step))
}

fn optional_series(
    arr: &Option<PyReadonlyArray1<'_, f64>>,
    n: usize,
    name: &str,
) -> PyResult<Option<Vec<f64>>> {
    match arr {
        Some(a) => Ok(Some(checked_slice(a, n, name)?.to_vec())),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Single-unit functions
// ---------------------------------------------------------------------------

#[pyfunction]
#[pyo3(signature = (
    params, rainfall, pet=None, wet_canopy=None, initial_storage=None,
    connect_to_canopy=false, integrator="high-order-adaptive",
    first_step="partition-probe", euler_substeps=1
))]
#[allow(clippy::too_many_arguments)]
fn rootzone_run<'py>(
    py: Python<'py>,
    params: PyReadonlyArray1<'py, f64>,
    rainfall: PyReadonlyArray1<'py, f64>,
    pet: Option<PyReadonlyArray1<'py, f64>>,
    wet_canopy: Option<PyReadonlyArray1<'py, f64>>,
    initial_storage: Option<f64>,
    connect_to_canopy: bool,
    integrator: &str,
    first_step: &str,
    euler_substeps: usize,
) -> PyResult<RootZoneResult> {
    let p = build_params(&params, connect_to_canopy)?;
    let settings = build_settings(integrator, first_step, euler_substeps)?;

    let rain = contiguous_slice(&rainfall)?.to_vec();
    let n = rain.len();
    let pet = optional_series(&pet, n, "pet")?;
    let wet_canopy = optional_series(&wet_canopy, n, "wet_canopy")?;
    let forcing = ForcingSeries::new(rain, pet, wet_canopy).map_err(to_py_err)?;

    let result = run::run(&p, &settings, &forcing, initial_storage).map_err(to_py_err)?;
    Ok(RootZoneResult::from_timeseries(py, result))
}

/// One step for one unit. `step_index` defaults to 1 so the first-step policy only
/// applies when the caller passes 0 explicitly.
#[pyfunction]
#[pyo3(signature = (
    storage, params, rainfall, pet=0.0, wet_canopy=0.0, step_index=1,
    connect_to_canopy=false, integrator="high-order-adaptive",
    first_step="partition-probe", euler_substeps=1
))]
#[allow(clippy::too_many_arguments)]
fn rootzone_step<'py>(
    py: Python<'py>,
    storage: f64,
    params: PyReadonlyArray1<'py, f64>,
    rainfall: f64,
    pet: f64,
    wet_canopy: f64,
    step_index: u64,
    connect_to_canopy: bool,
    integrator: &str,
    first_step: &str,
    euler_substeps: usize,
) -> PyResult<(f64, Bound<'py, PyDict>)> {
    let p = build_params(&params, connect_to_canopy)?;
    let settings = build_settings(integrator, first_step, euler_substeps)?;
    let inputs = StepInputs::new(rainfall, pet, wet_canopy);

    let (new_storage, outputs) = run::step_unit(storage, &p, &settings, &inputs, step_index)
        .map_err(|fault| to_py_err(fault.at(run::SINGLE_UNIT, step_index)))?;

    let dict = outputs_to_dict!(
        py, outputs,
        actual_input, storage, root_uptake, actual_et, drainage, quick_flow, alpha,
    );
    Ok((new_storage, dict))
}

// ---------------------------------------------------------------------------
// Multi-unit stepper
// ---------------------------------------------------------------------------

/// Multi-unit root-zone simulation keyed by integer unit IDs.
#[pyclass]
pub struct Simulation {
    model: RootZoneModel,
}

#[pymethods]
impl Simulation {
    #[new]
    #[pyo3(signature = (
        params, connect_to_canopy=false, integrator="high-order-adaptive",
        first_step="partition-probe", euler_substeps=1
    ))]
    fn new(
        params: PyReadonlyArray1<'_, f64>,
        connect_to_canopy: bool,
        integrator: &str,
        first_step: &str,
        euler_substeps: usize,
    ) -> PyResult<Self> {
        let p = build_params(&params, connect_to_canopy)?;
        let settings = build_settings(integrator, first_step, euler_substeps)?;
        let model = RootZoneModel::with_settings(p, settings).map_err(to_py_err)?;
        Ok(Self { model })
    }

    /// Build from a JSON configuration file.
    #[staticmethod]
    fn from_config(path: &str) -> PyResult<Self> {
        let model = RunConfig::from_file(path)
            .and_then(|cfg| cfg.build_model())
            .map_err(to_py_err)?;
        Ok(Self { model })
    }

    /// Advance every unit in `rainfall` by one step.
    ///
    /// Returns `(outputs, failures)`: outputs maps unit IDs to step outputs, failures
    /// lists `(unit, message)` for units whose storage was left unchanged. With
    /// `strict=True` the first failure is raised instead.
    #[pyo3(signature = (rainfall, pet=None, wet_canopy=None, strict=false))]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        rainfall: BTreeMap<UnitId, f64>,
        pet: Option<BTreeMap<UnitId, f64>>,
        wet_canopy: Option<BTreeMap<UnitId, f64>>,
        strict: bool,
    ) -> PyResult<(Bound<'py, PyDict>, Vec<(UnitId, String)>)> {
        let forcing = StepForcing {
            rainfall,
            pet,
            wet_canopy,
        };
        let report = self.model.step(&forcing);

        if strict {
            if let Some(err) = report.failures.first() {
                return Err(to_py_err(err.clone()));
            }
        }

        let outputs = PyDict::new(py);
        for (id, out) in &report.outputs {
            outputs.set_item(*id, Py::new(py, RootZoneStepOutputs::from_outputs(out))?)?;
        }
        let failures = report
            .failures
            .iter()
            .filter_map(|err| err.unit().map(|id| (id, err.to_string())))
            .collect();
        Ok((outputs, failures))
    }

    fn storage(&self, unit: UnitId) -> Option<f64> {
        self.model.storage(unit)
    }

    fn saturation_degree(&self, unit: UnitId) -> Option<f64> {
        self.model.saturation_degree(unit)
    }

    fn saturation_degrees(&self) -> BTreeMap<UnitId, f64> {
        self.model.saturation_degrees()
    }

    fn seed_storage(&mut self, unit: UnitId, storage: f64) -> PyResult<()> {
        self.model.seed_storage(unit, storage).map_err(to_py_err)
    }

    fn units(&self) -> Vec<UnitId> {
        self.model.units()
    }

    #[getter]
    fn current_step(&self) -> u64 {
        self.model.current_step()
    }
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "rootzone")?;
    m.add_function(wrap_pyfunction!(rootzone_run, &m)?)?;
    m.add_function(wrap_pyfunction!(rootzone_step, &m)?)?;
    m.add_class::<RootZoneResult>()?;
    m.add_class::<RootZoneStepOutputs>()?;
    m.add_class::<Simulation>()?;
    parent.add_submodule(&m)?;
    Ok(())
}
