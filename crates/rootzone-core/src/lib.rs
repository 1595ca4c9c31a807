/// rootzone: root-zone soil-moisture water balance in Rust.
///
/// Partitions rainfall into infiltration and quick flow with a probability-distributed
/// store, integrates the storage equation per spatial unit and step, and reports the
/// diagnostic fluxes (actual ET, root uptake, drainage).
pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod forcing;
pub mod integrator;
pub mod ode;
pub mod outputs;
pub mod params;
pub mod processes;
pub mod run;
pub mod state;
pub mod traits;

/// Stable identifier of a spatial unit.
pub type UnitId = i64;

pub use config::RunConfig;
pub use error::RootZoneError;
pub use forcing::{ForcingSeries, StepForcing, StepInputs};
pub use integrator::{AdaptiveSettings, Integrator, IntegratorChoice};
pub use outputs::{StepOutputs, StepOutputsTimeseries};
pub use params::Parameters;
pub use run::{FirstStepPolicy, RootZoneModel, StepReport, StepSettings};
