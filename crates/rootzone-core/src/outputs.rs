//! Per-unit, per-step outputs of the root-zone engine.

use rootzone_macros::Fluxes;

/// Number of fields in [`StepOutputs`].
pub const N_OUTPUTS: usize = 7;

/// Outputs of one unit for one step.
///
/// Depths are mm per step, `quick_flow` is a discharge in m³/s. The diagnostic fluxes
/// (`root_uptake`, `actual_et`, `drainage`) are evaluated on the post-step storage.
#[derive(Debug, Clone, Copy, PartialEq, Fluxes)]
pub struct StepOutputs {
    /// Infiltration into the store, `(1 - alpha) * rainfall`.
    pub actual_input: f64,
    /// Storage at the end of the step.
    pub storage: f64,
    pub root_uptake: f64,
    pub actual_et: f64,
    pub drainage: f64,
    pub quick_flow: f64,
    /// Partition coefficient of the step.
    pub alpha: f64,
}
