//! Continuous-time mass balance of the root-zone store over one step.
//!
//! The state vector is `[S, Smax]`: the storage evolves, the capacity rides along
//! as the fixed reference bound read by the evaporation term.

use crate::params::Parameters;
use crate::processes;

/// Number of state components carried by [`RootZoneOde`].
pub const ODE_DIM: usize = 2;

/// A first-order system `dy/dt = f(t, y)` with a fixed dimension.
pub trait OdeSystem<const N: usize> {
    /// Write the derivatives at `(t, y)` into `dy`.
    fn derivatives(&self, t: f64, y: &[f64; N], dy: &mut [f64; N]);
}

/// Root-zone storage equation for one unit and one step:
///
/// `dS/dt = J - AET(S, ETnet) - D(S)`
///
/// with `J` the infiltration delivered by the partition and the loss terms taking the
/// same forms as the post-step diagnostics, evaluated at the instantaneous storage.
/// Root uptake is not a loss term here; it only appears as a diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct RootZoneOde {
    pub infiltration: f64,
    pub net_pet: f64,
    pub drainage_rate: f64,
    pub drainage_exponent: f64,
}

impl RootZoneOde {
    pub fn new(infiltration: f64, net_pet: f64, params: &Parameters) -> Self {
        Self {
            infiltration,
            net_pet,
            drainage_rate: params.drainage_rate,
            drainage_exponent: params.drainage_exponent,
        }
    }

    /// Initial state vector for a step starting at `storage`.
    pub fn initial_state(storage: f64, max_storage: f64) -> [f64; ODE_DIM] {
        [storage, max_storage]
    }

    /// Instantaneous rate of change of storage.
    pub fn storage_rate(&self, storage: f64, max_storage: f64) -> f64 {
        self.infiltration
            - processes::actual_et(storage, self.net_pet, max_storage)
            - processes::drainage(storage, self.drainage_rate, self.drainage_exponent)
    }
}

impl OdeSystem<ODE_DIM> for RootZoneOde {
    fn derivatives(&self, _t: f64, y: &[f64; ODE_DIM], dy: &mut [f64; ODE_DIM]) {
        dy[0] = self.storage_rate(y[0], y[1]);
        dy[1] = 0.0;
    }
}
