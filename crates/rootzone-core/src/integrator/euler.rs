//! Forward Euler with a fixed number of equal sub-steps.

use crate::error::NumericalFault;
use crate::ode::OdeSystem;

/// Integrate `system` from `t = 0` to `t = span` in `substeps` equal Euler steps.
pub fn integrate<const N: usize, S: OdeSystem<N>>(
    system: &S,
    y0: [f64; N],
    span: f64,
    substeps: usize,
) -> Result<[f64; N], NumericalFault> {
    if substeps == 0 {
        return Err(NumericalFault::Integration(
            "fixed-step integration needs at least one sub-step".to_string(),
        ));
    }

    let h = span / substeps as f64;
    let mut y = y0;
    let mut dy = [0.0; N];

    for n in 0..substeps {
        let t = n as f64 * h;
        system.derivatives(t, &y, &mut dy);
        for (yi, di) in y.iter_mut().zip(&dy) {
            *yi += h * di;
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(NumericalFault::Integration(format!(
                "non-finite state after Euler sub-step {} of {substeps}",
                n + 1
            )));
        }
    }

    Ok(y)
}
