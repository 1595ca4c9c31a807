//! Numerical integrators for the storage equation.
//!
//! The integrator is chosen once per run as an [`Integrator`] value and invoked per
//! unit per step. Each call builds its own working arrays, so one `Integrator` can be
//! shared across units and threads.

pub mod dop853;
pub mod euler;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ATOL, DEFAULT_EULER_SUBSTEPS, DEFAULT_MAX_STEPS, DEFAULT_MIN_STEP_FRACTION,
    DEFAULT_RTOL,
};
use crate::error::{NumericalFault, RootZoneError};
use crate::ode::OdeSystem;

/// Named integration methods, as written in configuration files and bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegratorChoice {
    /// Dormand–Prince 8(5,3) with adaptive step control.
    #[serde(alias = "dp853", alias = "dop853")]
    HighOrderAdaptive,
    /// Forward Euler with a fixed number of sub-steps.
    #[serde(alias = "euler", alias = "eulero")]
    FixedStepExplicit,
}

impl IntegratorChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighOrderAdaptive => "high-order-adaptive",
            Self::FixedStepExplicit => "fixed-step-explicit",
        }
    }
}

impl fmt::Display for IntegratorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegratorChoice {
    type Err = RootZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high-order-adaptive" | "dp853" | "dop853" => Ok(Self::HighOrderAdaptive),
            "fixed-step-explicit" | "euler" | "eulero" => Ok(Self::FixedStepExplicit),
            _ => Err(RootZoneError::config(
                "integrator",
                s,
                "expected 'high-order-adaptive' or 'fixed-step-explicit'",
            )),
        }
    }
}

/// Tolerances and budget of the adaptive integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    pub rtol: f64,
    pub atol: f64,
    /// Upper bound on accepted + rejected sub-steps for one integration.
    pub max_steps: usize,
    /// Smallest admissible sub-step as a fraction of the interval.
    pub min_step_fraction: f64,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
            max_steps: DEFAULT_MAX_STEPS,
            min_step_fraction: DEFAULT_MIN_STEP_FRACTION,
        }
    }
}

/// Integration strategy for one step of the storage equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Integrator {
    HighOrderAdaptive(AdaptiveSettings),
    FixedStepExplicit { substeps: usize },
}

impl Default for Integrator {
    fn default() -> Self {
        Self::HighOrderAdaptive(AdaptiveSettings::default())
    }
}

impl From<IntegratorChoice> for Integrator {
    fn from(choice: IntegratorChoice) -> Self {
        match choice {
            IntegratorChoice::HighOrderAdaptive => {
                Self::HighOrderAdaptive(AdaptiveSettings::default())
            }
            IntegratorChoice::FixedStepExplicit => Self::FixedStepExplicit {
                substeps: DEFAULT_EULER_SUBSTEPS,
            },
        }
    }
}

impl Integrator {
    /// Adaptive DOP853 with default tolerances.
    pub fn high_order() -> Self {
        Self::default()
    }

    /// Forward Euler with `substeps` equal sub-steps.
    pub fn fixed_step(substeps: usize) -> Self {
        Self::FixedStepExplicit { substeps }
    }

    pub fn choice(&self) -> IntegratorChoice {
        match self {
            Self::HighOrderAdaptive(_) => IntegratorChoice::HighOrderAdaptive,
            Self::FixedStepExplicit { .. } => IntegratorChoice::FixedStepExplicit,
        }
    }

    /// Reject tolerances and budgets that cannot produce a result.
    pub fn validate(&self) -> Result<(), RootZoneError> {
        match self {
            Self::HighOrderAdaptive(s) => {
                if !(s.rtol.is_finite() && s.rtol >= 0.0) {
                    return Err(RootZoneError::config("rtol", s.rtol, "must be non-negative"));
                }
                if !(s.atol.is_finite() && s.atol >= 0.0) {
                    return Err(RootZoneError::config("atol", s.atol, "must be non-negative"));
                }
                if s.rtol == 0.0 && s.atol == 0.0 {
                    return Err(RootZoneError::config(
                        "atol",
                        s.atol,
                        "rtol and atol cannot both be zero",
                    ));
                }
                if s.max_steps == 0 {
                    return Err(RootZoneError::config(
                        "max_steps",
                        s.max_steps,
                        "must allow at least one sub-step",
                    ));
                }
                if !(s.min_step_fraction.is_finite()
                    && s.min_step_fraction > 0.0
                    && s.min_step_fraction < 1.0)
                {
                    return Err(RootZoneError::config(
                        "min_step_fraction",
                        s.min_step_fraction,
                        "must lie in (0, 1)",
                    ));
                }
            }
            Self::FixedStepExplicit { substeps } => {
                if *substeps == 0 {
                    return Err(RootZoneError::config(
                        "euler_substeps",
                        substeps,
                        "must be at least 1",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Depth below zero a storage result may reach and still count as an empty store.
    ///
    /// The adaptive method accepts sub-steps whose error is within `atol + rtol * scale`,
    /// so an overshoot within that band is clamped to zero by the caller. The fixed-step
    /// method has no error control: it returns `None` and any overshoot is clamped.
    pub fn empty_store_allowance(&self, scale: f64) -> Option<f64> {
        match self {
            Self::HighOrderAdaptive(s) => Some(s.atol + s.rtol * scale.abs()),
            Self::FixedStepExplicit { .. } => None,
        }
    }

    /// Advance `y0` over `step_length` and return the final state.
    pub fn integrate<const N: usize, S: OdeSystem<N>>(
        &self,
        system: &S,
        y0: [f64; N],
        step_length: f64,
    ) -> Result<[f64; N], NumericalFault> {
        match self {
            Self::HighOrderAdaptive(settings) => {
                let (y, stats) = dop853::integrate(system, y0, step_length, settings)?;
                log::trace!(
                    "dop853: {} accepted, {} rejected, {} evaluations",
                    stats.accepted,
                    stats.rejected,
                    stats.evaluations
                );
                Ok(y)
            }
            Self::FixedStepExplicit { substeps } => {
                euler::integrate(system, y0, step_length, *substeps)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::{RootZoneOde, ODE_DIM};
    use crate::params::Parameters;

    fn test_params() -> Parameters {
        Parameters::new(4.0, 0.33, 0.0, 1.0, 0.000958, 1.83, false, 3.79, 60.0).unwrap()
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!(
            "high-order-adaptive".parse::<IntegratorChoice>().unwrap(),
            IntegratorChoice::HighOrderAdaptive
        );
        assert_eq!(
            "dp853".parse::<IntegratorChoice>().unwrap(),
            IntegratorChoice::HighOrderAdaptive
        );
        assert_eq!(
            "Eulero".parse::<IntegratorChoice>().unwrap(),
            IntegratorChoice::FixedStepExplicit
        );
    }

    #[test]
    fn unknown_name_is_config_error() {
        let err = "rk4".parse::<IntegratorChoice>().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("rk4"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for choice in [
            IntegratorChoice::HighOrderAdaptive,
            IntegratorChoice::FixedStepExplicit,
        ] {
            assert_eq!(choice.to_string().parse::<IntegratorChoice>().unwrap(), choice);
            assert_eq!(Integrator::from(choice).choice(), choice);
        }
    }

    #[test]
    fn serde_names() {
        let c: IntegratorChoice = serde_json::from_str("\"fixed-step-explicit\"").unwrap();
        assert_eq!(c, IntegratorChoice::FixedStepExplicit);
        let c: IntegratorChoice = serde_json::from_str("\"dp853\"").unwrap();
        assert_eq!(c, IntegratorChoice::HighOrderAdaptive);
        assert!(serde_json::from_str::<IntegratorChoice>("\"midpoint\"").is_err());
    }

    #[test]
    fn validate_rejects_degenerate_settings() {
        assert!(Integrator::fixed_step(0).validate().is_err());
        assert!(Integrator::fixed_step(3).validate().is_ok());
        let bad = Integrator::HighOrderAdaptive(AdaptiveSettings {
            rtol: 0.0,
            atol: 0.0,
            ..AdaptiveSettings::default()
        });
        assert!(bad.validate().is_err());
        let bad = Integrator::HighOrderAdaptive(AdaptiveSettings {
            max_steps: 0,
            ..AdaptiveSettings::default()
        });
        assert!(bad.validate().is_err());
        assert!(Integrator::high_order().validate().is_ok());
    }

    #[test]
    fn empty_store_allowance_follows_tolerances() {
        let loose = Integrator::HighOrderAdaptive(AdaptiveSettings {
            rtol: 1e-6,
            atol: 1e-6,
            ..AdaptiveSettings::default()
        });
        assert_eq!(loose.empty_store_allowance(4.0), Some(1e-6 + 4e-6));
        assert!(
            loose.empty_store_allowance(4.0)
                > Integrator::high_order().empty_store_allowance(4.0)
        );
        assert_eq!(Integrator::fixed_step(1).empty_store_allowance(4.0), None);
    }

    #[test]
    fn both_strategies_keep_zero_rhs_unchanged() {
        let p = Parameters {
            drainage_rate: 0.0,
            ..test_params()
        };
        let ode = RootZoneOde::new(0.0, 0.0, &p);
        let y0: [f64; ODE_DIM] = RootZoneOde::initial_state(2.3, p.max_storage);
        for integrator in [
            Integrator::high_order(),
            Integrator::fixed_step(1),
            Integrator::fixed_step(5),
        ] {
            let y = integrator.integrate(&ode, y0, 1.0).unwrap();
            assert_eq!(y, y0, "{:?} moved a stationary state", integrator.choice());
        }
    }

    #[test]
    fn strategies_agree_on_storm_step() {
        let p = test_params();
        let ode = RootZoneOde::new(2.0, 0.0, &p);
        let y0 = RootZoneOde::initial_state(1.99, p.max_storage);
        let hi = Integrator::high_order().integrate(&ode, y0, 1.0).unwrap();
        let lo = Integrator::fixed_step(1).integrate(&ode, y0, 1.0).unwrap();
        assert!((hi[0] - lo[0]).abs() < 1e-2);
        assert_eq!(hi[1], p.max_storage);
        assert_eq!(lo[1], p.max_storage);
    }
}
