//! Error types for the root-zone engine.

use crate::UnitId;

/// Errors raised by configuration, partitioning and integration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RootZoneError {
    /// A parameter or configuration value is invalid. Raised before stepping.
    #[error("invalid configuration '{key}' = {value}: {reason}")]
    Config {
        key: String,
        value: String,
        reason: String,
    },

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    ConfigIo(String),

    /// The configuration file is not valid JSON for [`RunConfig`](crate::config::RunConfig).
    #[error("cannot parse configuration: {0}")]
    ConfigParse(String),

    /// The partition formula or an input left its mathematical domain.
    #[error("numerical domain error for unit {unit} at step {step}: {reason}")]
    NumericalDomain {
        unit: UnitId,
        step: u64,
        reason: String,
    },

    /// The integrator could not advance the storage over the step.
    #[error("integration failed for unit {unit} at step {step}: {reason}")]
    Integration {
        unit: UnitId,
        step: u64,
        reason: String,
    },
}

impl RootZoneError {
    /// Shorthand for an [`RootZoneError::Config`] error.
    pub fn config(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Unit the error is attached to, if any.
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Self::NumericalDomain { unit, .. } | Self::Integration { unit, .. } => Some(*unit),
            _ => None,
        }
    }

    /// Returns `true` for errors raised while building a run.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::ConfigIo(_) | Self::ConfigParse(_)
        )
    }
}

/// Failure kinds produced by pure numerical routines, before a unit and step are known.
///
/// The stepper attaches the unit and step with [`NumericalFault::at`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NumericalFault {
    #[error("domain: {0}")]
    Domain(String),
    #[error("integration: {0}")]
    Integration(String),
}

impl NumericalFault {
    /// Attach the unit and step the fault occurred at.
    pub fn at(self, unit: UnitId, step: u64) -> RootZoneError {
        match self {
            Self::Domain(reason) => RootZoneError::NumericalDomain { unit, step, reason },
            Self::Integration(reason) => RootZoneError::Integration { unit, step, reason },
        }
    }
}
