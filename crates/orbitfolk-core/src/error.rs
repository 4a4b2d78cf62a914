//! Error types for the simulation core.

use orbitfolk_logic::params::ParamError;
use thiserror::Error;

use crate::components::PlanetId;

/// Errors raised by planets and the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Operation attempted on a planet that has already died
    #[error("{planet} is dead and cannot {operation}")]
    InvalidState {
        planet: PlanetId,
        operation: &'static str,
    },

    /// Internal bookkeeping is inconsistent; the simulation cannot continue
    #[error("invariant violated on {planet}: {detail}")]
    InvariantViolation { planet: PlanetId, detail: String },

    #[error("no planet with id {0}")]
    UnknownPlanet(PlanetId),

    #[error("delta time must be finite and >= 0, got {0}")]
    InvalidDelta(f32),

    #[error("invalid configuration: {0}")]
    Config(#[from] ParamError),
}

impl SimError {
    /// Whether this error leaves the simulation in an unusable state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SimError::InvariantViolation { .. })
    }
}
