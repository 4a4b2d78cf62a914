//! Tunable population parameters and the parameter source that owns them.
//!
//! The four knobs are process-wide and read by every planet each tick. They
//! are only ever changed between frames, through [`ParameterSource`], which
//! rejects out-of-range values so a bad value never reaches a tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a tunable is set outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("minimum separation distance must be finite and > 0, got {0}")]
    MinimumSeparation(f32),
    #[error("spawn probability per tick must be in [0, 1), got {0}")]
    SpawnProbability(f32),
    #[error("reference fps must be finite and > 0, got {0}")]
    ReferenceFps(f32),
    #[error("{field} must be finite and > 0, got {value}")]
    NonPositive { field: &'static str, value: f32 },
}

/// Snapshot of the shared population tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationParams {
    /// Planar (Manhattan) distance under which another agent counts as close.
    pub minimum_separation_distance: f32,
    /// An agent dies when strictly more than this many neighbours are close.
    pub neighbour_overcrowding_limit: u32,
    /// Chance per agent per tick of requesting a spawn.
    pub spawn_probability_per_tick: f32,
    /// Spawn requests fired by a planet restart.
    pub restart_spawn_count: u32,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            minimum_separation_distance: 1.0,
            neighbour_overcrowding_limit: 10,
            spawn_probability_per_tick: 0.005,
            restart_spawn_count: 3,
        }
    }
}

impl PopulationParams {
    /// Check every knob against its valid range.
    pub fn validate(&self) -> Result<(), ParamError> {
        check_separation(self.minimum_separation_distance)?;
        check_probability(self.spawn_probability_per_tick)?;
        Ok(())
    }
}

fn check_separation(value: f32) -> Result<(), ParamError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParamError::MinimumSeparation(value))
    }
}

fn check_probability(value: f32) -> Result<(), ParamError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ParamError::SpawnProbability(value))
    }
}

/// Validated holder of the tunables plus the restart trigger.
///
/// An on-screen panel or a config file writes through the setters; the
/// engine copies a [`PopulationParams`] snapshot out once per frame.
#[derive(Debug, Clone, Default)]
pub struct ParameterSource {
    params: PopulationParams,
    restart_requested: bool,
}

impl ParameterSource {
    pub fn new(params: PopulationParams) -> Result<Self, ParamError> {
        params.validate()?;
        Ok(Self {
            params,
            restart_requested: false,
        })
    }

    /// Copy of the current tunables.
    pub fn snapshot(&self) -> PopulationParams {
        self.params
    }

    /// Replace all tunables at once. Nothing changes if any value is invalid.
    pub fn replace(&mut self, params: PopulationParams) -> Result<(), ParamError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn set_minimum_separation_distance(&mut self, value: f32) -> Result<(), ParamError> {
        check_separation(value)?;
        self.params.minimum_separation_distance = value;
        Ok(())
    }

    pub fn set_neighbour_overcrowding_limit(&mut self, value: u32) {
        self.params.neighbour_overcrowding_limit = value;
    }

    pub fn set_spawn_probability_per_tick(&mut self, value: f32) -> Result<(), ParamError> {
        check_probability(value)?;
        self.params.spawn_probability_per_tick = value;
        Ok(())
    }

    pub fn set_restart_spawn_count(&mut self, value: u32) {
        self.params.restart_spawn_count = value;
    }

    /// Ask for every live planet to be restarted before the next frame.
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    /// Consume a pending restart request.
    pub fn take_restart_request(&mut self) -> bool {
        std::mem::take(&mut self.restart_requested)
    }
}

/// How the per-tick angular step relates to frame time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum IntegrationMode {
    /// Fixed step per tick regardless of `delta_seconds`.
    #[default]
    FixedStep,
    /// Step scaled by `delta_seconds * reference_fps`, so a run at
    /// `reference_fps` matches `FixedStep`.
    DeltaScaled { reference_fps: f32 },
}

impl IntegrationMode {
    pub fn validate(&self) -> Result<(), ParamError> {
        match *self {
            IntegrationMode::FixedStep => Ok(()),
            IntegrationMode::DeltaScaled { reference_fps } => {
                if reference_fps.is_finite() && reference_fps > 0.0 {
                    Ok(())
                } else {
                    Err(ParamError::ReferenceFps(reference_fps))
                }
            }
        }
    }

    /// Multiplier applied to the base step for a tick of `delta_seconds`.
    ///
    /// A zero-length tick never moves anyone, whatever the mode.
    pub fn step_scale(&self, delta_seconds: f32) -> f32 {
        if delta_seconds <= 0.0 {
            return 0.0;
        }
        match *self {
            IntegrationMode::FixedStep => 1.0,
            IntegrationMode::DeltaScaled { reference_fps } => delta_seconds * reference_fps,
        }
    }
}

/// Require a strictly positive finite value for a named field.
pub fn require_positive(field: &'static str, value: f32) -> Result<f32, ParamError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParamError::NonPositive { field, value })
    }
}
