//! Orbitfolk Core - Planet Population Simulation Engine
//!
//! A simulation of small people living on the orbits of decaying planets.
//! Each person keeps its distance from its neighbours, dies when its patch
//! of orbit gets too crowded, and now and then asks for a new person to be
//! born. Planets count down a finite lifespan, shrink while doing so and
//! take their whole population with them when they die.
//!
//! # Architecture
//!
//! - **Components**: plain data (agents, planet lifecycle, transforms)
//! - **Systems**: the population step and the event queue
//! - **Planet**: owns an agent arena (`hecs`) and runs one planet's tick
//! - **Engine**: ticks planets in order, routes spawns, drops dead planets
//!
//! Rendering is not part of the core. Planets report agent poses through
//! the [`render::PopulationRenderer`] trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use orbitfolk_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(EngineConfig::default())?;
//!
//! // Generate a home planet and a satellite, three people on each
//! engine.generate(&SystemConfig::default())?;
//!
//! // Run simulation
//! loop {
//!     let report = engine.update(1.0 / 60.0, &mut NullRenderer)?; // 60 FPS
//!     if engine.planet_count() == 0 {
//!         break;
//!     }
//!     let _ = report;
//! }
//! # Ok::<(), SimError>(())
//! ```

pub mod components;
pub mod engine;
pub mod error;
pub mod generation;
pub mod planet;
pub mod render;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{EngineConfig, FrameReport, SimulationEngine, SpawnRoute};
    pub use crate::error::SimError;
    pub use crate::generation::SystemConfig;
    pub use crate::planet::Planet;
    pub use crate::render::{InstanceBuffer, NullRenderer, PopulationRenderer};
    pub use crate::systems::SimEvent;
    pub use orbitfolk_logic::params::{IntegrationMode, ParameterSource, PopulationParams};
}
