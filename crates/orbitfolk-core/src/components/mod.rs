//! Component definitions for the simulation.
//!
//! Components are plain data. Agents live as entities in a planet's
//! arena; the planet components describe the host body itself.

mod agent;
mod common;
mod planet;

pub use agent::*;
pub use common::*;
pub use planet::*;
