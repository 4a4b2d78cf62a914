//! Lifecycle events emitted by planets during a tick.
//!
//! Planets never call out to handlers while ticking. They append to an
//! [`EventQueue`] which the engine drains once the tick has returned, so
//! handlers can never re-enter a planet mid-tick and the order of events is
//! exactly the order in which they happened.

use serde::{Deserialize, Serialize};

use crate::components::{AgentId, PlanetId};

/// Something a planet reports to its orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// An agent was removed from `planet`, by crowding or by the planet dying
    AgentDied {
        planet: PlanetId,
        agent: AgentId,
        last_angle: f32,
    },
    /// The planet's countdown finished; fired once, after its agents died
    PlanetDied { planet: PlanetId },
    /// `planet` asks for a new agent near `suggested_angle`; the engine's
    /// spawn route decides which planet actually receives it
    SpawnRequested {
        planet: PlanetId,
        suggested_angle: f32,
    },
}

impl SimEvent {
    /// The planet that emitted this event
    pub fn planet(&self) -> PlanetId {
        match *self {
            SimEvent::AgentDied { planet, .. }
            | SimEvent::PlanetDied { planet }
            | SimEvent::SpawnRequested { planet, .. } => planet,
        }
    }

    pub fn is_spawn_request(&self) -> bool {
        matches!(self, SimEvent::SpawnRequested { .. })
    }
}

/// Ordered buffer of pending events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.events
    }
}
