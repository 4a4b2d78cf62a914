//! Seam between the simulation and whatever draws the agents.
//!
//! The core never owns render buffers. Each tick a planet hands every
//! surviving agent's pose to a [`PopulationRenderer`]; the renderer decides
//! where it goes. [`InstanceBuffer`] is a ready-made consumer that keeps a
//! fixed number of instance slots keyed by agent identity.

use std::collections::HashMap;

use crate::components::{AgentId, PlanetId, Quat, Transform, Vec3};
use crate::systems::SimEvent;

/// Receives agent poses during a tick
pub trait PopulationRenderer {
    fn on_agent_transform(
        &mut self,
        planet: PlanetId,
        agent: AgentId,
        position: Vec3,
        orientation: Quat,
    );
}

impl<F> PopulationRenderer for F
where
    F: FnMut(PlanetId, AgentId, Vec3, Quat),
{
    fn on_agent_transform(
        &mut self,
        planet: PlanetId,
        agent: AgentId,
        position: Vec3,
        orientation: Quat,
    ) {
        self(planet, agent, position, orientation)
    }
}

/// Renderer that discards everything (headless runs, benchmarks)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl PopulationRenderer for NullRenderer {
    fn on_agent_transform(&mut self, _: PlanetId, _: AgentId, _: Vec3, _: Quat) {}
}

/// Fixed-capacity instance buffer, one slot per live agent.
///
/// Slots are handed out on an agent's first transform and returned when an
/// `AgentDied` event for it is applied. Agents arriving while every slot is
/// taken are counted in `overflowed` and not drawn.
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    slots: Vec<Option<Transform>>,
    owners: HashMap<(PlanetId, AgentId), usize>,
    free: Vec<usize>,
    /// Transforms that found no free slot since the last `clear_stats`
    pub overflowed: usize,
    /// Transforms written since the last `clear_stats`
    pub writes: usize,
}

impl InstanceBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            owners: HashMap::new(),
            // pop() hands out slot 0 first
            free: (0..capacity).rev().collect(),
            overflowed: 0,
            writes: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupied(&self) -> usize {
        self.owners.len()
    }

    pub fn slot_of(&self, planet: PlanetId, agent: AgentId) -> Option<usize> {
        self.owners.get(&(planet, agent)).copied()
    }

    pub fn transform(&self, slot: usize) -> Option<Transform> {
        self.slots.get(slot).copied().flatten()
    }

    /// Release slots of agents that died.
    pub fn apply_events(&mut self, events: &[SimEvent]) {
        for event in events {
            if let SimEvent::AgentDied { planet, agent, .. } = *event {
                if let Some(slot) = self.owners.remove(&(planet, agent)) {
                    self.slots[slot] = None;
                    self.free.push(slot);
                }
            }
        }
    }

    pub fn clear_stats(&mut self) {
        self.overflowed = 0;
        self.writes = 0;
    }
}

impl PopulationRenderer for InstanceBuffer {
    fn on_agent_transform(
        &mut self,
        planet: PlanetId,
        agent: AgentId,
        position: Vec3,
        orientation: Quat,
    ) {
        let slot = match self.owners.get(&(planet, agent)) {
            Some(&slot) => slot,
            None => match self.free.pop() {
                Some(slot) => {
                    self.owners.insert((planet, agent), slot);
                    slot
                }
                None => {
                    self.overflowed += 1;
                    return;
                }
            },
        };
        self.slots[slot] = Some(Transform {
            position,
            orientation,
        });
        self.writes += 1;
    }
}
