//! Planet - a decaying body that owns a population of orbiting agents
//!
//! Agents live in a per-planet `hecs` arena, so an [`AgentId`] is a stable
//! arena handle rather than a pointer. Each tick the planet advances its
//! lifecycle, runs the population step against a snapshot of its agents and
//! queues any [`SimEvent`]s for the engine to drain afterwards.

use hecs::World;
use log::{debug, info};
use orbitfolk_logic::params::{require_positive, IntegrationMode, PopulationParams};
use orbitfolk_logic::repulsion::ORBIT_OFFSET;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

use crate::components::*;
use crate::error::SimError;
use crate::render::PopulationRenderer;
use crate::systems::{commit_updates, compute_updates, snapshot_agents, EventQueue, SimEvent};

/// A planet and everything living on it
pub struct Planet {
    id: PlanetId,
    center: Vec3,
    lifecycle: Lifecycle,
    decay_trigger: DecayTrigger,
    agents: World,
    rng: ChaCha8Rng,
    events: EventQueue,
}

impl Planet {
    /// Create a planet from its configuration.
    ///
    /// The radius and lifespan must be finite and positive.
    pub fn new(id: PlanetId, config: &PlanetConfig) -> Result<Self, SimError> {
        let radius = require_positive("radius", config.radius)?;
        let lifespan = require_positive("lifespan_seconds", config.lifespan_seconds)?;
        if !config.position.is_finite() {
            return Err(SimError::InvariantViolation {
                planet: id,
                detail: format!("non-finite position {:?}", config.position),
            });
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            id,
            center: config.position,
            lifecycle: Lifecycle::new(radius, lifespan),
            decay_trigger: config.decay_trigger,
            agents: World::new(),
            rng,
            events: EventQueue::new(),
        })
    }

    pub fn id(&self) -> PlanetId {
        self.id
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Current (animated) radius
    pub fn radius(&self) -> f32 {
        self.lifecycle.radius
    }

    pub fn start_radius(&self) -> f32 {
        self.lifecycle.start_radius
    }

    pub fn lifespan_seconds(&self) -> f32 {
        self.lifecycle.lifespan_seconds
    }

    /// 0 when the countdown starts, 1 when the planet is dead
    pub fn elapsed_life_fraction(&self) -> f32 {
        self.lifecycle.elapsed
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state
    }

    pub fn is_dead(&self) -> bool {
        self.lifecycle.is_dead()
    }

    pub fn population(&self) -> usize {
        self.agents.len() as usize
    }

    /// Every agent with its angle, in slot order
    pub fn agents(&self) -> Vec<(AgentId, f32)> {
        snapshot_agents(&self.agents)
            .into_iter()
            .map(|s| (AgentId::from_entity(s.entity), s.angle))
            .collect()
    }

    pub fn agent_angle(&self, agent: AgentId) -> Option<f32> {
        let entity = agent.to_entity()?;
        self.agents.get::<&Agent>(entity).ok().map(|a| a.angle)
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        agent
            .to_entity()
            .map(|e| self.agents.contains(e))
            .unwrap_or(false)
    }

    /// World-space pose of an agent at the planet's current radius
    pub fn agent_transform(&self, agent: AgentId) -> Option<Transform> {
        let entity = agent.to_entity()?;
        let agent = self.agents.get::<&Agent>(entity).ok()?;
        Some(agent.transform(self.center, self.lifecycle.radius))
    }

    /// Events queued since the last drain
    pub fn pending_events(&self) -> &[SimEvent] {
        self.events.pending()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Start the countdown (`Alive → Dying`). Returns whether it started now.
    pub fn start_dying(&mut self) -> Result<bool, SimError> {
        self.ensure_live("start dying")?;
        Ok(self.lifecycle.start_dying())
    }

    /// Place a new agent at `angle` (wrapped into `[0, 2π)`).
    pub fn add_agent(&mut self, angle: f32) -> Result<AgentId, SimError> {
        self.ensure_live("add agents")?;
        if !angle.is_finite() {
            return Err(self.violation(format!("non-finite agent angle {}", angle)));
        }
        if self.decay_trigger == DecayTrigger::FirstAgent {
            self.lifecycle.start_dying();
        }
        let entity = self.agents.spawn((Agent::new(angle),));
        Ok(AgentId::from_entity(entity))
    }

    /// Remove an agent and queue its death. Returns its last angle.
    ///
    /// Killing an agent that is not here means it was processed twice,
    /// which is reported as an invariant violation.
    pub fn kill(&mut self, agent: AgentId) -> Result<f32, SimError> {
        let entity = agent
            .to_entity()
            .ok_or_else(|| self.violation(format!("malformed id {}", agent)))?;
        let last_angle = self
            .agents
            .get::<&Agent>(entity)
            .map(|a| a.angle)
            .map_err(|_| self.violation(format!("{} is not in the population", agent)))?;
        self.agents
            .despawn(entity)
            .map_err(|_| self.violation(format!("{} vanished during removal", agent)))?;
        self.events.push(SimEvent::AgentDied {
            planet: self.id,
            agent,
            last_angle,
        });
        Ok(last_angle)
    }

    /// Kill every agent, in slot order. Returns how many died.
    pub fn kill_all(&mut self) -> Result<usize, SimError> {
        let ids: Vec<AgentId> = self.agents().into_iter().map(|(id, _)| id).collect();
        for &id in &ids {
            self.kill(id)?;
        }
        Ok(ids.len())
    }

    /// Kill everyone, rewind the countdown and queue
    /// `restart_spawn_count` spawn requests at random angles.
    ///
    /// Runs to completion between ticks; the queued requests are routed by
    /// the engine with the next drain.
    pub fn restart(&mut self, params: &PopulationParams) -> Result<(), SimError> {
        self.ensure_live("restart")?;
        let killed = self.kill_all()?;
        self.lifecycle.reset();
        for _ in 0..params.restart_spawn_count {
            let suggested_angle = self.rng.gen_range(0.0..TAU);
            self.events.push(SimEvent::SpawnRequested {
                planet: self.id,
                suggested_angle,
            });
        }
        info!(
            "{} restarted: {} agents cleared, {} spawns requested",
            self.id, killed, params.restart_spawn_count
        );
        Ok(())
    }

    /// Advance the planet by one frame.
    ///
    /// A zero `delta_seconds` neither advances the lifecycle nor moves any
    /// agent, but still runs the crowding check and draws the spawn sample
    /// for every agent.
    pub fn tick(
        &mut self,
        time_seconds: f64,
        delta_seconds: f32,
        params: &PopulationParams,
        integration: IntegrationMode,
        renderer: &mut dyn PopulationRenderer,
    ) -> Result<(), SimError> {
        self.ensure_live("tick")?;
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Err(SimError::InvalidDelta(delta_seconds));
        }

        if self.lifecycle.advance(delta_seconds) == LifecycleStep::Expired {
            let killed = self.kill_all()?;
            self.events.push(SimEvent::PlanetDied { planet: self.id });
            self.lifecycle.mark_dead();
            info!(
                "{} died at t={:.2}s taking {} agents with it",
                self.id, time_seconds, killed
            );
            return Ok(());
        }

        let radius = self.lifecycle.radius;
        if !radius.is_finite() {
            return Err(self.violation(format!("non-finite radius {}", radius)));
        }

        let snapshot = snapshot_agents(&self.agents);
        let updates = compute_updates(
            &snapshot,
            radius + ORBIT_OFFSET,
            params,
            integration.step_scale(delta_seconds),
        );
        commit_updates(&mut self.agents, &updates)
            .map_err(|entity| self.violation(format!("non-finite angle for entity {:?}", entity)))?;

        let mut deaths = 0;
        let mut spawns = 0;
        for update in &updates {
            let agent = AgentId::from_entity(update.entity);
            if update.is_overcrowded(params) {
                self.kill(agent)?;
                deaths += 1;
                continue;
            }

            if self.rng.gen::<f32>() < params.spawn_probability_per_tick {
                self.events.push(SimEvent::SpawnRequested {
                    planet: self.id,
                    suggested_angle: update.new_angle,
                });
                spawns += 1;
            }

            let pose = Agent::new(update.new_angle).transform(self.center, radius);
            renderer.on_agent_transform(self.id, agent, pose.position, pose.orientation);
        }

        if deaths > 0 || spawns > 0 {
            debug!(
                "{} tick: {} agents, {} overcrowded, {} spawn requests",
                self.id,
                updates.len(),
                deaths,
                spawns
            );
        }
        Ok(())
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), SimError> {
        if self.lifecycle.is_dead() {
            Err(SimError::InvalidState {
                planet: self.id,
                operation,
            })
        } else {
            Ok(())
        }
    }

    fn violation(&self, detail: String) -> SimError {
        SimError::InvariantViolation {
            planet: self.id,
            detail,
        }
    }
}

impl std::fmt::Debug for Planet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planet")
            .field("id", &self.id)
            .field("center", &self.center)
            .field("lifecycle", &self.lifecycle)
            .field("population", &self.agents.len())
            .field("pending_events", &self.events.pending().len())
            .finish()
    }
}
