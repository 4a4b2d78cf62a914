//! Simulation engine - main entry point for running the simulation

use std::collections::HashMap;

use log::{debug, info, warn};
use orbitfolk_logic::params::{IntegrationMode, ParameterSource, PopulationParams};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::error::SimError;
use crate::generation::{generate_system, SystemConfig};
use crate::planet::Planet;
use crate::render::PopulationRenderer;
use crate::systems::SimEvent;

/// Where a planet's spawn requests are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpawnRoute {
    /// Self-replication: the new agent appears on the requesting planet
    #[default]
    SamePlanet,
    /// Migration: the new agent appears on another planet
    Planet(PlanetId),
    /// Requests are ignored
    Discard,
}

/// Engine-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on live agents across all planets (render slots)
    pub population_capacity: usize,
    pub integration: IntegrationMode,
    /// Seeds every planet that has no seed of its own
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population_capacity: 1000,
            integration: IntegrationMode::FixedStep,
            seed: None,
        }
    }
}

/// Everything that happened during one `update`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameReport {
    /// Simulation time after the frame, in seconds
    pub sim_time: f64,
    /// Events from every planet, in planet order then emission order
    pub events: Vec<SimEvent>,
    pub agents_spawned: usize,
    pub spawns_dropped: usize,
    pub planets_removed: Vec<PlanetId>,
    pub restarted: bool,
}

impl FrameReport {
    pub fn deaths(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::AgentDied { .. }))
            .count()
    }

    pub fn spawn_requests(&self) -> usize {
        self.events.iter().filter(|e| e.is_spawn_request()).count()
    }
}

/// Main simulation engine
pub struct SimulationEngine {
    /// Live planets in creation order
    planets: Vec<Planet>,
    routes: HashMap<PlanetId, SpawnRoute>,
    params: ParameterSource,
    config: EngineConfig,
    seed_rng: ChaCha8Rng,
    next_planet_id: u32,
    /// Simulation time in seconds since start
    sim_time: f64,
    time_scale: f32,
}

impl SimulationEngine {
    /// Create an empty simulation with default tunables
    pub fn new(config: EngineConfig) -> Result<Self, SimError> {
        Self::with_params(config, PopulationParams::default())
    }

    pub fn with_params(config: EngineConfig, params: PopulationParams) -> Result<Self, SimError> {
        config.integration.validate()?;
        let seed_rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            planets: Vec::new(),
            routes: HashMap::new(),
            params: ParameterSource::new(params)?,
            config,
            seed_rng,
            next_planet_id: 0,
            sim_time: 0.0,
            time_scale: 1.0,
        })
    }

    /// Generate a planetary system and seed its populations
    pub fn generate(&mut self, system: &SystemConfig) -> Result<Vec<PlanetId>, SimError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed_rng.gen());
        let layout = generate_system(system, &mut rng);

        let mut ids = Vec::with_capacity(layout.len());
        for planned in layout {
            let id = self.add_planet(planned.config)?;
            for angle in planned.initial_angles {
                self.add_agent(id, angle)?;
            }
            ids.push(id);
        }

        if system.migrate_to_home && ids.len() > 1 {
            let home = ids[0];
            for &id in &ids[1..] {
                self.set_spawn_route(id, SpawnRoute::Planet(home))?;
            }
        }

        info!(
            "Generated system: {} planets, {} agents",
            ids.len(),
            self.agent_count()
        );
        Ok(ids)
    }

    /// Add a planet; it is ticked after every planet added before it
    pub fn add_planet(&mut self, mut config: PlanetConfig) -> Result<PlanetId, SimError> {
        let id = PlanetId(self.next_planet_id);
        if config.seed.is_none() && self.config.seed.is_some() {
            config.seed = Some(self.seed_rng.gen());
        }
        let planet = Planet::new(id, &config)?;
        self.next_planet_id += 1;
        self.planets.push(planet);
        self.routes.insert(id, SpawnRoute::SamePlanet);
        Ok(id)
    }

    /// Place an agent directly on a planet (outside of spawn routing)
    pub fn add_agent(&mut self, planet: PlanetId, angle: f32) -> Result<AgentId, SimError> {
        self.planet_mut(planet)?.add_agent(angle)
    }

    /// Choose where `from`'s spawn requests go
    pub fn set_spawn_route(&mut self, from: PlanetId, route: SpawnRoute) -> Result<(), SimError> {
        self.planet(from)?;
        if let SpawnRoute::Planet(target) = route {
            self.planet(target)?;
        }
        self.routes.insert(from, route);
        Ok(())
    }

    pub fn spawn_route(&self, from: PlanetId) -> Option<SpawnRoute> {
        self.routes.get(&from).copied()
    }

    /// Tunables as seen by the next frame
    pub fn params(&self) -> PopulationParams {
        self.params.snapshot()
    }

    /// Parameter source for external tuning between frames
    pub fn params_mut(&mut self) -> &mut ParameterSource {
        &mut self.params
    }

    /// Restart every live planet now, between frames.
    ///
    /// Restart spawn requests stay queued on each planet and are routed
    /// at the end of the next `update`.
    pub fn restart(&mut self) -> Result<(), SimError> {
        let params = self.params.snapshot();
        for planet in self.planets.iter_mut().filter(|p| !p.is_dead()) {
            planet.restart(&params)?;
        }
        Ok(())
    }

    /// Update the simulation by delta_seconds.
    ///
    /// Only live planets are ticked. Events are drained from every planet
    /// once all ticks have succeeded, so a failed frame leaves them queued
    /// for the next one and does not advance the clock.
    pub fn update(
        &mut self,
        delta_seconds: f32,
        renderer: &mut dyn PopulationRenderer,
    ) -> Result<FrameReport, SimError> {
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Err(SimError::InvalidDelta(delta_seconds));
        }
        let scaled_delta = delta_seconds * self.time_scale;
        let frame_time = self.sim_time + scaled_delta as f64;

        let mut report = FrameReport {
            sim_time: frame_time,
            ..Default::default()
        };

        if self.params.take_restart_request() {
            self.restart()?;
            report.restarted = true;
        }

        // One snapshot of the tunables for the whole frame
        let params = self.params.snapshot();
        let integration = self.config.integration;

        for planet in self.planets.iter_mut().filter(|p| !p.is_dead()) {
            planet.tick(frame_time, scaled_delta, &params, integration, renderer)?;
        }
        self.sim_time = frame_time;

        for planet in &mut self.planets {
            report.events.extend(planet.drain_events());
        }

        self.route_spawns(&mut report)?;

        let mut removed = Vec::new();
        self.planets.retain(|planet| {
            if planet.is_dead() {
                removed.push(planet.id());
                false
            } else {
                true
            }
        });
        for id in &removed {
            self.routes.remove(id);
            info!("Removed dead {}", id);
        }
        report.planets_removed = removed;

        debug!(
            "Frame t={:.3}s: {} events, {} spawned, {} dropped",
            self.sim_time,
            report.events.len(),
            report.agents_spawned,
            report.spawns_dropped
        );
        Ok(report)
    }

    fn route_spawns(&mut self, report: &mut FrameReport) -> Result<(), SimError> {
        let requests: Vec<(PlanetId, f32)> = report
            .events
            .iter()
            .filter_map(|event| match *event {
                SimEvent::SpawnRequested {
                    planet,
                    suggested_angle,
                } => Some((planet, suggested_angle)),
                _ => None,
            })
            .collect();

        for (source, angle) in requests {
            let target = match self.routes.get(&source).copied().unwrap_or_default() {
                SpawnRoute::SamePlanet => source,
                SpawnRoute::Planet(target) => target,
                SpawnRoute::Discard => {
                    report.spawns_dropped += 1;
                    continue;
                }
            };

            if self.agent_count() >= self.config.population_capacity {
                debug!("Spawn from {} dropped: population at capacity", source);
                report.spawns_dropped += 1;
                continue;
            }

            match self.planets.iter_mut().find(|p| p.id() == target) {
                Some(planet) if !planet.is_dead() => {
                    planet.add_agent(angle)?;
                    report.agents_spawned += 1;
                }
                Some(_) => {
                    debug!("Spawn from {} dropped: {} is dead", source, target);
                    report.spawns_dropped += 1;
                }
                None => {
                    warn!("Spawn from {} targets missing {}", source, target);
                    report.spawns_dropped += 1;
                }
            }
        }
        Ok(())
    }

    pub fn planet(&self, id: PlanetId) -> Result<&Planet, SimError> {
        self.planets
            .iter()
            .find(|p| p.id() == id)
            .ok_or(SimError::UnknownPlanet(id))
    }

    pub fn planet_mut(&mut self, id: PlanetId) -> Result<&mut Planet, SimError> {
        self.planets
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(SimError::UnknownPlanet(id))
    }

    /// Live planets in tick order
    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.planets.iter()
    }

    pub fn planet_ids(&self) -> Vec<PlanetId> {
        self.planets.iter().map(|p| p.id()).collect()
    }

    pub fn planet_count(&self) -> usize {
        self.planets.len()
    }

    /// Count agents across all planets
    pub fn agent_count(&self) -> usize {
        self.planets.iter().map(|p| p.population()).sum()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    /// Get current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Get current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self {
            planets: Vec::new(),
            routes: HashMap::new(),
            params: ParameterSource::default(),
            config: EngineConfig::default(),
            seed_rng: ChaCha8Rng::from_entropy(),
            next_planet_id: 0,
            sim_time: 0.0,
            time_scale: 1.0,
        }
    }
}
