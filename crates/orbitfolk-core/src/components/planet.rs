//! Planet-level components: identity, configuration and the decay lifecycle.

use serde::{Deserialize, Serialize};

use super::common::Vec3;

/// Identity of a planet within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetId(pub u32);

impl std::fmt::Display for PlanetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "planet#{}", self.0)
    }
}

/// What starts a planet's countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecayTrigger {
    /// Start dying as soon as the first agent arrives
    #[default]
    FirstAgent,
    /// Only [`Planet::start_dying`](crate::planet::Planet::start_dying) starts it
    Manual,
}

/// Construction parameters for a planet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetConfig {
    pub position: Vec3,
    pub radius: f32,
    pub lifespan_seconds: f32,
    #[serde(default)]
    pub decay_trigger: DecayTrigger,
    /// Seed for this planet's spawn draws; `None` seeds from entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 2.0,
            lifespan_seconds: 60.0,
            decay_trigger: DecayTrigger::FirstAgent,
            seed: None,
        }
    }
}

impl PlanetConfig {
    pub fn new(position: Vec3, radius: f32, lifespan_seconds: f32) -> Self {
        Self {
            position,
            radius,
            lifespan_seconds,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_decay_trigger(mut self, trigger: DecayTrigger) -> Self {
        self.decay_trigger = trigger;
        self
    }
}

/// Lifecycle states of a planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Full size, no countdown running
    Alive,
    /// Countdown running, radius shrinking with elapsed life
    Dying,
    /// Fully shrunk; terminal
    Dead,
}

/// Outcome of advancing a lifecycle by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    /// Nothing to report
    Steady,
    /// Elapsed life reached 1 on this tick
    Expired,
}

/// Countdown and radius of a planet.
///
/// `elapsed` runs from 0 (countdown just started) to 1 (dead).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lifecycle {
    pub state: LifecycleState,
    pub lifespan_seconds: f32,
    pub elapsed: f32,
    pub start_radius: f32,
    pub radius: f32,
}

impl Lifecycle {
    pub fn new(start_radius: f32, lifespan_seconds: f32) -> Self {
        Self {
            state: LifecycleState::Alive,
            lifespan_seconds,
            elapsed: 0.0,
            start_radius,
            radius: start_radius,
        }
    }

    /// `Alive → Dying`. No effect in any other state.
    pub fn start_dying(&mut self) -> bool {
        if self.state == LifecycleState::Alive {
            self.state = LifecycleState::Dying;
            true
        } else {
            false
        }
    }

    /// Advance the countdown by `delta_seconds` and recompute the radius.
    ///
    /// Returns [`LifecycleStep::Expired`] exactly once, on the tick where
    /// elapsed life first reaches 1. The caller moves the state to `Dead`
    /// once it has cleared the population.
    pub fn advance(&mut self, delta_seconds: f32) -> LifecycleStep {
        if self.state != LifecycleState::Dying {
            return LifecycleStep::Steady;
        }
        let last = self.elapsed;
        self.elapsed = (self.elapsed + delta_seconds / self.lifespan_seconds).min(1.0);
        self.radius = (1.0 - self.elapsed) * self.start_radius;
        if self.elapsed >= 1.0 && last < 1.0 {
            LifecycleStep::Expired
        } else {
            LifecycleStep::Steady
        }
    }

    /// Rewind the countdown to zero at full radius, keeping the state.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.radius = self.start_radius;
    }

    pub fn mark_dead(&mut self) {
        self.state = LifecycleState::Dead;
    }

    pub fn is_dead(&self) -> bool {
        self.state == LifecycleState::Dead
    }
}
