//! Planetary system generation - a home planet plus satellites

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::components::{PlanetConfig, Vec3};

/// Configuration for system generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Radius of the home planet at the origin
    pub home_radius: f32,
    pub home_lifespan_seconds: f32,
    /// Number of planets besides the home planet
    pub satellite_count: u32,
    /// Distance of satellites from the origin (min, max)
    pub satellite_distance: (f32, f32),
    /// Satellite radius (min, max)
    pub satellite_radius: (f32, f32),
    pub satellite_lifespan_seconds: (f32, f32),
    /// Agents placed on each planet at random angles
    pub agents_per_planet: u32,
    /// Route satellite spawns to the home planet instead of themselves
    pub migrate_to_home: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            home_radius: 2.0,
            home_lifespan_seconds: 90.0,
            satellite_count: 1,
            satellite_distance: (7.0, 9.0),
            satellite_radius: (1.0, 3.0),
            satellite_lifespan_seconds: (45.0, 75.0),
            agents_per_planet: 3,
            migrate_to_home: false,
        }
    }
}

/// A planet to create, with its starting population
#[derive(Debug, Clone)]
pub struct PlannedPlanet {
    pub config: PlanetConfig,
    pub initial_angles: Vec<f32>,
}

/// Lay out the home planet first, then each satellite in a random direction
pub fn generate_system(config: &SystemConfig, rng: &mut impl Rng) -> Vec<PlannedPlanet> {
    let mut planets = Vec::with_capacity(config.satellite_count as usize + 1);

    planets.push(PlannedPlanet {
        config: PlanetConfig::new(Vec3::ZERO, config.home_radius, config.home_lifespan_seconds)
            .with_seed(rng.gen()),
        initial_angles: random_angles(config.agents_per_planet, rng),
    });

    for _ in 0..config.satellite_count {
        let distance = sample(config.satellite_distance, rng);
        let direction = rng.gen_range(0.0..TAU);
        let position = Vec3::new(distance * direction.sin(), distance * direction.cos(), 0.0);
        let radius = sample(config.satellite_radius, rng);
        let lifespan = sample(config.satellite_lifespan_seconds, rng);

        planets.push(PlannedPlanet {
            config: PlanetConfig::new(position, radius, lifespan).with_seed(rng.gen()),
            initial_angles: random_angles(config.agents_per_planet, rng),
        });
    }

    planets
}

fn random_angles(count: u32, rng: &mut impl Rng) -> Vec<f32> {
    (0..count).map(|_| rng.gen_range(0.0..TAU)).collect()
}

/// Uniform sample in `[lo, hi]`, tolerating `lo == hi`
fn sample((lo, hi): (f32, f32), rng: &mut impl Rng) -> f32 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}
