use std::collections::HashSet;
use std::f32::consts::TAU;

use orbitfolk_core::prelude::*;

fn quiet_params() -> PopulationParams {
    PopulationParams {
        spawn_probability_per_tick: 0.0,
        ..Default::default()
    }
}

fn engine_with(params: PopulationParams) -> SimulationEngine {
    let config = EngineConfig {
        seed: Some(0xBEEF),
        ..Default::default()
    };
    SimulationEngine::with_params(config, params).expect("valid engine config")
}

fn planet_config(lifespan: f32) -> PlanetConfig {
    PlanetConfig::new(Vec3::ZERO, 2.0, lifespan).with_seed(3)
}

#[test]
fn planet_dies_on_second_tick_and_kills_everyone_once() {
    let mut engine = engine_with(quiet_params());
    let id = engine.add_planet(planet_config(2.0)).unwrap();
    let agents: Vec<AgentId> = [0.0, 2.0, 4.0]
        .iter()
        .map(|&a| engine.add_agent(id, a).unwrap())
        .collect();

    let first = engine.update(1.0, &mut NullRenderer).unwrap();
    assert!(first.events.is_empty());
    assert_eq!(engine.planet(id).unwrap().elapsed_life_fraction(), 0.5);
    assert_eq!(engine.planet(id).unwrap().state(), LifecycleState::Dying);

    let second = engine.update(1.0, &mut NullRenderer).unwrap();
    let died: Vec<AgentId> = second
        .events
        .iter()
        .filter_map(|e| match *e {
            SimEvent::AgentDied { agent, .. } => Some(agent),
            _ => None,
        })
        .collect();
    let planet_deaths = second
        .events
        .iter()
        .filter(|e| matches!(e, SimEvent::PlanetDied { .. }))
        .count();

    assert_eq!(died.len(), 3);
    let unique: HashSet<AgentId> = died.iter().copied().collect();
    assert_eq!(unique, agents.iter().copied().collect());
    assert_eq!(planet_deaths, 1);
    // planet death comes after its agents
    assert_eq!(second.events.last(), Some(&SimEvent::PlanetDied { planet: id }));
    assert_eq!(second.planets_removed, vec![id]);
    assert_eq!(engine.planet_count(), 0);
    assert!(matches!(engine.planet(id), Err(SimError::UnknownPlanet(_))));

    let third = engine.update(1.0, &mut NullRenderer).unwrap();
    assert!(third.events.is_empty());
}

#[test]
fn dead_planet_reports_invalid_state() {
    let mut planet = Planet::new(PlanetId(0), &planet_config(2.0)).unwrap();
    planet.add_agent(1.0).unwrap();
    let params = quiet_params();
    for _ in 0..2 {
        planet
            .tick(0.0, 1.0, &params, IntegrationMode::FixedStep, &mut NullRenderer)
            .unwrap();
    }
    assert!(planet.is_dead());
    assert_eq!(planet.elapsed_life_fraction(), 1.0);
    assert_eq!(planet.population(), 0);
    let err = planet
        .tick(0.0, 1.0, &params, IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap_err();
    assert!(matches!(err, SimError::InvalidState { .. }));
}

#[test]
fn restart_clears_population_and_requests_seed_spawns() {
    let params = PopulationParams {
        restart_spawn_count: 4,
        ..quiet_params()
    };
    let mut engine = engine_with(params);
    let id = engine.add_planet(planet_config(100.0)).unwrap();
    for angle in [0.5, 1.5, 2.5] {
        engine.add_agent(id, angle).unwrap();
    }
    engine.update(10.0, &mut NullRenderer).unwrap();
    assert!(engine.planet(id).unwrap().elapsed_life_fraction() > 0.0);

    engine.restart().unwrap();
    let planet = engine.planet(id).unwrap();
    assert_eq!(planet.population(), 0);
    assert_eq!(planet.elapsed_life_fraction(), 0.0);
    assert_eq!(planet.radius(), planet.start_radius());
    let pending_spawns = planet
        .pending_events()
        .iter()
        .filter(|e| e.is_spawn_request())
        .count();
    assert_eq!(pending_spawns, 4);

    let report = engine.update(0.0, &mut NullRenderer).unwrap();
    assert_eq!(report.deaths(), 3);
    assert_eq!(report.spawn_requests(), 4);
    assert_eq!(report.agents_spawned, 4);
    assert_eq!(engine.planet(id).unwrap().population(), 4);
}

#[test]
fn planet_killed_outside_update_is_removed_not_ticked() {
    let mut engine = engine_with(quiet_params());
    let short = engine.add_planet(planet_config(1.0)).unwrap();
    let long = engine.add_planet(planet_config(100.0)).unwrap();
    engine.add_agent(short, 0.5).unwrap();
    engine.add_agent(long, 0.5).unwrap();

    engine
        .planet_mut(short)
        .unwrap()
        .tick(0.0, 1.0, &quiet_params(), IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap();
    assert!(engine.planet(short).unwrap().is_dead());

    engine.params_mut().request_restart();
    let report = engine.update(0.016, &mut NullRenderer).unwrap();
    assert!(report.restarted);
    assert_eq!(report.planets_removed, vec![short]);
    assert!(report
        .events
        .contains(&SimEvent::PlanetDied { planet: short }));
    assert_eq!(engine.planet_ids(), vec![long]);

    for _ in 0..3 {
        engine.update(0.016, &mut NullRenderer).unwrap();
    }
    assert_eq!(engine.planet_count(), 1);
}

#[test]
fn restart_trigger_from_parameter_source() {
    let mut engine = engine_with(quiet_params());
    let id = engine.add_planet(planet_config(100.0)).unwrap();
    engine.add_agent(id, 1.0).unwrap();

    engine.params_mut().set_restart_spawn_count(2);
    engine.params_mut().request_restart();
    let report = engine.update(0.5, &mut NullRenderer).unwrap();

    assert!(report.restarted);
    assert_eq!(report.deaths(), 1);
    assert_eq!(report.spawn_requests(), 2);
    assert_eq!(engine.planet(id).unwrap().population(), 2);

    let next = engine.update(0.5, &mut NullRenderer).unwrap();
    assert!(!next.restarted);
}

/// Target at angle 0 with `neighbours` agents packed just around it.
fn crowded_planet(neighbours: u32) -> (Planet, AgentId) {
    let mut planet = Planet::new(PlanetId(0), &planet_config(1000.0)).unwrap();
    let target = planet.add_agent(0.0).unwrap();
    for i in 0..neighbours {
        let offset = 0.02 * (i as f32 + 1.0);
        planet.add_agent(offset).unwrap();
    }
    (planet, target)
}

#[test]
fn overcrowding_kills_above_limit_only() {
    let params = PopulationParams {
        minimum_separation_distance: 1.0,
        neighbour_overcrowding_limit: 3,
        ..quiet_params()
    };

    let (mut at_limit, target) = crowded_planet(3);
    at_limit
        .tick(0.0, 0.016, &params, IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap();
    assert!(at_limit.contains(target));
    assert_eq!(at_limit.population(), 4);

    let (mut over_limit, target) = crowded_planet(4);
    over_limit
        .tick(0.0, 0.016, &params, IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap();
    assert!(!over_limit.contains(target));
    let events = over_limit.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SimEvent::AgentDied { agent, .. } if *agent == target
    )));
}

#[test]
fn coincident_agents_receive_opposite_full_nudges() {
    let mut planet = Planet::new(PlanetId(0), &planet_config(1000.0)).unwrap();
    let a = planet.add_agent(1.0).unwrap();
    let b = planet.add_agent(1.0).unwrap();
    planet
        .tick(0.0, 0.016, &quiet_params(), IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap();

    let angle_a = planet.agent_angle(a).unwrap();
    let angle_b = planet.agent_angle(b).unwrap();
    assert!((angle_a - (1.0 - 0.01)).abs() < 1e-6);
    assert!((angle_b - (1.0 + 0.01)).abs() < 1e-6);
}

#[test]
fn agents_at_wrap_boundary_stay_normalized() {
    let eps = 1e-3;
    let mut planet = Planet::new(PlanetId(0), &planet_config(1000.0)).unwrap();
    let low = planet.add_agent(0.0).unwrap();
    let high = planet.add_agent(TAU - eps).unwrap();

    for _ in 0..30 {
        planet
            .tick(0.0, 0.016, &quiet_params(), IntegrationMode::FixedStep, &mut NullRenderer)
            .unwrap();
        for (_, angle) in planet.agents() {
            assert!((0.0..TAU).contains(&angle), "angle {} escaped", angle);
        }
    }

    // pushed apart across the boundary, the short way
    let low_angle = planet.agent_angle(low).unwrap();
    let high_angle = planet.agent_angle(high).unwrap();
    assert!(low_angle > 0.0 && low_angle < 1.0);
    assert!(high_angle > TAU - 1.0 && high_angle < TAU - eps);
}

#[test]
fn identical_runs_produce_identical_angles() {
    let angles = [0.1, 0.15, 0.18, 1.0, 1.02, 3.3, 6.2];
    let run = || {
        let mut planet = Planet::new(PlanetId(0), &planet_config(1000.0)).unwrap();
        for &a in &angles {
            planet.add_agent(a).unwrap();
        }
        let mut history = Vec::new();
        for dt in [0.016, 0.0, 0.033, 0.016, 0.05] {
            planet
                .tick(0.0, dt, &quiet_params(), IntegrationMode::FixedStep, &mut NullRenderer)
                .unwrap();
            history.push(planet.agents());
        }
        history
    };
    assert_eq!(run(), run());
}

#[test]
fn zero_delta_moves_nobody_but_still_checks_crowding() {
    let mut planet = Planet::new(PlanetId(0), &planet_config(1000.0)).unwrap();
    let a = planet.add_agent(1.0).unwrap();
    let b = planet.add_agent(1.0).unwrap();
    planet
        .tick(0.0, 0.0, &quiet_params(), IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap();
    assert_eq!(planet.agent_angle(a), Some(1.0));
    assert_eq!(planet.agent_angle(b), Some(1.0));

    let params = PopulationParams {
        neighbour_overcrowding_limit: 3,
        ..quiet_params()
    };
    let (mut crowded, target) = crowded_planet(4);
    crowded
        .tick(0.0, 0.0, &params, IntegrationMode::FixedStep, &mut NullRenderer)
        .unwrap();
    assert!(!crowded.contains(target));
    assert_eq!(crowded.elapsed_life_fraction(), 0.0);
}

#[test]
fn delta_scaled_integration_ignores_zero_delta() {
    let mut planet = Planet::new(PlanetId(0), &planet_config(1000.0)).unwrap();
    let a = planet.add_agent(2.0).unwrap();
    planet.add_agent(2.0).unwrap();
    let mode = IntegrationMode::DeltaScaled { reference_fps: 60.0 };
    planet
        .tick(0.0, 0.0, &quiet_params(), mode, &mut NullRenderer)
        .unwrap();
    assert_eq!(planet.agent_angle(a), Some(2.0));
    planet
        .tick(0.0, 1.0 / 30.0, &quiet_params(), mode, &mut NullRenderer)
        .unwrap();
    assert!((planet.agent_angle(a).unwrap() - (2.0 - 0.02)).abs() < 1e-5);
}

#[test]
fn spawns_migrate_along_configured_route() {
    let params = PopulationParams {
        spawn_probability_per_tick: 0.99,
        neighbour_overcrowding_limit: 100,
        ..Default::default()
    };
    let mut engine = engine_with(params);
    let source = engine.add_planet(planet_config(1000.0)).unwrap();
    let target = engine
        .add_planet(PlanetConfig::new(Vec3::new(8.0, 0.0, 0.0), 1.5, 1000.0).with_seed(4))
        .unwrap();
    engine.add_agent(source, 1.0).unwrap();
    engine
        .set_spawn_route(source, SpawnRoute::Planet(target))
        .unwrap();
    engine.set_spawn_route(target, SpawnRoute::Discard).unwrap();

    for _ in 0..10 {
        engine.update(0.016, &mut NullRenderer).unwrap();
    }
    assert_eq!(engine.planet(source).unwrap().population(), 1);
    assert!(engine.planet(target).unwrap().population() >= 5);
}

#[test]
fn population_never_exceeds_capacity() {
    let params = PopulationParams {
        spawn_probability_per_tick: 0.9,
        neighbour_overcrowding_limit: 1000,
        ..Default::default()
    };
    let config = EngineConfig {
        population_capacity: 12,
        seed: Some(9),
        ..Default::default()
    };
    let mut engine = SimulationEngine::with_params(config, params).unwrap();
    let id = engine.add_planet(planet_config(1000.0)).unwrap();
    engine.add_agent(id, 0.0).unwrap();

    let mut dropped = 0;
    for _ in 0..40 {
        let report = engine.update(0.016, &mut NullRenderer).unwrap();
        dropped += report.spawns_dropped;
        assert!(engine.agent_count() <= 12);
    }
    assert_eq!(engine.agent_count(), 12);
    assert!(dropped > 0);
}

#[test]
fn instance_buffer_tracks_live_agents() {
    let mut engine = engine_with(PopulationParams {
        spawn_probability_per_tick: 0.05,
        neighbour_overcrowding_limit: 4,
        ..Default::default()
    });
    engine.generate(&SystemConfig {
        agents_per_planet: 6,
        ..Default::default()
    })
    .unwrap();

    let mut buffer = InstanceBuffer::new(1000);
    for _ in 0..200 {
        let report = engine.update(0.016, &mut buffer).unwrap();
        buffer.apply_events(&report.events);
    }
    // agents spawned on the last frame have not been drawn yet
    let last = engine.update(0.0, &mut buffer).unwrap();
    buffer.apply_events(&last.events);
    assert_eq!(buffer.overflowed, 0);
    assert_eq!(buffer.occupied(), engine.agent_count() - last.agents_spawned);
}
