//! Orbitfolk Headless Simulation Harness
//!
//! Validates the planet population core without a renderer, then runs a
//! generated planetary system and checks invariants every frame.
//!
//! Usage:
//!   cargo run -p orbitfolk-simtest
//!   cargo run -p orbitfolk-simtest -- --verbose --frames 3600 --seed 7
//!   cargo run -p orbitfolk-simtest -- --params params.json --report run.json

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{debug, error, info};
use orbitfolk_core::prelude::*;
use orbitfolk_logic::angle::{angular_difference, wrap};
use orbitfolk_logic::repulsion::ORBIT_OFFSET;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "orbitfolk-simtest", about = "Headless Orbitfolk simulation harness")]
struct Args {
    /// Print every check, not only failures
    #[arg(short, long)]
    verbose: bool,

    /// Frames to run in the system scenario
    #[arg(long, default_value_t = 1800)]
    frames: u32,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Seed for the generated system
    #[arg(long, default_value_t = 0xBEEF)]
    seed: u64,

    /// JSON file with population tunables (missing fields use defaults)
    #[arg(long)]
    params: Option<PathBuf>,

    /// Write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,
}

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Debug, Default, Serialize)]
struct RunSummary {
    frames: u32,
    sim_time: f64,
    peak_population: usize,
    final_population: usize,
    deaths: usize,
    spawned: usize,
    spawns_dropped: usize,
    planets_removed: usize,
    invariant_breaches: usize,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    params: PopulationParams,
    results: &'a [TestResult],
    summary: &'a RunSummary,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    println!("=== Orbitfolk Simulation Harness ===\n");

    let params = match load_params(args.params.as_ref()) {
        Ok(p) => p,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(2);
        }
    };

    let mut results = Vec::new();

    // 1. Angle math
    results.extend(validate_angle_math(args.verbose));

    // 2. Planet lifecycle
    results.extend(section("lifecycle", validate_lifecycle(args.verbose)));

    // 3. Crowding and spacing
    results.extend(section("population", validate_population(args.verbose)));

    // 4. Restart
    results.extend(section("restart", validate_restart(args.verbose)));

    // 5. Full system run
    let (run_results, summary) = run_system(&args, params);
    results.extend(run_results);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if let Some(path) = &args.report {
        let report = RunReport {
            params,
            results: &results,
            summary: &summary,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    error!("could not write report to {}: {}", path.display(), e);
                } else {
                    info!("Report written to {}", path.display());
                }
            }
            Err(e) => error!("could not serialize report: {}", e),
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_params(path: Option<&PathBuf>) -> anyhow::Result<PopulationParams> {
    let Some(path) = path else {
        return Ok(PopulationParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let params: PopulationParams = serde_json::from_str(&text)
        .with_context(|| format!("cannot parse {}", path.display()))?;
    params
        .validate()
        .with_context(|| format!("invalid tunables in {}", path.display()))?;
    Ok(params)
}

fn quiet() -> PopulationParams {
    PopulationParams {
        spawn_probability_per_tick: 0.0,
        ..Default::default()
    }
}

/// A section that errored out counts as one failed check
fn section(name: &str, outcome: Result<Vec<TestResult>, SimError>) -> Vec<TestResult> {
    outcome.unwrap_or_else(|e| {
        vec![TestResult {
            name: format!("{}_section", name),
            passed: false,
            detail: e.to_string(),
        }]
    })
}

fn test_planet(lifespan: f32) -> Result<Planet, SimError> {
    let config = PlanetConfig::new(Vec3::ZERO, 2.0, lifespan).with_seed(1);
    Planet::new(PlanetId(0), &config)
}

fn tick(planet: &mut Planet, dt: f32, params: &PopulationParams) -> Result<(), SimError> {
    planet.tick(0.0, dt, params, IntegrationMode::FixedStep, &mut NullRenderer)
}

// ── 1. Angle Math ───────────────────────────────────────────────────────

fn validate_angle_math(verbose: bool) -> Vec<TestResult> {
    println!("--- Angle Math ---");
    let mut results = Vec::new();

    // Sweep pairs around the circle, including both sides of the seam
    let samples: Vec<f32> = (0..64)
        .map(|i| i as f32 / 64.0 * TAU)
        .chain([0.0, TAU - 1e-4, -1e-4, 3.0 * TAU + 0.3])
        .collect();
    let mut antisymmetric = true;
    let mut bounded = true;
    for &a in &samples {
        for &b in &samples {
            let ab = angular_difference(a, b);
            antisymmetric &= ab == -angular_difference(b, a);
            bounded &= ab.abs() <= PI;
        }
    }
    results.push(TestResult {
        name: "angle_difference_antisymmetric".into(),
        passed: antisymmetric,
        detail: format!("{} pairs checked", samples.len() * samples.len()),
    });
    results.push(TestResult {
        name: "angle_difference_bounded".into(),
        passed: bounded,
        detail: "|d| <= π for every pair".into(),
    });

    let wrap_ok = samples
        .iter()
        .all(|&x| (0.0..TAU).contains(&wrap(x)) && wrap(wrap(x)) == wrap(x));
    results.push(TestResult {
        name: "angle_wrap_idempotent".into(),
        passed: wrap_ok,
        detail: "wrap lands in [0, 2π) and is idempotent".into(),
    });

    if verbose {
        println!(
            "  d(0, 2π-1e-4) = {:.6}, d(2π-1e-4, 0) = {:.6}",
            angular_difference(0.0, TAU - 1e-4),
            angular_difference(TAU - 1e-4, 0.0)
        );
    }

    results
}

// ── 2. Lifecycle ────────────────────────────────────────────────────────

fn validate_lifecycle(_verbose: bool) -> Result<Vec<TestResult>, SimError> {
    println!("--- Planet Lifecycle ---");
    let mut results = Vec::new();

    let mut planet = test_planet(2.0)?;
    for angle in [0.0, 2.0, 4.0] {
        planet.add_agent(angle)?;
    }
    let first = tick(&mut planet, 1.0, &quiet());
    let halfway = planet.elapsed_life_fraction();
    let radius_ok = (planet.radius() - (1.0 - halfway) * planet.start_radius()).abs() < 1e-6;
    let second = tick(&mut planet, 1.0, &quiet());
    let events = planet.drain_events();
    let agent_deaths = events
        .iter()
        .filter(|e| matches!(e, SimEvent::AgentDied { .. }))
        .count();
    let planet_deaths = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PlanetDied { .. }))
        .count();

    results.push(TestResult {
        name: "lifecycle_radius_formula".into(),
        passed: first.is_ok() && halfway == 0.5 && radius_ok,
        detail: format!("elapsed={} start_radius={}", halfway, planet.start_radius()),
    });
    results.push(TestResult {
        name: "lifecycle_dies_on_second_tick".into(),
        passed: second.is_ok() && planet.is_dead() && planet.elapsed_life_fraction() == 1.0,
        detail: format!("state={:?}", planet.state()),
    });
    results.push(TestResult {
        name: "lifecycle_death_events_once".into(),
        passed: agent_deaths == 3 && planet_deaths == 1,
        detail: format!("{} agent deaths, {} planet deaths", agent_deaths, planet_deaths),
    });

    let refused = matches!(
        tick(&mut planet, 1.0, &quiet()),
        Err(SimError::InvalidState { .. })
    );
    results.push(TestResult {
        name: "lifecycle_dead_refuses_tick".into(),
        passed: refused,
        detail: "tick after death fails with InvalidState".into(),
    });

    Ok(results)
}

// ── 3. Population ───────────────────────────────────────────────────────

fn validate_population(verbose: bool) -> Result<Vec<TestResult>, SimError> {
    println!("--- Population Step ---");
    let mut results = Vec::new();

    // Single agent never moves
    let mut lone = test_planet(1000.0)?;
    let id = lone.add_agent(1.25)?;
    for _ in 0..100 {
        tick(&mut lone, 1.0 / 60.0, &quiet())?;
    }
    let lone_angle = lone.agent_angle(id);
    results.push(TestResult {
        name: "population_single_agent_static".into(),
        passed: lone_angle == Some(1.25),
        detail: format!("angle after 100 ticks: {:?}", lone_angle),
    });

    // Coincident agents split with opposite full nudges
    let mut pair = test_planet(1000.0)?;
    let a = pair.add_agent(3.0)?;
    let b = pair.add_agent(3.0)?;
    tick(&mut pair, 1.0 / 60.0, &quiet())?;
    let da = pair.agent_angle(a).map(|x| x - 3.0);
    let db = pair.agent_angle(b).map(|x| x - 3.0);
    let split = matches!((da, db), (Some(x), Some(y)) if x < 0.0 && y > 0.0 && (x + y).abs() < 1e-5);
    results.push(TestResult {
        name: "population_coincident_split".into(),
        passed: split,
        detail: format!("deltas {:?} / {:?}", da, db),
    });

    // Overcrowding threshold
    let limit = 3;
    let params = PopulationParams {
        neighbour_overcrowding_limit: limit,
        ..quiet()
    };
    let survives = |neighbours: u32| -> Result<bool, SimError> {
        let mut planet = test_planet(1000.0)?;
        let target = planet.add_agent(0.0)?;
        for i in 0..neighbours {
            planet.add_agent(0.02 * (i as f32 + 1.0))?;
        }
        tick(&mut planet, 1.0 / 60.0, &params)?;
        Ok(planet.contains(target))
    };
    let at_limit = survives(limit)?;
    let over_limit = survives(limit + 1)?;
    results.push(TestResult {
        name: "population_overcrowding_threshold".into(),
        passed: at_limit && !over_limit,
        detail: format!(
            "limit={} survives_at_limit={} survives_over={}",
            limit, at_limit, over_limit
        ),
    });

    if verbose {
        println!("  coincident deltas: {:?} {:?}", da, db);
    }

    Ok(results)
}

// ── 4. Restart ──────────────────────────────────────────────────────────

fn validate_restart(_verbose: bool) -> Result<Vec<TestResult>, SimError> {
    println!("--- Restart ---");
    let mut results = Vec::new();

    let params = PopulationParams {
        restart_spawn_count: 5,
        ..quiet()
    };
    let mut planet = test_planet(50.0)?;
    for angle in [0.3, 1.3, 2.3, 3.3] {
        planet.add_agent(angle)?;
    }
    tick(&mut planet, 5.0, &params)?;
    planet.drain_events();

    planet.restart(&params)?;
    let spawn_requests = planet
        .pending_events()
        .iter()
        .filter(|e| e.is_spawn_request())
        .count();
    results.push(TestResult {
        name: "restart_resets_planet".into(),
        passed: planet.population() == 0 && planet.elapsed_life_fraction() == 0.0,
        detail: format!(
            "population={} elapsed={}",
            planet.population(),
            planet.elapsed_life_fraction()
        ),
    });
    results.push(TestResult {
        name: "restart_requests_seed_spawns".into(),
        passed: spawn_requests == params.restart_spawn_count as usize,
        detail: format!("{} spawn requests queued", spawn_requests),
    });

    Ok(results)
}

// ── 5. System Run ───────────────────────────────────────────────────────

fn run_system(args: &Args, params: PopulationParams) -> (Vec<TestResult>, RunSummary) {
    println!("--- System Run ({} frames) ---", args.frames);
    let mut results = Vec::new();
    let mut summary = RunSummary::default();

    let config = EngineConfig {
        seed: Some(args.seed),
        ..Default::default()
    };
    let mut engine = match SimulationEngine::with_params(config, params) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(TestResult {
                name: "system_engine_created".into(),
                passed: false,
                detail: e.to_string(),
            });
            return (results, summary);
        }
    };
    let planets = engine.generate(&SystemConfig::default());
    results.push(TestResult {
        name: "system_generated".into(),
        passed: planets.is_ok(),
        detail: format!("{} planets, {} agents", engine.planet_count(), engine.agent_count()),
    });

    let capacity = engine.config().population_capacity;
    let mut buffer = InstanceBuffer::new(capacity);
    let mut failure = None;

    for frame in 0..args.frames {
        let report = match engine.update(args.dt, &mut buffer) {
            Ok(report) => report,
            Err(e) => {
                failure = Some(format!("frame {}: {}", frame, e));
                break;
            }
        };
        buffer.apply_events(&report.events);

        summary.frames += 1;
        summary.deaths += report.deaths();
        summary.spawned += report.agents_spawned;
        summary.spawns_dropped += report.spawns_dropped;
        summary.planets_removed += report.planets_removed.len();
        summary.peak_population = summary.peak_population.max(engine.agent_count());
        summary.invariant_breaches += count_breaches(&engine);

        if frame % 600 == 0 {
            debug!(
                "frame {}: {} planets, {} agents",
                frame,
                engine.planet_count(),
                engine.agent_count()
            );
        }
    }
    summary.sim_time = engine.sim_time();
    summary.final_population = engine.agent_count();

    results.push(TestResult {
        name: "system_run_completed".into(),
        passed: failure.is_none(),
        detail: failure.unwrap_or_else(|| format!("{:.1}s simulated", summary.sim_time)),
    });
    results.push(TestResult {
        name: "system_invariants_hold".into(),
        passed: summary.invariant_breaches == 0,
        detail: format!("{} breaches", summary.invariant_breaches),
    });
    results.push(TestResult {
        name: "system_within_capacity".into(),
        passed: summary.peak_population <= capacity && buffer.overflowed == 0,
        detail: format!(
            "peak {} of {} slots, {} overflowed",
            summary.peak_population, capacity, buffer.overflowed
        ),
    });

    if args.verbose {
        println!(
            "  deaths={} spawned={} dropped={} planets_removed={} final={}",
            summary.deaths,
            summary.spawned,
            summary.spawns_dropped,
            summary.planets_removed,
            summary.final_population
        );
    }

    (results, summary)
}

/// Radius formula, angle range and agent poses for every live planet
fn count_breaches(engine: &SimulationEngine) -> usize {
    let mut breaches = 0;
    for planet in engine.planets() {
        let elapsed = planet.elapsed_life_fraction();
        if !(0.0..=1.0).contains(&elapsed) {
            breaches += 1;
        }
        let expected = match planet.state() {
            LifecycleState::Dying => (1.0 - elapsed) * planet.start_radius(),
            _ => planet.start_radius(),
        };
        if (planet.radius() - expected).abs() > 1e-5 {
            breaches += 1;
        }
        for (agent, angle) in planet.agents() {
            if !(0.0..TAU).contains(&angle) {
                breaches += 1;
            }
            if let Some(pose) = planet.agent_transform(agent) {
                let off_orbit = pose.position.distance(&planet.center())
                    - (planet.radius() + ORBIT_OFFSET);
                let facing = angular_difference(pose.orientation.rotation_z() + FRAC_PI_2, angle);
                if off_orbit.abs() > 1e-4 || facing.abs() > 1e-4 {
                    breaches += 1;
                }
            }
        }
    }
    breaches
}
