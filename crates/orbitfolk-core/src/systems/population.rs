//! Population system - spacing, crowding and spawn checks for one planet
//!
//! Every agent is updated against the same frozen snapshot of angles taken
//! at the start of the tick. New angles go into a scratch buffer and are
//! committed afterwards, so iteration order never biases the result.

use hecs::{Entity, World};
use orbitfolk_logic::params::PopulationParams;
use orbitfolk_logic::repulsion::{integrate, nudge, pair_influence, planar_manhattan};

use crate::components::Agent;

/// One agent's angle at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub entity: Entity,
    pub angle: f32,
}

/// What the population step decided for one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentUpdate {
    pub entity: Entity,
    pub influence: f32,
    pub nudge: f32,
    pub new_angle: f32,
    pub close_neighbours: u32,
}

impl AgentUpdate {
    pub fn is_overcrowded(&self, params: &PopulationParams) -> bool {
        self.close_neighbours > params.neighbour_overcrowding_limit
    }
}

/// Capture every agent's angle, ordered by arena slot.
pub fn snapshot_agents(world: &World) -> Vec<AgentSnapshot> {
    let mut snapshot: Vec<AgentSnapshot> = world
        .query::<&Agent>()
        .iter()
        .map(|(entity, agent)| AgentSnapshot {
            entity,
            angle: agent.angle,
        })
        .collect();
    snapshot.sort_by_key(|s| s.entity.id());
    snapshot
}

/// Compute the spacing vote, nudge and crowding count for every agent.
///
/// `orbit_radius` is where agents stand (planet radius plus offset) and is
/// used for the crowding distance. `step_scale` multiplies the angular step.
pub fn compute_updates(
    snapshot: &[AgentSnapshot],
    orbit_radius: f32,
    params: &PopulationParams,
    step_scale: f32,
) -> Vec<AgentUpdate> {
    let mut updates = Vec::with_capacity(snapshot.len());

    for (i, this) in snapshot.iter().enumerate() {
        let mut influence = 0.0;
        let mut close_neighbours = 0;

        for (j, other) in snapshot.iter().enumerate() {
            if i == j {
                continue;
            }
            // coincident agents split by slot order: lower slot backs off
            let tie_break = if i < j { -1.0 } else { 1.0 };
            influence += pair_influence(this.angle, other.angle, tie_break);

            if planar_manhattan(this.angle, other.angle, orbit_radius)
                < params.minimum_separation_distance
            {
                close_neighbours += 1;
            }
        }

        let nudge = nudge(influence);
        updates.push(AgentUpdate {
            entity: this.entity,
            influence,
            nudge,
            new_angle: integrate(this.angle, nudge, step_scale),
            close_neighbours,
        });
    }

    updates
}

/// Write the scratch buffer back into the arena.
///
/// Returns the first entity whose new angle is not finite, if any; nothing
/// is written in that case.
pub fn commit_updates(world: &mut World, updates: &[AgentUpdate]) -> Result<(), Entity> {
    if let Some(bad) = updates.iter().find(|u| !u.new_angle.is_finite()) {
        return Err(bad.entity);
    }
    for update in updates {
        if let Ok(mut agent) = world.get::<&mut Agent>(update.entity) {
            agent.angle = update.new_angle;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    fn world_with(angles: &[f32]) -> World {
        let mut world = World::new();
        for &angle in angles {
            world.spawn((Agent::new(angle),));
        }
        world
    }

    fn step(world: &World) -> Vec<AgentUpdate> {
        compute_updates(&snapshot_agents(world), 2.4, &PopulationParams::default(), 1.0)
    }

    #[test]
    fn test_single_agent_never_moves() {
        let world = world_with(&[1.234]);
        let updates = step(&world);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].influence, 0.0);
        assert_eq!(updates[0].nudge, 0.0);
        assert_eq!(updates[0].new_angle, 1.234);
        assert_eq!(updates[0].close_neighbours, 0);
    }

    #[test]
    fn test_opposite_agents_do_not_move() {
        let world = world_with(&[0.0, PI]);
        for update in step(&world) {
            assert_eq!(update.nudge, 0.0);
        }
    }

    #[test]
    fn test_coincident_agents_split_apart() {
        let world = world_with(&[1.0, 1.0]);
        let updates = step(&world);
        assert_eq!(updates[0].nudge, -2.0);
        assert_eq!(updates[1].nudge, 2.0);
        assert!(updates[0].new_angle < 1.0);
        assert!(updates[1].new_angle > 1.0);
    }

    #[test]
    fn test_neighbours_across_wrap_boundary_repel() {
        let eps = 1e-3;
        let world = world_with(&[0.0, TAU - eps]);
        let updates = step(&world);
        // agent at 0 moves forward, agent just below 2π moves backward
        assert_eq!(updates[0].nudge, 2.0);
        assert_eq!(updates[1].nudge, -2.0);
        assert!(updates[0].new_angle > 0.0 && updates[0].new_angle < 0.1);
        assert!(updates[1].new_angle < TAU - eps);
    }

    #[test]
    fn test_snapshot_makes_order_irrelevant() {
        let angles = [0.5, 0.55, 0.6, 3.0];
        let forward = step(&world_with(&angles));
        let mut reversed: Vec<f32> = angles.to_vec();
        reversed.reverse();
        let backward = step(&world_with(&reversed));

        let mut a: Vec<f32> = forward.iter().map(|u| u.new_angle).collect();
        let mut b: Vec<f32> = backward.iter().map(|u| u.new_angle).collect();
        a.sort_by(f32::total_cmp);
        b.sort_by(f32::total_cmp);
        assert_eq!(a, b);
    }

    #[test]
    fn test_commit_rejects_nan() {
        let mut world = world_with(&[1.0]);
        let mut updates = step(&world);
        updates[0].new_angle = f32::NAN;
        assert!(commit_updates(&mut world, &updates).is_err());
        let snapshot = snapshot_agents(&world);
        assert_eq!(snapshot[0].angle, 1.0);
    }
}
