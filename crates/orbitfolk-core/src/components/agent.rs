//! Agent components: the individuals living on a planet's orbit.

use hecs::Entity;
use orbitfolk_logic::angle::{polar_to_planar, wrap};
use orbitfolk_logic::repulsion::ORBIT_OFFSET;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

use super::common::{Quat, Transform, Vec3};

/// Stable identity of an agent for its whole lifetime.
///
/// Renderers use it as the key for their instance slot. Ids are unique
/// within one planet and never reused while the agent is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl AgentId {
    pub(crate) fn from_entity(entity: Entity) -> Self {
        Self(entity.to_bits().get())
    }

    pub(crate) fn to_entity(self) -> Option<Entity> {
        Entity::from_bits(self.0)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "agent#{:x}", self.0)
    }
}

/// Angular position of an agent on its host planet, in `[0, 2π)`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub angle: f32,
}

impl Agent {
    pub fn new(angle: f32) -> Self {
        Self { angle: wrap(angle) }
    }

    /// Where the agent stands for a planet at `center` with `radius`:
    /// just outside the surface, feet toward the planet.
    pub fn transform(&self, center: Vec3, radius: f32) -> Transform {
        let (x, y) = polar_to_planar(self.angle, radius + ORBIT_OFFSET);
        Transform {
            position: center + Vec3::new(x, y, 0.0),
            orientation: Quat::from_rotation_z(self.angle - FRAC_PI_2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_agent_angle_is_wrapped() {
        assert_eq!(Agent::new(TAU).angle, 0.0);
        assert!((Agent::new(-FRAC_PI_2).angle - 3.0 * FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_transform_sits_outside_surface() {
        let agent = Agent::new(0.0);
        let t = agent.transform(Vec3::new(1.0, 2.0, 3.0), 2.0);
        assert!((t.position.x - (1.0 + 2.0 + ORBIT_OFFSET)).abs() < 1e-6);
        assert!((t.position.y - 2.0).abs() < 1e-6);
        assert_eq!(t.position.z, 3.0);
    }

    #[test]
    fn test_transform_orientation_follows_angle() {
        let agent = Agent::new(PI);
        let t = agent.transform(Vec3::ZERO, 1.0);
        assert!((t.orientation.rotation_z() - FRAC_PI_2).abs() < 1e-5);
        assert!(t.position.x < 0.0);
    }

    #[test]
    fn test_agent_id_round_trips_entity() {
        let mut world = hecs::World::new();
        let entity = world.spawn((Agent::new(1.0),));
        let id = AgentId::from_entity(entity);
        assert_eq!(id.to_entity(), Some(entity));
    }
}
