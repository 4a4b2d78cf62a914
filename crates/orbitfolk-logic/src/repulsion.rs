//! Pairwise spacing vote between agents sharing an orbit.
//!
//! Each agent sums a signed, eased weight from every other agent on its
//! planet. A large enough total pushes it one fixed step away from the
//! crowd; small totals fall in a dead zone and leave it in place.

use crate::angle::{angular_difference, ease_out_expo, polar_to_planar, remap, sign, wrap};

/// Angular distance beyond which another agent has no influence.
pub const INFLUENCE_WINDOW: f32 = 0.2;

/// `|influence|` must exceed this before an agent moves.
pub const DEAD_ZONE: f32 = 0.2;

/// Magnitude of the nudge once outside the dead zone.
pub const NUDGE_STRENGTH: f32 = 2.0;

/// Angle change per unit nudge per tick.
pub const ANGULAR_STEP: f32 = 0.005;

/// Agents stand this far outside the planet surface.
pub const ORBIT_OFFSET: f32 = 0.4;

/// Signed contribution of agent `other` to agent `this`'s influence.
///
/// Coincident agents have no direction to push in, so `tie_break` (normally
/// `±1` from the agents' slot order) decides it.
pub fn pair_influence(this: f32, other: f32, tie_break: f32) -> f32 {
    let diff = angular_difference(this, other);
    let weight = ease_out_expo(remap(diff.abs(), (0.0, INFLUENCE_WINDOW), (1.0, 0.0)));
    let direction = if diff == 0.0 { sign(tie_break) } else { sign(diff) };
    direction * weight
}

/// Clamp a summed influence into `-NUDGE_STRENGTH`, `0` or `+NUDGE_STRENGTH`.
pub fn nudge(influence: f32) -> f32 {
    if influence.abs() > DEAD_ZONE {
        sign(influence) * NUDGE_STRENGTH
    } else {
        0.0
    }
}

/// Move `angle` by `nudge` steps, scaled by `step_scale`, and wrap.
pub fn integrate(angle: f32, nudge: f32, step_scale: f32) -> f32 {
    wrap(angle + nudge * ANGULAR_STEP * step_scale)
}

/// Manhattan distance between two agents projected onto an orbit of
/// `orbit_radius`.
pub fn planar_manhattan(a: f32, b: f32, orbit_radius: f32) -> f32 {
    let (ax, ay) = polar_to_planar(a, orbit_radius);
    let (bx, by) = polar_to_planar(b, orbit_radius);
    (ax - bx).abs() + (ay - by).abs()
}
