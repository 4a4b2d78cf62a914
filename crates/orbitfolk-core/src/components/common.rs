//! Common math components shared by planets, agents and the renderer seam.

use serde::{Deserialize, Serialize};

/// 3D position vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: &Self) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Offsetting a planet center by an orbit position
impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, offset: Self) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.z + offset.z)
    }
}

/// Unit quaternion orientation, `w` is the scalar part
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    /// Rotation of `angle` radians about the +Z axis.
    pub fn from_rotation_z(angle: f32) -> Self {
        let half = angle * 0.5;
        Self {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        }
    }

    /// Rotation angle about +Z, assuming this is a pure Z rotation.
    pub fn rotation_z(&self) -> f32 {
        2.0 * self.z.atan2(self.w)
    }
}

/// World-space pose handed to the renderer for one agent
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
}
