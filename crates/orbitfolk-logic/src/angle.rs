//! Angle math on a circle.
//!
//! Agents live at an angle on their planet's orbit, so every comparison
//! between two agents has to respect wrap-around at `0 / 2π`.
//!
//! ```
//! use orbitfolk_logic::angle::{angular_difference, wrap};
//! use std::f32::consts::TAU;
//!
//! assert_eq!(wrap(TAU), 0.0);
//! // 0.1 rad "after" 2π - 0.1 rad, going the short way round
//! let d = angular_difference(0.1, TAU - 0.1);
//! assert!((d - 0.2).abs() < 1e-5);
//! ```

use std::f32::consts::{PI, TAU};

/// Normalize an angle into `[0, 2π)`.
///
/// Non-finite input is passed through unchanged so callers can detect it.
pub fn wrap(angle: f32) -> f32 {
    if !angle.is_finite() {
        return angle;
    }
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Signed difference `a - b` along the shorter arc.
///
/// The result is always in `[-π, π]` and `angular_difference(a, b) ==
/// -angular_difference(b, a)`. When both arcs are exactly `π` long the
/// sign simply follows the raw difference.
pub fn angular_difference(a: f32, b: f32) -> f32 {
    let raw = wrap(a) - wrap(b);
    if raw > PI {
        raw - TAU
    } else if raw < -PI {
        raw + TAU
    } else {
        raw
    }
}

/// Sign of `x`, with `0.0` for zero (unlike `f32::signum`).
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Linearly remap `x` from `[in_lo, in_hi]` to `[out_lo, out_hi]`, clamped
/// to the output range. The output range may be reversed.
pub fn remap(x: f32, (in_lo, in_hi): (f32, f32), (out_lo, out_hi): (f32, f32)) -> f32 {
    let span = in_hi - in_lo;
    let t = if span == 0.0 {
        if x >= in_hi {
            1.0
        } else {
            0.0
        }
    } else {
        ((x - in_lo) / span).clamp(0.0, 1.0)
    };
    out_lo + (out_hi - out_lo) * t
}

/// Exponential ease-out on `[0, 1]`.
pub fn ease_out_expo(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else if t <= 0.0 {
        0.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

/// Point on a circle of `radius` at `angle`, in the orbit plane.
pub fn polar_to_planar(angle: f32, radius: f32) -> (f32, f32) {
    (angle.cos() * radius, angle.sin() * radius)
}
