//! Pure orbit math for Orbitfolk.
//!
//! This crate holds everything about the planet population simulation that
//! is plain arithmetic: angles on a circle, the pairwise spacing vote, and
//! the tunable parameters with their validation. Functions take plain data
//! and return results, so they are unit-testable without an ECS, an RNG, or
//! a renderer.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`angle`] | Wrap, shortest-arc difference, clamped remap, easing |
//! | [`params`] | Shared tunables, parameter source, integration mode |
//! | [`repulsion`] | Pairwise influence, dead-zone nudge, crowding distance |

pub mod angle;
pub mod params;
pub mod repulsion;
