//! Generation - procedural creation of planetary systems

mod system;

pub use system::*;
