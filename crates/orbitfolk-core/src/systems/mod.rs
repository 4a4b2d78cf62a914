//! Systems - logic that operates on the agent arena

mod events;
mod population;

pub use events::*;
pub use population::*;
