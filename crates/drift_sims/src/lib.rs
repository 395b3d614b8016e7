//! Physical systems from the drift simulation programs and a small runner that drives
//! them through `drift_core`'s fixed-step integrators.

pub mod simulation;
pub mod systems;

pub use simulation::{Simulation, SimulationConfig};
