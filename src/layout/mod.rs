//! Force-directed layout engine
//!
//! Positions the nodes of a [`Scene`](crate::scene::Scene) in 2D with link
//! springs, Barnes-Hut repulsion, a centering pull and collision.

mod forces;
mod params;
mod quadtree;
mod simulation;
mod spatial;

pub use forces::Link;
pub use params::{node_radius, LayoutParams, LayoutTier, REHEAT_ALPHA};
pub use simulation::{Body, Simulation, SimulationBuilder};
