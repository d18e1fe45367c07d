//! Core graph data structures

mod edge;
mod node;
mod snapshot;
mod timestamp;

#[cfg(test)]
mod tests;

pub use edge::{Edge, EdgeId};
pub use node::{Node, NodeCategory, NodeId, Properties, PropertyValue};
pub use snapshot::{Graph, GraphId, GraphSummary};
pub use timestamp::Timestamp;
