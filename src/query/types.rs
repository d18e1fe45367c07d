//! Query types and result structures

use crate::graph::{Edge, GraphId, Node};
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by read queries
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),

    #[error("Node not found: {name} (graph {graph})")]
    NodeNotFound { graph: GraphId, name: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    /// Whether the caller asked for something absent, as opposed to a
    /// backend failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QueryError::GraphNotFound(_)
                | QueryError::NodeNotFound { .. }
                | QueryError::Storage(StorageError::GraphNotFound(_))
        )
    }
}

/// Result type for queries
pub type QueryResult<T> = Result<T, QueryError>;

/// Induced subgraph around a focus node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// The node the expansion started from
    #[serde(rename = "focusNode")]
    pub focus: Node,
    /// Focus first, then discovery order
    pub nodes: Vec<Node>,
    /// Each edge exactly once, original direction preserved
    pub edges: Vec<Edge>,
}

impl Neighborhood {
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }
}
