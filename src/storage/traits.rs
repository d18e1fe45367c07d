//! Storage trait definitions

use crate::graph::{Edge, Graph, GraphId, GraphSummary, Node};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for querying nodes
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Case-insensitive substring that the node name must contain
    pub name_contains: Option<String>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_containing(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// In-memory evaluation, shared by backends that filter in Rust
    pub fn matches(&self, node: &Node) -> bool {
        match self.name_contains {
            Some(ref needle) => node.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Trait for graph storage backends
///
/// All reads are scoped to one named graph. Edge lookups take a whole
/// frontier of names at once so that traversal issues one query per
/// direction per round instead of one per node.
///
/// Implementations must be thread-safe (Send + Sync): the view driver runs
/// store calls on blocking worker threads.
pub trait GraphStore: Send + Sync {
    // === Graph Operations ===

    /// Atomically replace a graph's entire node and edge set
    ///
    /// Nodes with a name already seen earlier in the payload are dropped, as
    /// are edges repeating an earlier edge id.
    fn replace_graph(&self, graph: &Graph) -> StorageResult<()>;

    /// Load a complete graph
    fn load_graph(&self, id: &GraphId) -> StorageResult<Option<Graph>>;

    /// Delete a graph and all its nodes/edges
    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool>;

    /// List all graphs with their cached aggregates, ordered by id
    fn list_graphs(&self) -> StorageResult<Vec<GraphSummary>>;

    /// Check if a graph exists
    fn has_graph(&self, id: &GraphId) -> StorageResult<bool>;

    // === Node Operations ===

    /// Look a node up by name
    fn find_node(&self, id: &GraphId, name: &str) -> StorageResult<Option<Node>>;

    /// Load every node whose name is in `names`; unknown names are skipped
    fn load_nodes(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Node>>;

    /// Nodes matching the filter, ordered by name
    fn find_nodes(&self, id: &GraphId, filter: &NodeFilter) -> StorageResult<Vec<Node>>;

    // === Edge Operations ===

    /// All edges whose source is any of `names`, in insertion order
    fn edges_from_any(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Edge>>;

    /// All edges whose target is any of `names`, in insertion order
    fn edges_to_any(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Edge>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Drop nodes with repeated names and edges with repeated ids, keeping the
/// first occurrence of each
pub(crate) fn dedupe_payload(graph: &Graph) -> Graph {
    use std::collections::HashSet;

    let mut seen_names = HashSet::new();
    let nodes = graph
        .nodes
        .iter()
        .filter(|n| seen_names.insert(n.name.as_str()))
        .cloned()
        .collect();

    let mut seen_edges = HashSet::new();
    let edges = graph
        .edges
        .iter()
        .filter(|e| seen_edges.insert(&e.id))
        .cloned()
        .collect();

    Graph {
        id: graph.id.clone(),
        name: graph.name.clone(),
        nodes,
        edges,
        updated_at: graph.updated_at,
    }
}
