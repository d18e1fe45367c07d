//! In-memory storage backend
//!
//! Holds each graph as an immutable snapshot behind an `Arc`, so a full
//! replace swaps one map entry and readers never observe a half-written graph.

use super::traits::{dedupe_payload, GraphStore, NodeFilter, StorageResult};
use crate::graph::{Edge, Graph, GraphId, GraphSummary, Node};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Concurrent in-memory graph store
#[derive(Debug, Default)]
pub struct MemoryStore {
    graphs: DashMap<GraphId, Arc<Graph>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            graphs: DashMap::new(),
        }
    }

    /// Build a store pre-populated with the given graphs
    pub fn with_graphs(graphs: impl IntoIterator<Item = Graph>) -> Self {
        let store = Self::new();
        for graph in graphs {
            store.insert(graph);
        }
        store
    }

    fn insert(&self, graph: Graph) {
        let graph = dedupe_payload(&graph);
        self.graphs.insert(graph.id.clone(), Arc::new(graph));
    }

    fn snapshot(&self, id: &GraphId) -> Option<Arc<Graph>> {
        self.graphs.get(id).map(|r| Arc::clone(r.value()))
    }

    fn edges_matching(
        &self,
        id: &GraphId,
        names: &[String],
        endpoint: impl Fn(&Edge) -> &str,
    ) -> Vec<Edge> {
        let Some(graph) = self.snapshot(id) else {
            return Vec::new();
        };
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        graph
            .edges
            .iter()
            .filter(|e| wanted.contains(endpoint(*e)))
            .cloned()
            .collect()
    }
}

impl GraphStore for MemoryStore {
    fn replace_graph(&self, graph: &Graph) -> StorageResult<()> {
        self.insert(graph.clone());
        Ok(())
    }

    fn load_graph(&self, id: &GraphId) -> StorageResult<Option<Graph>> {
        Ok(self.snapshot(id).map(|g| g.as_ref().clone()))
    }

    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool> {
        Ok(self.graphs.remove(id).is_some())
    }

    fn list_graphs(&self) -> StorageResult<Vec<GraphSummary>> {
        let mut summaries: Vec<GraphSummary> =
            self.graphs.iter().map(|r| r.value().summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    fn has_graph(&self, id: &GraphId) -> StorageResult<bool> {
        Ok(self.graphs.contains_key(id))
    }

    fn find_node(&self, id: &GraphId, name: &str) -> StorageResult<Option<Node>> {
        Ok(self.snapshot(id).and_then(|g| g.node(name).cloned()))
    }

    fn load_nodes(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Node>> {
        let Some(graph) = self.snapshot(id) else {
            return Ok(Vec::new());
        };
        let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
        Ok(graph
            .nodes
            .iter()
            .filter(|n| wanted.contains(n.name.as_str()))
            .cloned()
            .collect())
    }

    fn find_nodes(&self, id: &GraphId, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let Some(graph) = self.snapshot(id) else {
            return Ok(Vec::new());
        };
        let mut nodes: Vec<Node> = graph
            .nodes
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(limit) = filter.limit {
            nodes.truncate(limit);
        }
        Ok(nodes)
    }

    fn edges_from_any(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Edge>> {
        Ok(self.edges_matching(id, names, |e| e.source.as_str()))
    }

    fn edges_to_any(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Edge>> {
        Ok(self.edges_matching(id, names, |e| e.target.as_str()))
    }
}
