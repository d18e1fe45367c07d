//! Bounded neighbor expansion
//!
//! Breadth-first search over the undirected view of the stored edges,
//! issuing one batched edge lookup per direction per round.

use super::types::{Neighborhood, QueryError, QueryResult};
use crate::graph::{Edge, EdgeId, GraphId, Node};
use crate::storage::GraphStore;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Hard ceiling on hop depth, bounding store load
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Query for expanding the neighborhood of a node
#[derive(Debug, Clone)]
pub struct ExpandQuery {
    /// Name of the starting node
    pub start: String,
    /// Requested hop depth; values <= 0 return the start node alone
    pub max_depth: i64,
    /// Ceiling applied to `max_depth`
    pub depth_limit: usize,
}

impl ExpandQuery {
    /// Create a new expansion from a starting node
    pub fn from(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            max_depth: 1,
            depth_limit: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the requested hop depth
    pub fn depth(mut self, max_depth: i64) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Override the depth ceiling
    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit;
        self
    }

    /// Number of rounds actually run
    pub fn effective_depth(&self) -> usize {
        if self.max_depth <= 0 {
            0
        } else {
            (self.max_depth as u64).min(self.depth_limit as u64) as usize
        }
    }

    /// Execute the expansion against a graph in the store
    pub fn execute(&self, store: &dyn GraphStore, graph: &GraphId) -> QueryResult<Neighborhood> {
        if !store.has_graph(graph)? {
            return Err(QueryError::GraphNotFound(graph.clone()));
        }
        let Some(focus) = store.find_node(graph, &self.start)? else {
            return Err(QueryError::NodeNotFound {
                graph: graph.clone(),
                name: self.start.clone(),
            });
        };

        let depth = self.effective_depth();
        let mut visited: HashSet<String> = HashSet::from([self.start.clone()]);
        let mut discovered: Vec<String> = Vec::new();
        let mut frontier: Vec<String> = vec![self.start.clone()];
        let mut edges: Vec<Edge> = Vec::new();

        for round in 0..depth {
            if frontier.is_empty() {
                break;
            }

            let outgoing = store.edges_from_any(graph, &frontier)?;
            let incoming = store.edges_to_any(graph, &frontier)?;
            let mut next_frontier = Vec::new();

            for edge in outgoing.into_iter().chain(incoming) {
                for endpoint in [&edge.source, &edge.target] {
                    // Marked on discovery so a node is expanded at most once
                    if visited.insert(endpoint.clone()) {
                        next_frontier.push(endpoint.clone());
                        discovered.push(endpoint.clone());
                    }
                }
                edges.push(edge);
            }

            debug!(
                graph = %graph,
                round,
                frontier = frontier.len(),
                discovered = next_frontier.len(),
                "expansion round"
            );
            frontier = next_frontier;
        }

        let edges = dedupe_by_id(edges);
        let nodes = self.ordered_nodes(store, graph, focus.clone(), &discovered)?;

        Ok(Neighborhood { focus, nodes, edges })
    }

    /// Focus first, then discovered nodes in discovery order; names with no
    /// stored node are skipped
    fn ordered_nodes(
        &self,
        store: &dyn GraphStore,
        graph: &GraphId,
        focus: Node,
        discovered: &[String],
    ) -> QueryResult<Vec<Node>> {
        let mut by_name: HashMap<String, Node> = store
            .load_nodes(graph, discovered)?
            .into_iter()
            .map(|n| (n.name.clone(), n))
            .collect();

        let mut nodes = Vec::with_capacity(discovered.len() + 1);
        nodes.push(focus);
        nodes.extend(discovered.iter().filter_map(|name| by_name.remove(name)));
        Ok(nodes)
    }
}

/// Keep the first occurrence of each edge id
fn dedupe_by_id(edges: Vec<Edge>) -> Vec<Edge> {
    let mut seen: HashSet<EdgeId> = HashSet::with_capacity(edges.len());
    edges
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::storage::MemoryStore;

    fn store_with(graph: Graph) -> MemoryStore {
        MemoryStore::with_graphs([graph])
    }

    fn names(result: &Neighborhood) -> Vec<&str> {
        result.node_names()
    }

    fn edge_ids(result: &Neighborhood) -> Vec<&str> {
        result.edges.iter().map(|e| e.id.as_str()).collect()
    }

    fn edge(id: &str, s: &str, t: &str) -> Edge {
        Edge::new(s, t, "rel").with_id(EdgeId::from_string(id))
    }

    /// A -> B -> C -> D
    fn chain() -> Graph {
        Graph::new("g", "chain")
            .with_node(Node::new("A", "concept"))
            .with_node(Node::new("B", "concept"))
            .with_node(Node::new("C", "concept"))
            .with_node(Node::new("D", "concept"))
            .with_edge(edge("ab", "A", "B"))
            .with_edge(edge("bc", "B", "C"))
            .with_edge(edge("cd", "C", "D"))
    }

    #[test]
    fn test_depth_zero_returns_start_only() {
        let store = store_with(chain());
        let g = GraphId::from("g");
        for depth in [0, -1, -100] {
            let result = ExpandQuery::from("B").depth(depth).execute(&store, &g).unwrap();
            assert_eq!(names(&result), vec!["B"]);
            assert!(result.edges.is_empty());
            assert_eq!(result.focus.name, "B");
        }
    }

    #[test]
    fn test_chain_depths() {
        let store = store_with(chain());
        let g = GraphId::from("g");

        let one = ExpandQuery::from("A").depth(1).execute(&store, &g).unwrap();
        assert_eq!(names(&one), vec!["A", "B"]);
        assert_eq!(edge_ids(&one), vec!["ab"]);

        let two = ExpandQuery::from("A").depth(2).execute(&store, &g).unwrap();
        assert_eq!(names(&two), vec!["A", "B", "C"]);
        assert_eq!(edge_ids(&two), vec!["ab", "bc"]);
    }

    #[test]
    fn test_reachability_ignores_direction() {
        let store = store_with(chain());
        let result = ExpandQuery::from("D")
            .depth(2)
            .execute(&store, &GraphId::from("g"))
            .unwrap();
        assert_eq!(names(&result), vec!["D", "C", "B"]);
        // Direction is preserved in the output
        assert_eq!(result.edges[0].source, "C");
        assert_eq!(result.edges[0].target, "D");
    }

    #[test]
    fn test_depth_is_clamped() {
        let store = store_with(
            chain()
                .with_node(Node::new("E", "concept"))
                .with_edge(edge("de", "D", "E")),
        );
        let g = GraphId::from("g");
        let result = ExpandQuery::from("A").depth(99).execute(&store, &g).unwrap();
        assert_eq!(names(&result), vec!["A", "B", "C", "D"]);

        let query = ExpandQuery::from("A").depth(99).depth_limit(1);
        assert_eq!(query.effective_depth(), 1);
    }

    #[test]
    fn test_diamond_edges_appear_once() {
        let diamond = Graph::new("d", "diamond")
            .with_node(Node::new("A", "concept"))
            .with_node(Node::new("B", "concept"))
            .with_node(Node::new("C", "concept"))
            .with_node(Node::new("D", "concept"))
            .with_edge(edge("ab", "A", "B"))
            .with_edge(edge("ac", "A", "C"))
            .with_edge(edge("bd", "B", "D"))
            .with_edge(edge("cd", "C", "D"));
        let store = store_with(diamond);

        let result = ExpandQuery::from("A")
            .depth(2)
            .execute(&store, &GraphId::from("d"))
            .unwrap();

        assert_eq!(names(&result), vec!["A", "B", "C", "D"]);
        let mut ids = edge_ids(&result);
        ids.sort();
        assert_eq!(ids, vec!["ab", "ac", "bd", "cd"]);
    }

    #[test]
    fn test_edge_between_frontier_members_is_deduplicated() {
        // B and C are both in round two's frontier and share an edge; it is
        // fetched once as outgoing (from B) and once as incoming (to C)
        let triangle = Graph::new("t", "triangle")
            .with_node(Node::new("A", "concept"))
            .with_node(Node::new("B", "concept"))
            .with_node(Node::new("C", "concept"))
            .with_edge(edge("ab", "A", "B"))
            .with_edge(edge("ac", "A", "C"))
            .with_edge(edge("bc", "B", "C"));
        let store = store_with(triangle);

        let result = ExpandQuery::from("A")
            .depth(3)
            .execute(&store, &GraphId::from("t"))
            .unwrap();
        let ids = edge_ids(&result);
        assert_eq!(ids.len(), 3);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let graph = Graph::new("p", "parallel")
            .with_node(Node::new("A", "concept"))
            .with_node(Node::new("B", "concept"))
            .with_edge(edge("x", "A", "B"))
            .with_edge(edge("y", "A", "B"))
            .with_edge(edge("z", "B", "A"));
        let store = store_with(graph);
        let result = ExpandQuery::from("A")
            .depth(1)
            .execute(&store, &GraphId::from("p"))
            .unwrap();
        assert_eq!(edge_ids(&result), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_dangling_endpoint_is_not_returned_as_node() {
        let graph = Graph::new("g", "dangling")
            .with_node(Node::new("A", "concept"))
            .with_edge(edge("ghost", "A", "Ghost"));
        let store = store_with(graph);
        let result = ExpandQuery::from("A")
            .depth(2)
            .execute(&store, &GraphId::from("g"))
            .unwrap();
        assert_eq!(names(&result), vec!["A"]);
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn test_missing_start_or_graph_is_not_found() {
        let store = store_with(chain());

        let err = ExpandQuery::from("Nope")
            .execute(&store, &GraphId::from("g"))
            .unwrap_err();
        assert!(matches!(err, QueryError::NodeNotFound { .. }));
        assert!(err.is_not_found());

        let err = ExpandQuery::from("A")
            .execute(&store, &GraphId::from("other"))
            .unwrap_err();
        assert!(matches!(err, QueryError::GraphNotFound(_)));
    }

    #[test]
    fn test_self_loop_does_not_revisit() {
        let graph = Graph::new("s", "loop")
            .with_node(Node::new("A", "concept"))
            .with_edge(edge("aa", "A", "A"));
        let store = store_with(graph);
        let result = ExpandQuery::from("A")
            .depth(3)
            .execute(&store, &GraphId::from("s"))
            .unwrap();
        assert_eq!(names(&result), vec!["A"]);
        assert_eq!(edge_ids(&result), vec!["aa"]);
    }
}
