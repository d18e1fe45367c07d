//! Renderable subgraph
//!
//! A `Scene` is the node/edge set a view actually draws: duplicate names are
//! collapsed (first wins), edges with a missing endpoint are dropped, and
//! each node carries its rendered degree.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::graph::{Edge, Graph, GraphId, Node};
use crate::query::Neighborhood;

/// Nodes and edges fetched for one graph, ready to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(rename = "graphId")]
    pub graph_id: GraphId,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphPayload {
    pub fn new(graph_id: impl Into<GraphId>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            graph_id: graph_id.into(),
            nodes,
            edges,
        }
    }

    pub fn from_neighborhood(graph_id: GraphId, hood: Neighborhood) -> Self {
        Self {
            graph_id,
            nodes: hood.nodes,
            edges: hood.edges,
        }
    }
}

impl From<Graph> for GraphPayload {
    fn from(graph: Graph) -> Self {
        Self {
            graph_id: graph.id,
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

/// A node with its degree in the rendered edge set
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub node: Node,
    /// Rendered edges touching this node; a self-loop counts twice
    pub connections: usize,
}

impl SceneNode {
    pub fn name(&self) -> &str {
        &self.node.name
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    edges: Vec<Edge>,
    index: HashMap<String, usize>,
    dropped_edges: usize,
}

impl Scene {
    pub fn build(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut scene_nodes: Vec<SceneNode> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.name) {
                continue;
            }
            index.insert(node.name.clone(), scene_nodes.len());
            scene_nodes.push(SceneNode {
                node,
                connections: 0,
            });
        }

        let total = edges.len();
        let mut kept = Vec::with_capacity(total);
        for edge in edges {
            let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            scene_nodes[s].connections += 1;
            scene_nodes[t].connections += 1;
            kept.push(edge);
        }

        let dropped_edges = total - kept.len();
        if dropped_edges > 0 {
            trace!(dropped = dropped_edges, "dropped edges with missing endpoints");
        }

        Self {
            nodes: scene_nodes,
            edges: kept,
            index,
            dropped_edges,
        }
    }

    pub fn from_payload(payload: GraphPayload) -> Self {
        Self::build(payload.nodes, payload.edges)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a node in `nodes()`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.index_of(name).map(|i| &self.nodes[i])
    }

    /// Edge endpoints as indices into `nodes()`
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .filter_map(|e| Some((self.index_of(&e.source)?, self.index_of(&e.target)?)))
            .collect()
    }

    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    /// Count of nodes per type, for a legend
    pub fn node_types(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for n in &self.nodes {
            *counts.entry(n.node.node_type.clone()).or_insert(0) += 1;
        }
        counts
    }
}
