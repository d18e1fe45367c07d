//! Graph: a named node/edge set, replaced wholesale on each ingestion

use super::edge::Edge;
use super::node::Node;
use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a named graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GraphId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A complete graph as fetched from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub id: GraphId,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Graph {
    pub fn new(id: impl Into<GraphId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            updated_at: Some(Timestamp::now()),
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Find a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Aggregate view as listed by the store
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            node_count: self.nodes.len(),
            rel_count: self.edges.len(),
            updated_at: self.updated_at,
            top_type: top_type(self.nodes.iter().map(|n| n.node_type.as_str())),
        }
    }
}

/// Cached aggregate description of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub id: GraphId,
    pub name: String,
    #[serde(rename = "nodeCount")]
    pub node_count: usize,
    #[serde(rename = "relCount")]
    pub rel_count: usize,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Most frequent node type
    #[serde(rename = "topType", default, skip_serializing_if = "Option::is_none")]
    pub top_type: Option<String>,
}

/// Most frequent value; ties go to the lexicographically smallest
fn top_type<'a>(types: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in types {
        *counts.entry(t).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| b_name.cmp(a_name)))
        .map(|(name, _)| name.to_string())
}
