//! Edge representation: a typed, directed relation between two node names

use super::node::Properties;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable per-edge identity
///
/// Parallel edges between the same pair (even with the same relation) carry
/// distinct ids, so deduplication by id never collapses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge between two nodes, referenced by name
///
/// Endpoints are not validated on construction; edges whose endpoints are
/// missing from the active node set are dropped when a scene is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: EdgeId,
    /// Source node name
    pub source: String,
    /// Target node name
    pub target: String,
    /// Relation label (e.g. "supports", "contradicts")
    #[serde(rename = "type", default)]
    pub relation: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    /// Create a new edge
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_id(mut self, id: EdgeId) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parallel_edges_get_distinct_ids() {
        let a = Edge::new("A", "B", "supports");
        let b = Edge::new("A", "B", "supports");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn deserializes_wire_shape() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source": "A",
            "target": "B",
            "type": "supports"
        }))
        .unwrap();
        assert_eq!(edge.id, EdgeId::from_string("e1"));
        assert_eq!(edge.relation, "supports");
        assert_eq!((edge.source.as_str(), edge.target.as_str()), ("A", "B"));
    }
}
