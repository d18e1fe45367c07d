//! Node representation in the knowledge graph

use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opaque storage identifier for a node
///
/// Never used for traversal or layout lookups; those are keyed by
/// [`Node::name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display category derived from the open `node_type` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Concept,
    Belief,
    Strategy,
    Goal,
    Insight,
    Person,
    Project,
    Source,
    /// Fallback for any type not listed above
    Other,
}

impl NodeCategory {
    /// Classify a raw node type; unknown values fall back to `Other`
    pub fn classify(node_type: &str) -> Self {
        match node_type.trim().to_ascii_lowercase().as_str() {
            "concept" => Self::Concept,
            "belief" => Self::Belief,
            "strategy" => Self::Strategy,
            "goal" => Self::Goal,
            "insight" => Self::Insight,
            "person" => Self::Person,
            "project" => Self::Project,
            "source" => Self::Source,
            _ => Self::Other,
        }
    }
}

/// Typed property values
///
/// Properties are an open mapping rendered generically by the presentation
/// layer, so any JSON-shaped value is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Flat, human-readable rendering
    pub fn display(&self) -> String {
        match self {
            PropertyValue::Null => String::new(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Array(items) => items
                .iter()
                .map(PropertyValue::display)
                .collect::<Vec<_>>()
                .join(", "),
            PropertyValue::Object(map) => map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v.display()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// Properties collection
pub type Properties = BTreeMap<String, PropertyValue>;

/// A node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Storage identifier
    #[serde(default)]
    pub id: NodeId,
    /// Unique name within a graph; the traversal and layout key
    pub name: String,
    /// Open type label (e.g. "belief", "strategy")
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Node {
    /// Create a new node with the given name and type
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            node_type: node_type.into(),
            properties: Properties::new(),
            created_at: Some(Timestamp::now()),
            updated_at: None,
        }
    }

    /// Add a property to the node
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the storage id
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn category(&self) -> NodeCategory {
        NodeCategory::classify(&self.node_type)
    }
}
