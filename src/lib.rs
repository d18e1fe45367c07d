//! Ideamap: interactive knowledge-graph explorer
//!
//! Stores named graphs of ideas (nodes) and typed relations (edges), answers
//! bounded "expand from this node" queries, and lays graphs out with a
//! force-directed simulation behind a zoomable, searchable view.
//!
//! # Core Concepts
//!
//! - **Graphs**: named node/edge sets, replaced wholesale on ingestion
//! - **Expansion**: breadth-first neighborhood of a node, up to a capped depth
//! - **Views**: an owned [`GraphView`] per rendered graph, stepped by a
//!   [`ViewDriver`] that also applies asynchronous fetch results
//!
//! # Example
//!
//! ```
//! use ideamap::{Edge, ExpandQuery, Graph, GraphId, GraphStore, MemoryStore, Node};
//!
//! let store = MemoryStore::new();
//! store
//!     .replace_graph(
//!         &Graph::new("g", "ideas")
//!             .with_node(Node::new("A", "concept"))
//!             .with_node(Node::new("B", "belief"))
//!             .with_edge(Edge::new("A", "B", "supports")),
//!     )
//!     .unwrap();
//!
//! let hood = ExpandQuery::from("B").depth(1).execute(&store, &GraphId::from("g")).unwrap();
//! assert_eq!(hood.node_names(), vec!["B", "A"]);
//! ```

pub mod api;
pub mod config;
pub mod driver;
mod graph;
pub mod layout;
pub mod query;
pub mod scene;
pub mod storage;
pub mod view;
pub mod viewer;

pub use api::{ApiError, ApiResult, GraphApi, GraphSource};
pub use config::{Config, ConfigError};
pub use driver::{Command, Outcome, Step, ViewDriver};
pub use graph::{
    Edge, EdgeId, Graph, GraphId, GraphSummary, Node, NodeCategory, NodeId, Properties,
    PropertyValue, Timestamp,
};
pub use layout::{Body, LayoutParams, LayoutTier, Simulation};
pub use query::{ExpandQuery, Neighborhood, QueryError, QueryResult, SearchQuery};
pub use scene::{GraphPayload, Scene, SceneNode};
pub use storage::{
    GraphStore, MemoryStore, NodeFilter, OpenStore, SqliteStore, StorageError, StorageResult,
};
pub use view::{Bounds, Emphasis, Highlight, Minimap, Point, Size, ViewTransform};
pub use viewer::{Frame, GraphView, ViewState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
