//! Node search by name

use super::types::{QueryError, QueryResult};
use crate::graph::{GraphId, Node};
use crate::storage::{GraphStore, NodeFilter};

/// Default cap on search results
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Case-insensitive substring search over node names
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Execute the search; all-whitespace text matches nothing, any other
    /// text is matched as given, surrounding spaces included
    pub fn execute(&self, store: &dyn GraphStore, graph: &GraphId) -> QueryResult<Vec<Node>> {
        if !store.has_graph(graph)? {
            return Err(QueryError::GraphNotFound(graph.clone()));
        }
        if self.text.trim().is_empty() || self.limit == 0 {
            return Ok(Vec::new());
        }

        let filter = NodeFilter::new()
            .with_name_containing(self.text.as_str())
            .with_limit(self.limit);
        Ok(store.find_nodes(graph, &filter)?)
    }
}
