//! Transport-independent API layer.
//!
//! `GraphApi` is the single entry point for consumer-facing reads. It applies
//! the configured caps (expansion depth, search limit) and maps query errors
//! into `ApiError`. The async `GraphSource` trait is what the view driver
//! fetches through; `GraphApi` implements it by moving the synchronous store
//! calls onto the blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::graph::{Graph, GraphId, GraphSummary, Node};
use crate::query::{ExpandQuery, Neighborhood, QueryError, SearchQuery};
use crate::storage::{GraphStore, StorageError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::GraphNotFound(id) => ApiError::NotFound {
                what: format!("graph {id}"),
            },
            QueryError::NodeNotFound { graph, name } => ApiError::NotFound {
                what: format!("node {name} in graph {graph}"),
            },
            QueryError::Storage(StorageError::GraphNotFound(id)) => ApiError::NotFound {
                what: format!("graph {id}"),
            },
            QueryError::Storage(e) => ApiError::Storage(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct GraphApi {
    store: Arc<dyn GraphStore>,
    max_depth: usize,
    search_limit: usize,
}

impl GraphApi {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            max_depth: crate::query::DEFAULT_MAX_DEPTH,
            search_limit: crate::query::DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Apply the expansion and search caps from configuration
    pub fn with_config(mut self, config: &Config) -> Self {
        self.max_depth = config.expansion.max_depth;
        self.search_limit = config.search.limit;
        self
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    // --- Read ---

    pub fn list_graphs(&self) -> ApiResult<Vec<GraphSummary>> {
        Ok(self.store.list_graphs()?)
    }

    pub fn get_graph(&self, id: &GraphId) -> ApiResult<Graph> {
        self.store
            .load_graph(id)?
            .ok_or_else(|| ApiError::NotFound {
                what: format!("graph {id}"),
            })
    }

    /// Case-insensitive substring match on name, capped at the search limit
    pub fn search_nodes(&self, id: &GraphId, query: &str) -> ApiResult<Vec<Node>> {
        Ok(SearchQuery::new(query)
            .limit(self.search_limit)
            .execute(self.store.as_ref(), id)?)
    }

    /// Bounded expansion around `name`; depth is clamped to the configured
    /// maximum
    pub fn get_neighbors(&self, id: &GraphId, name: &str, depth: i64) -> ApiResult<Neighborhood> {
        Ok(ExpandQuery::from(name)
            .depth(depth)
            .depth_limit(self.max_depth)
            .execute(self.store.as_ref(), id)?)
    }

    // --- Write ---

    /// Full replace of one graph
    pub fn import_graph(&self, graph: &Graph) -> ApiResult<GraphSummary> {
        self.store.replace_graph(graph)?;
        let summary = self
            .store
            .list_graphs()?
            .into_iter()
            .find(|s| s.id == graph.id)
            .ok_or_else(|| ApiError::NotFound {
                what: format!("graph {}", graph.id),
            })?;
        info!(
            graph = %summary.id,
            nodes = summary.node_count,
            edges = summary.rel_count,
            "imported graph"
        );
        Ok(summary)
    }
}

/// Asynchronous read surface consumed by the view driver
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn list_graphs(&self) -> ApiResult<Vec<GraphSummary>>;

    async fn get_graph(&self, id: &GraphId) -> ApiResult<Graph>;

    async fn search_nodes(&self, id: &GraphId, query: &str) -> ApiResult<Vec<Node>>;

    async fn get_neighbors(&self, id: &GraphId, name: &str, depth: i64)
        -> ApiResult<Neighborhood>;
}

#[async_trait]
impl GraphSource for GraphApi {
    async fn list_graphs(&self) -> ApiResult<Vec<GraphSummary>> {
        let api = self.clone();
        tokio::task::spawn_blocking(move || GraphApi::list_graphs(&api)).await?
    }

    async fn get_graph(&self, id: &GraphId) -> ApiResult<Graph> {
        let api = self.clone();
        let id = id.clone();
        tokio::task::spawn_blocking(move || GraphApi::get_graph(&api, &id)).await?
    }

    async fn search_nodes(&self, id: &GraphId, query: &str) -> ApiResult<Vec<Node>> {
        let api = self.clone();
        let id = id.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || GraphApi::search_nodes(&api, &id, &query)).await?
    }

    async fn get_neighbors(
        &self,
        id: &GraphId,
        name: &str,
        depth: i64,
    ) -> ApiResult<Neighborhood> {
        let api = self.clone();
        let id = id.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || GraphApi::get_neighbors(&api, &id, &name, depth))
            .await?
    }
}
