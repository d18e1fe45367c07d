//! Read queries over a graph store
//!
//! Bounded neighbor expansion and name search, both scoped to one graph.

mod expand;
mod search;
mod types;

pub use expand::{ExpandQuery, DEFAULT_MAX_DEPTH};
pub use search::{SearchQuery, DEFAULT_SEARCH_LIMIT};
pub use types::{Neighborhood, QueryError, QueryResult};
