//! Storage backends
//!
//! Graph stores are accessed through the `GraphStore` trait. `SqliteStore` is
//! the persistent backend; `MemoryStore` serves tests and embedding.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{GraphStore, NodeFilter, OpenStore, StorageError, StorageResult};
