//! Common test utilities for ideamap integration tests
//!
//! Fixture graphs plus helpers that load them into each store backend.

#![allow(dead_code)]

pub mod fixtures;

use ideamap::{Graph, GraphStore, MemoryStore, OpenStore, SqliteStore};

pub use fixtures::{chain, diamond, scattered, strategies};

/// Every backend, each loaded with `graphs`
pub fn stores_with(graphs: &[Graph]) -> Vec<(&'static str, Box<dyn GraphStore>)> {
    let memory = MemoryStore::new();
    let sqlite = SqliteStore::open_in_memory().expect("open in-memory sqlite");
    for g in graphs {
        memory.replace_graph(g).expect("memory replace");
        sqlite.replace_graph(g).expect("sqlite replace");
    }
    vec![("memory", Box::new(memory)), ("sqlite", Box::new(sqlite))]
}
