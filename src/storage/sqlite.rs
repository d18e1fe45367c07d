//! SQLite storage backend

use super::traits::{dedupe_payload, GraphStore, NodeFilter, OpenStore, StorageError, StorageResult};
use crate::graph::{Edge, EdgeId, Graph, GraphId, GraphSummary, Node, NodeId, Timestamp};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Upper bound on bound parameters per `IN (...)` query
const IN_CHUNK: usize = 500;

const NODE_COLUMNS: &str = "id, name, node_type, properties_json, created_at, updated_at";
const EDGE_COLUMNS: &str = "id, source, target, relation, properties_json";

/// Raw columns of `NODE_COLUMNS`
type NodeRow = (String, String, String, String, Option<String>, Option<String>);
/// Raw columns of `EDGE_COLUMNS`
type EdgeRow = (String, String, String, String, String);

/// SQLite-backed graph store
///
/// Uses a single SQLite database file with tables for graphs, nodes, and
/// edges. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Graphs table (aggregates refreshed on every full replace)
            CREATE TABLE IF NOT EXISTS graphs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                updated_at TEXT,
                node_count INTEGER NOT NULL,
                rel_count INTEGER NOT NULL,
                top_type TEXT
            );

            -- Nodes table; name is the link key, id is opaque
            CREATE TABLE IF NOT EXISTS nodes (
                seq INTEGER PRIMARY KEY,
                graph_id TEXT NOT NULL,
                id TEXT NOT NULL,
                name TEXT NOT NULL,
                node_type TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                created_at TEXT,
                updated_at TEXT,
                UNIQUE (graph_id, name),
                FOREIGN KEY (graph_id) REFERENCES graphs(id) ON DELETE CASCADE
            );

            -- Edges table; endpoints are node names and may dangle
            CREATE TABLE IF NOT EXISTS edges (
                seq INTEGER PRIMARY KEY,
                graph_id TEXT NOT NULL,
                id TEXT NOT NULL,
                source TEXT NOT NULL,
                target TEXT NOT NULL,
                relation TEXT NOT NULL,
                properties_json TEXT NOT NULL,
                UNIQUE (graph_id, id),
                FOREIGN KEY (graph_id) REFERENCES graphs(id) ON DELETE CASCADE
            );

            -- Indexes for batched frontier lookups in both directions
            CREATE INDEX IF NOT EXISTS idx_edges_source
                ON edges(graph_id, source);
            CREATE INDEX IF NOT EXISTS idx_edges_target
                ON edges(graph_id, target);

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Register `fold_case(text)`: Unicode lowercase, matching the
    /// in-memory store's name filter. SQLite's own `lower()` folds ASCII only.
    fn register_functions(conn: &Connection) -> StorageResult<()> {
        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: String = ctx.get(0)?;
                Ok(text.to_lowercase())
            },
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn parse_timestamp(raw: Option<String>) -> StorageResult<Option<Timestamp>> {
        match raw {
            None => Ok(None),
            Some(s) => Timestamp::parse(&s)
                .map(Some)
                .ok_or(StorageError::DateParse(s)),
        }
    }

    fn read_node_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    /// Deserialize a node from database columns
    fn row_to_node(
        (id, name, node_type, properties_json, created_at, updated_at): NodeRow,
    ) -> StorageResult<Node> {
        Ok(Node {
            id: NodeId::from_string(id),
            name,
            node_type,
            properties: serde_json::from_str(&properties_json)?,
            created_at: Self::parse_timestamp(created_at)?,
            updated_at: Self::parse_timestamp(updated_at)?,
        })
    }

    fn read_edge_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    /// Deserialize an edge from database columns
    fn row_to_edge(
        (id, source, target, relation, properties_json): EdgeRow,
    ) -> StorageResult<Edge> {
        Ok(Edge {
            id: EdgeId::from_string(id),
            source,
            target,
            relation,
            properties: serde_json::from_str(&properties_json)?,
        })
    }

    fn query_nodes(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<Node>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::read_node_row)?;
        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(Self::row_to_node(row?)?);
        }
        Ok(nodes)
    }

    fn query_edges(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StorageResult<Vec<(i64, Edge)>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            let seq: i64 = row.get(5)?;
            Ok((seq, Self::read_edge_row(row)?))
        })?;
        let mut edges = Vec::new();
        for row in rows {
            let (seq, cols) = row?;
            edges.push((seq, Self::row_to_edge(cols)?));
        }
        Ok(edges)
    }

    /// Edges whose `column` (source or target) is in `names`, chunked to stay
    /// under SQLite's bound-parameter limit, returned in insertion order
    fn edges_by_endpoint(
        &self,
        id: &GraphId,
        column: &str,
        names: &[String],
    ) -> StorageResult<Vec<Edge>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let mut collected: Vec<(i64, Edge)> = Vec::new();

        for chunk in names.chunks(IN_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT {EDGE_COLUMNS}, seq FROM edges
                 WHERE graph_id = ? AND {column} IN ({placeholders})
                 ORDER BY seq"
            );
            let graph_id = id.as_str().to_string();
            let mut params: Vec<&dyn rusqlite::ToSql> = vec![&graph_id as &dyn rusqlite::ToSql];
            params.extend(chunk.iter().map(|s| s as &dyn rusqlite::ToSql));
            collected.extend(Self::query_edges(&conn, &sql, &params)?);
        }

        if names.len() > IN_CHUNK {
            collected.sort_by_key(|(seq, _)| *seq);
        }
        debug!(graph = %id, column, frontier = names.len(), edges = collected.len(), "edge lookup");
        Ok(collected.into_iter().map(|(_, e)| e).collect())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::register_functions(&conn)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::register_functions(&conn)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteStore {
    // === Graph Operations ===

    fn replace_graph(&self, graph: &Graph) -> StorageResult<()> {
        let graph = dedupe_payload(graph);
        let summary = graph.summary();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Full replace: children go first, the graph row is then upserted
        tx.execute("DELETE FROM edges WHERE graph_id = ?1", params![graph.id.as_str()])?;
        tx.execute("DELETE FROM nodes WHERE graph_id = ?1", params![graph.id.as_str()])?;
        tx.execute(
            r#"
            INSERT INTO graphs (id, name, updated_at, node_count, rel_count, top_type)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at,
                node_count = excluded.node_count,
                rel_count = excluded.rel_count,
                top_type = excluded.top_type
            "#,
            params![
                graph.id.as_str(),
                graph.name,
                graph.updated_at.map(|t| t.to_rfc3339()),
                summary.node_count as i64,
                summary.rel_count as i64,
                summary.top_type,
            ],
        )?;

        {
            let mut insert_node = tx.prepare(
                r#"
                INSERT INTO nodes (graph_id, id, name, node_type, properties_json, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for node in &graph.nodes {
                insert_node.execute(params![
                    graph.id.as_str(),
                    node.id.as_str(),
                    node.name,
                    node.node_type,
                    serde_json::to_string(&node.properties)?,
                    node.created_at.map(|t| t.to_rfc3339()),
                    node.updated_at.map(|t| t.to_rfc3339()),
                ])?;
            }

            let mut insert_edge = tx.prepare(
                r#"
                INSERT INTO edges (graph_id, id, source, target, relation, properties_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for edge in &graph.edges {
                insert_edge.execute(params![
                    graph.id.as_str(),
                    edge.id.as_str(),
                    edge.source,
                    edge.target,
                    edge.relation,
                    serde_json::to_string(&edge.properties)?,
                ])?;
            }
        }

        tx.commit()?;
        debug!(graph = %graph.id, nodes = summary.node_count, edges = summary.rel_count, "graph replaced");
        Ok(())
    }

    fn load_graph(&self, id: &GraphId) -> StorageResult<Option<Graph>> {
        let conn = self.conn()?;

        let graph_row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT name, updated_at FROM graphs WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((name, updated_at)) = graph_row else {
            return Ok(None);
        };

        let graph_id = id.as_str().to_string();
        let nodes = Self::query_nodes(
            &conn,
            &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE graph_id = ?1 ORDER BY seq"),
            &[&graph_id as &dyn rusqlite::ToSql],
        )?;
        let edges = Self::query_edges(
            &conn,
            &format!("SELECT {EDGE_COLUMNS}, seq FROM edges WHERE graph_id = ?1 ORDER BY seq"),
            &[&graph_id as &dyn rusqlite::ToSql],
        )?
        .into_iter()
        .map(|(_, e)| e)
        .collect();

        Ok(Some(Graph {
            id: id.clone(),
            name,
            nodes,
            edges,
            updated_at: Self::parse_timestamp(updated_at)?,
        }))
    }

    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM graphs WHERE id = ?1", params![id.as_str()])?;
        Ok(rows > 0)
    }

    fn list_graphs(&self) -> StorageResult<Vec<GraphSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, updated_at, node_count, rel_count, top_type FROM graphs ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut graphs = Vec::new();
        for row in rows {
            let (id, name, updated_at, node_count, rel_count, top_type) = row?;
            graphs.push(GraphSummary {
                id: GraphId::from_string(id),
                name,
                node_count: node_count as usize,
                rel_count: rel_count as usize,
                updated_at: Self::parse_timestamp(updated_at)?,
                top_type,
            });
        }
        Ok(graphs)
    }

    fn has_graph(&self, id: &GraphId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM graphs WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    // === Node Operations ===

    fn find_node(&self, id: &GraphId, name: &str) -> StorageResult<Option<Node>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE graph_id = ?1 AND name = ?2"),
                params![id.as_str(), name],
                Self::read_node_row,
            )
            .optional()?;
        row.map(Self::row_to_node).transpose()
    }

    fn load_nodes(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Node>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn()?;
        let graph_id = id.as_str().to_string();
        let mut nodes = Vec::with_capacity(names.len());

        for chunk in names.chunks(IN_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT {NODE_COLUMNS} FROM nodes WHERE graph_id = ? AND name IN ({placeholders})"
            );
            let mut params: Vec<&dyn rusqlite::ToSql> = vec![&graph_id as &dyn rusqlite::ToSql];
            params.extend(chunk.iter().map(|s| s as &dyn rusqlite::ToSql));
            nodes.extend(Self::query_nodes(&conn, &sql, &params)?);
        }
        Ok(nodes)
    }

    fn find_nodes(&self, id: &GraphId, filter: &NodeFilter) -> StorageResult<Vec<Node>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE graph_id = ?");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(id.as_str().to_string())];

        if let Some(ref needle) = filter.name_contains {
            // instr() keeps LIKE wildcards in user input literal
            sql.push_str(" AND instr(fold_case(name), ?) > 0");
            params_vec.push(Box::new(needle.to_lowercase()));
        }

        sql.push_str(" ORDER BY name");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        Self::query_nodes(&conn, &sql, &params_refs)
    }

    // === Edge Operations ===

    fn edges_from_any(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Edge>> {
        self.edges_by_endpoint(id, "source", names)
    }

    fn edges_to_any(&self, id: &GraphId, names: &[String]) -> StorageResult<Vec<Edge>> {
        self.edges_by_endpoint(id, "target", names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn create_test_graph() -> Graph {
        Graph::new("g1", "Test graph")
            .with_node(Node::new("A", "concept").with_property("note", "first"))
            .with_node(Node::new("B", "belief"))
            .with_node(Node::new("C", "belief"))
            .with_edge(Edge::new("A", "B", "supports"))
            .with_edge(Edge::new("B", "C", "refines"))
            .with_edge(Edge::new("C", "Ghost", "mentions"))
    }

    #[test]
    fn test_replace_and_load_graph() {
        let store = create_test_store();
        let graph = create_test_graph();
        store.replace_graph(&graph).unwrap();

        let loaded = store.load_graph(&graph.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Test graph");
        assert_eq!(loaded.nodes.len(), 3);
        assert_eq!(loaded.edges.len(), 3);
        assert_eq!(loaded.nodes[0].name, "A");
        assert_eq!(loaded.nodes[0].properties, graph.nodes[0].properties);
        assert_eq!(loaded.edges, graph.edges);
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = create_test_store();
        store.replace_graph(&create_test_graph()).unwrap();

        let smaller = Graph::new("g1", "Renamed").with_node(Node::new("Z", "goal"));
        store.replace_graph(&smaller).unwrap();

        let loaded = store.load_graph(&GraphId::from("g1")).unwrap().unwrap();
        assert_eq!(loaded.name, "Renamed");
        assert_eq!(loaded.nodes.len(), 1);
        assert!(loaded.edges.is_empty());

        let summaries = store.list_graphs().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].node_count, 1);
        assert_eq!(summaries[0].rel_count, 0);
        assert_eq!(summaries[0].top_type.as_deref(), Some("goal"));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let store = create_test_store();
        let graph = Graph::new("g1", "dups")
            .with_node(Node::new("A", "concept"))
            .with_node(Node::new("A", "belief"));
        store.replace_graph(&graph).unwrap();

        let a = store.find_node(&graph.id, "A").unwrap().unwrap();
        assert_eq!(a.node_type, "concept");
        assert_eq!(store.list_graphs().unwrap()[0].node_count, 1);
    }

    #[test]
    fn test_missing_graph_loads_none() {
        let store = create_test_store();
        let id = GraphId::from("nope");
        assert!(store.load_graph(&id).unwrap().is_none());
        assert!(!store.has_graph(&id).unwrap());
        assert!(store.find_node(&id, "A").unwrap().is_none());
    }

    #[test]
    fn test_delete_graph_cascades() {
        let store = create_test_store();
        let graph = create_test_graph();
        store.replace_graph(&graph).unwrap();

        assert!(store.delete_graph(&graph.id).unwrap());
        assert!(!store.delete_graph(&graph.id).unwrap());
        assert!(store.find_node(&graph.id, "A").unwrap().is_none());
        assert!(store
            .edges_from_any(&graph.id, &["A".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_batched_edge_lookups() {
        let store = create_test_store();
        let graph = create_test_graph();
        store.replace_graph(&graph).unwrap();

        let names = vec!["A".to_string(), "B".to_string()];
        let out = store.edges_from_any(&graph.id, &names).unwrap();
        let rels: Vec<_> = out.iter().map(|e| e.relation.as_str()).collect();
        assert_eq!(rels, vec!["supports", "refines"]);

        let incoming = store.edges_to_any(&graph.id, &["Ghost".to_string()]).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source, "C");
    }

    #[test]
    fn test_lookup_across_chunks_preserves_insertion_order() {
        let store = create_test_store();
        let mut graph = Graph::new("big", "big");
        let mut names = Vec::new();
        for i in 0..(IN_CHUNK + 20) {
            let name = format!("n{i}");
            graph = graph.with_node(Node::new(name.clone(), "concept"));
            graph = graph.with_edge(Edge::new(name.clone(), "hub", "links"));
            names.push(name);
        }
        store.replace_graph(&graph).unwrap();

        // Reverse so the second chunk holds the earliest edges
        names.reverse();
        let edges = store.edges_from_any(&graph.id, &names).unwrap();
        assert_eq!(edges.len(), IN_CHUNK + 20);
        assert_eq!(edges[0].source, "n0");
        assert_eq!(edges.last().unwrap().source, format!("n{}", IN_CHUNK + 19));
    }

    #[test]
    fn test_find_nodes_substring_case_insensitive() {
        let store = create_test_store();
        let graph = Graph::new("g", "g")
            .with_node(Node::new("Strategy2", "strategy"))
            .with_node(Node::new("Belief1", "belief"))
            .with_node(Node::new("Strategy1", "strategy"))
            .with_node(Node::new("100%_sure", "belief"))
            .with_node(Node::new("Énergie", "concept"));
        store.replace_graph(&graph).unwrap();

        let hits = store
            .find_nodes(&graph.id, &NodeFilter::new().with_name_containing("STRAT"))
            .unwrap();
        let names: Vec<_> = hits.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Strategy1", "Strategy2"]);

        let limited = store
            .find_nodes(&graph.id, &NodeFilter::new().with_name_containing("strat").with_limit(1))
            .unwrap();
        assert_eq!(limited.len(), 1);

        // Wildcards are literal
        let pct = store
            .find_nodes(&graph.id, &NodeFilter::new().with_name_containing("%"))
            .unwrap();
        assert_eq!(pct.len(), 1);

        // Folding is not limited to ASCII
        let accented = store
            .find_nodes(&graph.id, &NodeFilter::new().with_name_containing("éNER"))
            .unwrap();
        assert_eq!(accented.len(), 1);
        assert_eq!(accented[0].name, "Énergie");
    }

    #[test]
    fn test_timestamps_persist() {
        let store = create_test_store();
        let mut node = Node::new("A", "concept");
        node.updated_at = Timestamp::parse("2024-03-01T12:30:00Z");
        let graph = Graph::new("g", "g").with_node(node.clone());
        store.replace_graph(&graph).unwrap();

        let loaded = store.find_node(&graph.id, "A").unwrap().unwrap();
        assert_eq!(loaded.updated_at, node.updated_at);
        assert_eq!(loaded.created_at, node.created_at);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ideamap.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.replace_graph(&create_test_graph()).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.has_graph(&GraphId::from("g1")).unwrap());
        assert_eq!(store.list_graphs().unwrap()[0].rel_count, 3);
    }
}
