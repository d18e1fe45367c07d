//! Serialization tests against the wire payloads ingestion produces

use serde_json::{json, Value};

/// Fixture: a full graph payload as returned by `getGraph`
fn graph_fixture() -> Value {
    json!({
        "id": "personal",
        "name": "Personal ideas",
        "updatedAt": 1_717_200_000_000_i64,
        "nodes": [
            {
                "id": "7f1c",
                "name": "Strategy1",
                "type": "strategy",
                "properties": { "horizon": "5y", "priority": 2 },
                "createdAt": "2024-05-01T09:00:00Z",
                "updatedAt": 1_717_200_000
            },
            {
                "id": "9a2e",
                "name": "Belief1",
                "type": "mystery-type",
                "properties": {}
            }
        ],
        "edges": [
            {
                "id": "e-1",
                "source": "Strategy1",
                "target": "Belief1",
                "type": "rests_on",
                "properties": { "weight": 0.5 }
            },
            {
                "id": "e-2",
                "source": "Strategy1",
                "target": "Ghost",
                "type": "mentions"
            }
        ]
    })
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::graph::{EdgeId, Graph, NodeCategory, NodeId, PropertyValue};

    #[test]
    fn graph_payload_deserializes() {
        let graph: Graph = serde_json::from_value(graph_fixture()).unwrap();

        assert_eq!(graph.id.as_str(), "personal");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 2);

        let strategy = graph.node("Strategy1").unwrap();
        assert_eq!(strategy.id, NodeId::from_string("7f1c"));
        assert_eq!(strategy.category(), NodeCategory::Strategy);
        assert_eq!(strategy.properties["priority"], PropertyValue::Int(2));
        assert_eq!(
            strategy.updated_at.unwrap().display(),
            "2024-06-01 00:00 UTC"
        );
        assert_eq!(graph.updated_at, strategy.updated_at);

        assert_eq!(graph.node("Belief1").unwrap().category(), NodeCategory::Other);
    }

    #[test]
    fn dangling_edges_are_accepted_at_construction() {
        let graph: Graph = serde_json::from_value(graph_fixture()).unwrap();
        let ghost_edge = graph.edges.iter().find(|e| e.target == "Ghost").unwrap();
        assert_eq!(ghost_edge.id, EdgeId::from_string("e-2"));
        assert!(ghost_edge.properties.is_empty());
    }

    #[test]
    fn graph_round_trips_through_json() {
        let graph: Graph = serde_json::from_value(graph_fixture()).unwrap();
        let text = serde_json::to_string(&graph).unwrap();
        let back: Graph = serde_json::from_str(&text).unwrap();
        assert_eq!(graph, back);
    }

    #[test]
    fn missing_ids_are_generated() {
        let graph: Graph = serde_json::from_value(json!({
            "id": "g",
            "name": "g",
            "nodes": [{ "name": "A" }, { "name": "B" }],
            "edges": [{ "source": "A", "target": "B" }]
        }))
        .unwrap();
        assert_ne!(graph.nodes[0].id, graph.nodes[1].id);
        assert!(!graph.edges[0].id.as_str().is_empty());
        assert_eq!(graph.edges[0].relation, "");
    }
}
