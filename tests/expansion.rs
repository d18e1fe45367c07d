//! Neighbor expansion against both store backends

mod common;

use common::{chain, diamond, scattered, stores_with, strategies};
use ideamap::{
    Edge, ExpandQuery, Graph, GraphId, GraphPayload, GraphStore, Neighborhood, Node, Scene,
    SearchQuery,
};
use std::collections::HashSet;

fn names(hood: &Neighborhood) -> Vec<&str> {
    hood.node_names()
}

fn edge_ids(hood: &Neighborhood) -> Vec<&str> {
    hood.edges.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn chain_scenario() {
    for (backend, store) in stores_with(&[chain()]) {
        let g = GraphId::from("chain");

        let one = ExpandQuery::from("A").depth(1).execute(store.as_ref(), &g).unwrap();
        assert_eq!(names(&one), vec!["A", "B"], "{backend}");
        assert_eq!(edge_ids(&one), vec!["ab"], "{backend}");

        let two = ExpandQuery::from("A").depth(2).execute(store.as_ref(), &g).unwrap();
        assert_eq!(names(&two), vec!["A", "B", "C"], "{backend}");
        assert_eq!(edge_ids(&two), vec!["ab", "bc"], "{backend}");
    }
}

#[test]
fn diamond_scenario() {
    for (backend, store) in stores_with(&[diamond()]) {
        let hood = ExpandQuery::from("A")
            .depth(2)
            .execute(store.as_ref(), &GraphId::from("diamond"))
            .unwrap();

        assert_eq!(names(&hood), vec!["A", "B", "C", "D"], "{backend}");
        let ids = edge_ids(&hood);
        assert_eq!(ids.len(), 4, "{backend}");
        let unique: HashSet<&str> = ids.into_iter().collect();
        assert_eq!(
            unique,
            HashSet::from(["ab", "ac", "bd", "cd"]),
            "{backend}"
        );
    }
}

#[test]
fn depth_zero_is_start_only() {
    for (backend, store) in stores_with(&[diamond()]) {
        for depth in [0, -3] {
            let hood = ExpandQuery::from("D")
                .depth(depth)
                .execute(store.as_ref(), &GraphId::from("diamond"))
                .unwrap();
            assert_eq!(names(&hood), vec!["D"], "{backend}");
            assert!(hood.edges.is_empty(), "{backend}");
        }
    }
}

#[test]
fn node_sets_grow_with_depth() {
    let graph = scattered(60, 40);
    let id = graph.id.clone();
    for (backend, store) in stores_with(&[graph]) {
        let mut previous: HashSet<String> = HashSet::new();
        for depth in 0..=3 {
            let hood = ExpandQuery::from("n30")
                .depth(depth)
                .execute(store.as_ref(), &id)
                .unwrap();
            let current: HashSet<String> = hood.nodes.iter().map(|n| n.name.clone()).collect();
            assert!(previous.is_subset(&current), "{backend} depth {depth}");
            previous = current;
        }
    }
}

#[test]
fn no_duplicate_edges_on_dense_graph() {
    let graph = scattered(40, 200);
    let id = graph.id.clone();
    for (backend, store) in stores_with(&[graph]) {
        let hood = ExpandQuery::from("n0")
            .depth(3)
            .execute(store.as_ref(), &id)
            .unwrap();
        let ids = edge_ids(&hood);
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len(), "{backend}");

        // Every returned edge touches a returned node
        let nodes: HashSet<&str> = names(&hood).into_iter().collect();
        assert!(hood
            .edges
            .iter()
            .all(|e| nodes.contains(e.source.as_str()) || nodes.contains(e.target.as_str())));
    }
}

#[test]
fn backends_agree() {
    let graph = scattered(80, 60);
    let id = graph.id.clone();
    let results: Vec<(Vec<String>, Vec<String>)> = stores_with(&[graph])
        .into_iter()
        .map(|(_, store)| {
            let hood = ExpandQuery::from("n10")
                .depth(2)
                .execute(store.as_ref(), &id)
                .unwrap();
            (
                hood.nodes.iter().map(|n| n.name.clone()).collect(),
                hood.edges.iter().map(|e| e.id.to_string()).collect(),
            )
        })
        .collect();
    assert_eq!(results[0], results[1]);
}

#[test]
fn strat_search_scenario() {
    for (backend, store) in stores_with(&[strategies()]) {
        let found = SearchQuery::new("strat")
            .execute(store.as_ref(), &GraphId::from("ideas"))
            .unwrap();
        let names: Vec<&str> = found.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Strategy1", "Strategy2"], "{backend}");
    }

    let accented = Graph::new("accents", "Accents")
        .with_node(Node::new("Énergie", "concept"))
        .with_node(Node::new("energy", "concept"));
    for (backend, store) in stores_with(&[accented]) {
        let found = SearchQuery::new("ÉNER")
            .execute(store.as_ref(), &GraphId::from("accents"))
            .unwrap();
        let names: Vec<&str> = found.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Énergie"], "{backend}");
    }
}

/// Every scene edge has both endpoints present and each node's connection
/// count is the number of scene edges touching it, loops counted twice
fn assert_connections_consistent(scene: &Scene, context: &str) {
    let names: HashSet<&str> = scene.nodes().iter().map(|n| n.name()).collect();
    for e in scene.edges() {
        assert!(
            names.contains(e.source.as_str()) && names.contains(e.target.as_str()),
            "{context}: edge {} dangles",
            e.id
        );
    }
    for n in scene.nodes() {
        let touching = scene
            .edges()
            .iter()
            .map(|e| usize::from(e.source == n.name()) + usize::from(e.target == n.name()))
            .sum::<usize>();
        assert_eq!(n.connections, touching, "{context}: node {}", n.name());
    }
}

#[test]
fn connections_match_rendered_edges() {
    let graph = scattered(40, 60)
        .with_edge(Edge::new("n5", "ghost", "points_at"))
        .with_edge(Edge::new("n7", "n7", "reflects"));
    let id = graph.id.clone();

    for (backend, store) in stores_with(&[graph]) {
        for depth in 0..=3 {
            for start in ["n5", "n7", "n20"] {
                let hood = ExpandQuery::from(start)
                    .depth(depth)
                    .execute(store.as_ref(), &id)
                    .unwrap();
                let reached_ghost = hood.edges.iter().any(|e| e.target == "ghost");
                let edge_count = hood.edges.len();

                let scene = Scene::from_payload(GraphPayload::from_neighborhood(id.clone(), hood));
                let context = format!("{backend} {start} depth {depth}");
                assert_connections_consistent(&scene, &context);
                if reached_ghost {
                    assert_eq!(scene.dropped_edges(), 1, "{context}");
                    assert_eq!(scene.edges().len(), edge_count - 1, "{context}");
                }
            }
        }

        let full = store.load_graph(&id).unwrap().unwrap();
        let scene = Scene::from_payload(GraphPayload::from(full));
        assert_connections_consistent(&scene, &format!("{backend} full"));
        assert_eq!(scene.dropped_edges(), 1, "{backend} full");
    }
}

#[test]
fn missing_start_is_not_found() {
    for (backend, store) in stores_with(&[chain()]) {
        let err = ExpandQuery::from("Z")
            .execute(store.as_ref(), &GraphId::from("chain"))
            .unwrap_err();
        assert!(err.is_not_found(), "{backend}");

        let err = ExpandQuery::from("A")
            .execute(store.as_ref(), &GraphId::from("nope"))
            .unwrap_err();
        assert!(err.is_not_found(), "{backend}");
    }
}
