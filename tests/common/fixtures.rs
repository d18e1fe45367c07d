//! Graph fixtures shared across integration tests

use ideamap::{Edge, EdgeId, Graph, Node};

fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge::new(source, target, "relates_to").with_id(EdgeId::from_string(id))
}

/// `A -> B -> C -> D`
pub fn chain() -> Graph {
    Graph::new("chain", "Chain")
        .with_node(Node::new("A", "concept"))
        .with_node(Node::new("B", "concept"))
        .with_node(Node::new("C", "concept"))
        .with_node(Node::new("D", "concept"))
        .with_edge(edge("ab", "A", "B"))
        .with_edge(edge("bc", "B", "C"))
        .with_edge(edge("cd", "C", "D"))
}

/// `A -> B, A -> C, B -> D, C -> D`
pub fn diamond() -> Graph {
    Graph::new("diamond", "Diamond")
        .with_node(Node::new("A", "goal"))
        .with_node(Node::new("B", "strategy"))
        .with_node(Node::new("C", "strategy"))
        .with_node(Node::new("D", "insight"))
        .with_edge(edge("ab", "A", "B"))
        .with_edge(edge("ac", "A", "C"))
        .with_edge(edge("bd", "B", "D"))
        .with_edge(edge("cd", "C", "D"))
}

/// Two strategies resting on one belief
pub fn strategies() -> Graph {
    Graph::new("ideas", "Ideas")
        .with_node(Node::new("Strategy1", "strategy").with_property("priority", 1i64))
        .with_node(Node::new("Strategy2", "strategy"))
        .with_node(Node::new("Belief1", "belief").with_property("confidence", 0.8))
        .with_edge(edge("s1b", "Strategy1", "Belief1"))
        .with_edge(edge("s2b", "Strategy2", "Belief1"))
        .with_edge(edge("bb", "Belief1", "Belief1"))
}

/// Deterministic pseudo-random graph: a spanning path plus extra edges
pub fn scattered(nodes: usize, extra_edges: usize) -> Graph {
    let mut graph = Graph::new(format!("scattered-{nodes}"), "Scattered");
    for i in 0..nodes {
        graph = graph.with_node(Node::new(format!("n{i}"), "concept"));
    }
    for i in 1..nodes {
        graph = graph.with_edge(edge(&format!("p{i}"), &format!("n{}", i - 1), &format!("n{i}")));
    }
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    for k in 0..extra_edges {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let s = (state >> 33) as usize % nodes;
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let t = (state >> 33) as usize % nodes;
        graph = graph.with_edge(edge(&format!("x{k}"), &format!("n{s}"), &format!("n{t}")));
    }
    graph
}
