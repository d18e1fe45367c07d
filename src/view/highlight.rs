//! Search highlight partition
//!
//! Purely presentational: emphasis never feeds back into layout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::scene::Scene;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    #[default]
    Neutral,
    Highlighted,
    Faded,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    matches: HashSet<String>,
}

impl Highlight {
    /// Replace the match set; an empty set clears all emphasis
    pub fn apply<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matches = names.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.matches.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn matches(&self) -> &HashSet<String> {
        &self.matches
    }

    pub fn node(&self, name: &str) -> Emphasis {
        if !self.is_active() {
            Emphasis::Neutral
        } else if self.matches.contains(name) {
            Emphasis::Highlighted
        } else {
            Emphasis::Faded
        }
    }

    /// Highlighted when either endpoint matches, faded when neither does
    pub fn edge(&self, source: &str, target: &str) -> Emphasis {
        if !self.is_active() {
            Emphasis::Neutral
        } else if self.matches.contains(source) || self.matches.contains(target) {
            Emphasis::Highlighted
        } else {
            Emphasis::Faded
        }
    }

    pub fn partition(&self, scene: &Scene) -> Partition {
        Partition {
            nodes: scene.nodes().iter().map(|n| self.node(n.name())).collect(),
            edges: scene
                .edges()
                .iter()
                .map(|e| self.edge(&e.source, &e.target))
                .collect(),
        }
    }
}

/// Emphasis per node and per edge, in scene order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub nodes: Vec<Emphasis>,
    pub edges: Vec<Emphasis>,
}

impl Partition {
    pub fn is_neutral(&self) -> bool {
        self.nodes
            .iter()
            .chain(self.edges.iter())
            .all(|e| *e == Emphasis::Neutral)
    }
}
