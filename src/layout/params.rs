//! Layout parameters, tiered by graph size

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// Size class of a graph for layout purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutTier {
    Small,
    Medium,
    Large,
}

impl LayoutTier {
    /// Large above `large_threshold`, medium from `medium_threshold` up
    pub fn for_node_count(nodes: usize, config: &LayoutConfig) -> Self {
        if nodes > config.large_threshold {
            LayoutTier::Large
        } else if nodes >= config.medium_threshold {
            LayoutTier::Medium
        } else {
            LayoutTier::Small
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub tier: LayoutTier,
    /// Rest length of link springs
    pub link_distance: f64,
    /// Many-body strength; negative repels
    pub repulsion_strength: f64,
    pub alpha_decay: f64,
    /// Ticks run synchronously before the first frame
    pub warm_up_ticks: usize,
    /// Fraction of velocity lost per tick
    pub velocity_decay: f64,
    pub alpha_min: f64,
    pub center_strength: f64,
    /// Added to each body's radius for collision
    pub collision_margin: f64,
    pub collision_strength: f64,
    /// Barnes-Hut opening angle
    pub theta: f64,
    /// Floor on repulsion distance
    pub distance_min: f64,
}

/// Alpha target while a node is dragged, and the floor applied on resize
pub const REHEAT_ALPHA: f64 = 0.3;

impl LayoutParams {
    pub fn for_node_count(nodes: usize) -> Self {
        Self::for_tier(LayoutTier::for_node_count(nodes, &LayoutConfig::default()))
    }

    pub fn from_config(nodes: usize, config: &LayoutConfig) -> Self {
        Self::for_tier(LayoutTier::for_node_count(nodes, config))
    }

    pub fn for_tier(tier: LayoutTier) -> Self {
        let (link_distance, repulsion_strength, alpha_decay, warm_up_ticks) = match tier {
            LayoutTier::Large => (40.0, -100.0, 0.05, 100),
            LayoutTier::Medium => (80.0, -200.0, 0.0228, 0),
            LayoutTier::Small => (120.0, -400.0, 0.0228, 0),
        };
        Self {
            tier,
            link_distance,
            repulsion_strength,
            alpha_decay,
            warm_up_ticks,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            center_strength: 0.05,
            collision_margin: 5.0,
            collision_strength: 0.7,
            theta: 0.9,
            distance_min: 1.0,
        }
    }
}

/// Drawn radius grows with the square root of degree
pub fn node_radius(connections: usize) -> f64 {
    5.0 + 2.0 * (connections as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(LayoutParams::for_node_count(0).tier, LayoutTier::Small);
        assert_eq!(LayoutParams::for_node_count(99).tier, LayoutTier::Small);
        assert_eq!(LayoutParams::for_node_count(100).tier, LayoutTier::Medium);
        assert_eq!(LayoutParams::for_node_count(200).tier, LayoutTier::Medium);
        assert_eq!(LayoutParams::for_node_count(201).tier, LayoutTier::Large);
    }

    #[test]
    fn test_tier_constants() {
        let large = LayoutParams::for_tier(LayoutTier::Large);
        assert_eq!(large.link_distance, 40.0);
        assert_eq!(large.repulsion_strength, -100.0);
        assert_eq!(large.alpha_decay, 0.05);
        assert_eq!(large.warm_up_ticks, 100);

        let small = LayoutParams::for_tier(LayoutTier::Small);
        assert_eq!(small.link_distance, 120.0);
        assert_eq!(small.repulsion_strength, -400.0);
        assert_eq!(small.warm_up_ticks, 0);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = LayoutConfig {
            large_threshold: 10,
            medium_threshold: 5,
            seed: None,
        };
        assert_eq!(LayoutParams::from_config(11, &config).tier, LayoutTier::Large);
        assert_eq!(LayoutParams::from_config(5, &config).tier, LayoutTier::Medium);
    }

    #[test]
    fn test_radius() {
        assert_eq!(node_radius(0), 5.0);
        assert_eq!(node_radius(4), 9.0);
    }
}
