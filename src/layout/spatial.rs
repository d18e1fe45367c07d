//! R-tree over body circles
//!
//! Serves hit testing on pointer events and candidate pairs for the
//! collision force, both in O(log n) per lookup.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::simulation::Body;
use crate::view::Point;

/// One body's circle, tagged with its index in the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyCircle {
    pub index: usize,
    pub center: [f64; 2],
    pub radius: f64,
}

impl BodyCircle {
    pub fn new(index: usize, center: [f64; 2], radius: f64) -> Self {
        Self {
            index,
            center,
            radius,
        }
    }

    fn aabb(&self) -> AABB<[f64; 2]> {
        let [x, y] = self.center;
        AABB::from_corners(
            [x - self.radius, y - self.radius],
            [x + self.radius, y + self.radius],
        )
    }
}

impl RTreeObject for BodyCircle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb()
    }
}

impl PointDistance for BodyCircle {
    /// Squared distance from the point to the circle's rim, zero inside
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        let to_rim = ((dx * dx + dy * dy).sqrt() - self.radius).max(0.0);
        to_rim * to_rim
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        let dx = point[0] - self.center[0];
        let dy = point[1] - self.center[1];
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// Circles of `radius + margin` at each body's predicted next position
pub fn predicted_circles(bodies: &[Body], margin: f64) -> Vec<BodyCircle> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, b)| BodyCircle::new(i, [b.x + b.vx, b.y + b.vy], b.radius + margin))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<BodyCircle>,
}

impl SpatialIndex {
    pub fn from_circles(circles: Vec<BodyCircle>) -> Self {
        Self {
            tree: RTree::bulk_load(circles),
        }
    }

    /// Circles at the bodies' current positions
    pub fn at_rest(bodies: &[Body]) -> Self {
        Self::from_circles(
            bodies
                .iter()
                .enumerate()
                .map(|(i, b)| BodyCircle::new(i, [b.x, b.y], b.radius))
                .collect(),
        )
    }

    /// Highest-indexed circle containing the point (the one drawn on top)
    pub fn topmost_at(&self, p: Point) -> Option<usize> {
        self.tree
            .locate_all_at_point(&[p.x, p.y])
            .map(|c| c.index)
            .max()
    }

    /// Indices of circles whose bounding boxes overlap `circle`'s, itself
    /// included
    pub fn overlapping<'a>(&'a self, circle: &BodyCircle) -> impl Iterator<Item = usize> + 'a {
        self.tree
            .locate_in_envelope_intersecting(&circle.aabb())
            .map(|c| c.index)
    }
}
