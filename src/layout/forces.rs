//! Per-tick forces
//!
//! Link, many-body and collision forces adjust velocities; centering
//! translates positions directly. All are scaled so that a settled graph
//! (alpha near zero) barely moves.

use super::quadtree::{jiggle, QuadTree};
use super::simulation::Body;
use super::spatial::{predicted_circles, SpatialIndex};
use crate::view::Point;

/// Spring between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    /// `1 / min(deg(source), deg(target))`
    pub strength: f64,
    /// Share of the correction applied to the target
    pub bias: f64,
}

/// Springs for every non-loop edge, weakened on high-degree endpoints
pub fn build_links(edges: &[(usize, usize)], body_count: usize) -> Vec<Link> {
    let mut degree = vec![0usize; body_count];
    for &(s, t) in edges.iter().filter(|(s, t)| s != t) {
        degree[s] += 1;
        degree[t] += 1;
    }
    edges
        .iter()
        .filter(|(s, t)| s != t)
        .map(|&(source, target)| {
            let (ds, dt) = (degree[source] as f64, degree[target] as f64);
            Link {
                source,
                target,
                strength: 1.0 / ds.min(dt),
                bias: ds / (ds + dt),
            }
        })
        .collect()
}

pub fn apply_links(bodies: &mut [Body], links: &[Link], distance: f64, alpha: f64) {
    for link in links {
        let (s, t) = (bodies[link.source], bodies[link.target]);
        let mut x = t.x + t.vx - s.x - s.vx;
        let mut y = t.y + t.vy - s.y - s.vy;
        if x == 0.0 && y == 0.0 {
            let j = jiggle(link.source, link.target);
            x = j.x;
            y = j.y;
        }
        let l = (x * x + y * y).sqrt();
        let k = (l - distance) / l * alpha * link.strength;
        x *= k;
        y *= k;

        let b = link.bias;
        bodies[link.target].vx -= x * b;
        bodies[link.target].vy -= y * b;
        bodies[link.source].vx += x * (1.0 - b);
        bodies[link.source].vy += y * (1.0 - b);
    }
}

pub fn apply_many_body(
    bodies: &mut [Body],
    strength: f64,
    theta: f64,
    distance_min: f64,
    alpha: f64,
) {
    let points: Vec<Point> = bodies.iter().map(|b| Point::new(b.x, b.y)).collect();
    let tree = QuadTree::build(&points);
    let scaled = strength * alpha;
    for (i, body) in bodies.iter_mut().enumerate() {
        let dv = tree.accumulate(i, scaled, theta, distance_min);
        body.vx += dv.x;
        body.vy += dv.y;
    }
}

/// Translate all bodies so their centroid drifts toward `center`
pub fn apply_center(bodies: &mut [Body], center: Point, strength: f64) {
    if bodies.is_empty() {
        return;
    }
    let n = bodies.len() as f64;
    let (sx, sy) = bodies
        .iter()
        .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
    let dx = (sx / n - center.x) * strength;
    let dy = (sy / n - center.y) * strength;
    for body in bodies {
        body.x -= dx;
        body.y -= dy;
    }
}

/// Resolve overlaps between circles of `radius + margin`, using each body's
/// predicted next position
///
/// Candidate pairs come from an R-tree built once per call, over positions
/// from before any pair is resolved.
pub fn apply_collision(bodies: &mut [Body], margin: f64, strength: f64) {
    if bodies.len() < 2 {
        return;
    }
    let circles = predicted_circles(bodies, margin);
    let index = SpatialIndex::from_circles(circles.clone());
    let mut candidates = Vec::new();
    for circle in &circles {
        let i = circle.index;
        candidates.clear();
        candidates.extend(index.overlapping(circle).filter(|&j| j > i));
        // Tree order is arbitrary; keep resolution deterministic
        candidates.sort_unstable();
        for &j in &candidates {
            resolve_pair(bodies, i, j, margin, strength);
        }
    }
}

fn resolve_pair(bodies: &mut [Body], i: usize, j: usize, margin: f64, strength: f64) {
    let (a, b) = (bodies[i], bodies[j]);
    let ri = a.radius + margin;
    let rj = b.radius + margin;
    let r = ri + rj;

    let mut x = (a.x + a.vx) - (b.x + b.vx);
    let mut y = (a.y + a.vy) - (b.y + b.vy);
    if x == 0.0 && y == 0.0 {
        let jig = jiggle(j, i);
        x = jig.x;
        y = jig.y;
    }
    let l2 = x * x + y * y;
    if l2 >= r * r {
        return;
    }
    let l = l2.sqrt();
    let k = (r - l) / l * strength;
    x *= k;
    y *= k;

    // Smaller bodies yield more
    let wi = rj * rj / (ri * ri + rj * rj);
    bodies[i].vx += x * wi;
    bodies[i].vy += y * wi;
    bodies[j].vx -= x * (1.0 - wi);
    bodies[j].vy -= y * (1.0 - wi);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f64, y: f64) -> Body {
        Body::at(x, y, 5.0)
    }

    #[test]
    fn test_links_skip_loops_and_weight_by_degree() {
        let links = build_links(&[(0, 1), (0, 2), (1, 1)], 3);
        assert_eq!(links.len(), 2);
        // deg(0) = 2, deg(1) = 1
        assert_eq!(links[0].strength, 1.0);
        assert!((links[0].bias - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_link_pulls_toward_rest_length() {
        let mut bodies = vec![body(0.0, 0.0), body(100.0, 0.0)];
        let links = build_links(&[(0, 1)], 2);
        apply_links(&mut bodies, &links, 30.0, 1.0);
        assert!(bodies[0].vx > 0.0);
        assert!(bodies[1].vx < 0.0);
    }

    #[test]
    fn test_many_body_repels() {
        let mut bodies = vec![body(0.0, 0.0), body(10.0, 0.0)];
        apply_many_body(&mut bodies, -100.0, 0.9, 1.0, 1.0);
        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);
    }

    #[test]
    fn test_center_moves_centroid() {
        let mut bodies = vec![body(0.0, 0.0), body(20.0, 0.0)];
        apply_center(&mut bodies, Point::new(110.0, 0.0), 1.0);
        assert_eq!(bodies[0].x, 100.0);
        assert_eq!(bodies[1].x, 120.0);
    }

    #[test]
    fn test_collision_separates_overlapping() {
        let mut bodies = vec![body(0.0, 0.0), body(4.0, 0.0)];
        apply_collision(&mut bodies, 5.0, 0.7);
        assert!(bodies[0].vx < 0.0);
        assert!(bodies[1].vx > 0.0);

        let mut apart = vec![body(0.0, 0.0), body(100.0, 0.0)];
        apply_collision(&mut apart, 5.0, 0.7);
        assert_eq!(apart[0].vx, 0.0);
        assert_eq!(apart[1].vx, 0.0);
    }

    #[test]
    fn test_coincident_collision_is_finite() {
        let mut bodies = vec![body(3.0, 3.0), body(3.0, 3.0)];
        apply_collision(&mut bodies, 5.0, 0.7);
        assert!(bodies.iter().all(|b| b.vx.is_finite() && b.vy.is_finite()));
        assert!(bodies[0].vx != bodies[1].vx || bodies[0].vy != bodies[1].vy);
    }
}
