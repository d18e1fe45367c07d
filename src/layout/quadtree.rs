//! Barnes-Hut quadtree for many-body repulsion
//!
//! Cells live in a flat arena. Every body has unit weight, so a cell's mass
//! is its body count and its center of mass is the mean position.

use crate::view::{Bounds, Point};

/// Coincident bodies stop subdividing here and share a leaf
const MAX_DEPTH: usize = 24;

#[derive(Debug, Clone)]
struct Cell {
    x0: f64,
    y0: f64,
    size: f64,
    mass: f64,
    sum_x: f64,
    sum_y: f64,
    children: Option<[usize; 4]>,
    bodies: Vec<usize>,
}

impl Cell {
    fn new(x0: f64, y0: f64, size: f64) -> Self {
        Self {
            x0,
            y0,
            size,
            mass: 0.0,
            sum_x: 0.0,
            sum_y: 0.0,
            children: None,
            bodies: Vec::new(),
        }
    }

    fn quadrant(&self, p: Point) -> usize {
        let half = self.size / 2.0;
        let right = (p.x >= self.x0 + half) as usize;
        let bottom = (p.y >= self.y0 + half) as usize;
        right | (bottom << 1)
    }

    fn center_of_mass(&self) -> Point {
        Point::new(self.sum_x / self.mass, self.sum_y / self.mass)
    }
}

#[derive(Debug, Clone)]
pub struct QuadTree {
    cells: Vec<Cell>,
    points: Vec<Point>,
}

impl QuadTree {
    pub fn build(points: &[Point]) -> Self {
        let mut tree = Self {
            cells: Vec::new(),
            points: points.to_vec(),
        };
        let Some(bounds) = Bounds::union_all(points.iter().map(|p| Bounds::around(*p, 0.0)))
        else {
            return tree;
        };
        // Square root cell, slightly enlarged so max edges fall inside
        let size = bounds.width().max(bounds.height()).max(1.0) * 1.0001;
        tree.cells.push(Cell::new(bounds.min_x, bounds.min_y, size));
        for i in 0..points.len() {
            tree.insert(0, i, 0);
        }
        tree
    }

    fn insert(&mut self, mut cell: usize, body: usize, mut depth: usize) {
        let p = self.points[body];
        loop {
            {
                let c = &mut self.cells[cell];
                c.mass += 1.0;
                c.sum_x += p.x;
                c.sum_y += p.y;
            }

            if let Some(children) = self.cells[cell].children {
                cell = children[self.cells[cell].quadrant(p)];
                depth += 1;
                continue;
            }

            if self.cells[cell].bodies.is_empty() || depth >= MAX_DEPTH {
                self.cells[cell].bodies.push(body);
                return;
            }

            // Split the leaf and push its existing bodies one level down
            let children = self.subdivide(cell);
            let existing = std::mem::take(&mut self.cells[cell].bodies);
            for other in existing {
                let q = self.cells[cell].quadrant(self.points[other]);
                self.insert(children[q], other, depth + 1);
            }
            cell = children[self.cells[cell].quadrant(p)];
            depth += 1;
        }
    }

    fn subdivide(&mut self, cell: usize) -> [usize; 4] {
        let (x0, y0, size) = {
            let c = &self.cells[cell];
            (c.x0, c.y0, c.size)
        };
        let half = size / 2.0;
        let base = self.cells.len();
        self.cells.push(Cell::new(x0, y0, half));
        self.cells.push(Cell::new(x0 + half, y0, half));
        self.cells.push(Cell::new(x0, y0 + half, half));
        self.cells.push(Cell::new(x0 + half, y0 + half, half));
        let children = [base, base + 1, base + 2, base + 3];
        self.cells[cell].children = Some(children);
        children
    }

    /// Velocity change on `body` from every other body
    ///
    /// `strength` is pre-multiplied by alpha; far cells whose
    /// `size / distance < theta` are treated as a single point mass.
    pub fn accumulate(&self, body: usize, strength: f64, theta: f64, distance_min: f64) -> Point {
        let mut dv = Point::default();
        if self.cells.is_empty() {
            return dv;
        }
        let p = self.points[body];
        let theta2 = theta * theta;
        let dmin2 = distance_min * distance_min;
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let cell = &self.cells[idx];
            if cell.mass == 0.0 {
                continue;
            }

            if let Some(children) = cell.children {
                let com = cell.center_of_mass();
                let dx = com.x - p.x;
                let dy = com.y - p.y;
                let l = dx * dx + dy * dy;
                if cell.size * cell.size / theta2 < l {
                    let l = l.max(dmin2);
                    dv.x += dx * strength * cell.mass / l;
                    dv.y += dy * strength * cell.mass / l;
                } else {
                    stack.extend(children);
                }
                continue;
            }

            for &other in &cell.bodies {
                if other == body {
                    continue;
                }
                let q = self.points[other];
                let (mut dx, mut dy) = (q.x - p.x, q.y - p.y);
                if dx == 0.0 && dy == 0.0 {
                    let j = jiggle(body, other);
                    dx = j.x;
                    dy = j.y;
                }
                let l = (dx * dx + dy * dy).max(dmin2);
                dv.x += dx * strength / l;
                dv.y += dy * strength / l;
            }
        }
        dv
    }
}

/// Tiny deterministic offset separating coincident bodies; antisymmetric in
/// the pair so the two push apart
pub(crate) fn jiggle(a: usize, b: usize) -> Point {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let angle = (lo * 31 + hi * 17) as f64 * 2.399_963;
    let sign = if a < b { 1.0 } else { -1.0 };
    Point::new(sign * 1e-6 * angle.cos(), sign * 1e-6 * angle.sin())
}
