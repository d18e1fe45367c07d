//! Force-directed simulation
//!
//! Bodies are indexed in scene order. Each `tick()` decays alpha toward its
//! target, applies the forces, then integrates velocities. Once alpha falls
//! below `alpha_min` with no drag in progress the simulation is settled and
//! ticks do nothing until something reheats it.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::forces::{self, Link};
use super::params::{node_radius, LayoutParams, REHEAT_ALPHA};
use super::spatial::SpatialIndex;
use crate::scene::Scene;
use crate::view::{Bounds, Point, Size};

/// A simulated node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned position, set while dragging
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub radius: f64,
}

impl Body {
    pub fn at(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            radius,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() && self.fy.is_some()
    }
}

/// Builder for [`Simulation`]
pub struct SimulationBuilder<'a> {
    scene: &'a Scene,
    size: Size,
    params: Option<LayoutParams>,
    seed: Option<u64>,
    positions: HashMap<String, Point>,
}

impl<'a> SimulationBuilder<'a> {
    /// Override the tiered parameters
    pub fn params(mut self, params: LayoutParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Seed initial placement
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Reuse prior positions for matching node names
    pub fn positions(mut self, positions: HashMap<String, Point>) -> Self {
        self.positions = positions;
        self
    }

    pub fn build(self) -> Simulation {
        let params = self
            .params
            .unwrap_or_else(|| LayoutParams::for_node_count(self.scene.len()));
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut carried = 0usize;
        let bodies: Vec<Body> = self
            .scene
            .nodes()
            .iter()
            .map(|n| {
                let radius = node_radius(n.connections);
                match self.positions.get(n.name()) {
                    Some(p) => {
                        carried += 1;
                        Body::at(p.x, p.y, radius)
                    }
                    None => Body::at(
                        rng.gen::<f64>() * self.size.width,
                        rng.gen::<f64>() * self.size.height,
                        radius,
                    ),
                }
            })
            .collect();

        let names: Vec<String> = self
            .scene
            .nodes()
            .iter()
            .map(|n| n.name().to_string())
            .collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let links = forces::build_links(&self.scene.edge_indices(), bodies.len());

        let mut sim = Simulation {
            names,
            index,
            spatial: SpatialIndex::at_rest(&bodies),
            bodies,
            links,
            center: self.size.center(),
            size: self.size,
            alpha: 1.0,
            alpha_target: 0.0,
            dragging: None,
            ticks: 0,
            params,
        };

        debug!(
            nodes = sim.bodies.len(),
            links = sim.links.len(),
            carried,
            tier = ?sim.params.tier,
            "layout started"
        );
        for _ in 0..sim.params.warm_up_ticks {
            sim.tick();
        }
        sim
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    names: Vec<String>,
    index: HashMap<String, usize>,
    /// Hit-test index over `bodies`, refreshed whenever positions change
    spatial: SpatialIndex,
    bodies: Vec<Body>,
    links: Vec<Link>,
    params: LayoutParams,
    center: Point,
    size: Size,
    alpha: f64,
    alpha_target: f64,
    dragging: Option<usize>,
    ticks: u64,
}

impl Simulation {
    pub fn builder(scene: &Scene, size: Size) -> SimulationBuilder<'_> {
        SimulationBuilder {
            scene,
            size,
            params: None,
            seed: None,
            positions: HashMap::new(),
        }
    }

    /// Tiered parameters, random placement
    pub fn new(scene: &Scene, size: Size) -> Self {
        Self::builder(scene, size).build()
    }

    // === Stepping ===

    /// Advance one step; returns `false` without doing anything once settled
    pub fn tick(&mut self) -> bool {
        if self.is_settled() {
            return false;
        }
        let p = &self.params;
        self.alpha += (self.alpha_target - self.alpha) * p.alpha_decay;

        forces::apply_links(&mut self.bodies, &self.links, p.link_distance, self.alpha);
        forces::apply_many_body(
            &mut self.bodies,
            p.repulsion_strength,
            p.theta,
            p.distance_min,
            self.alpha,
        );
        forces::apply_center(&mut self.bodies, self.center, p.center_strength);
        forces::apply_collision(&mut self.bodies, p.collision_margin, p.collision_strength);

        let keep = 1.0 - p.velocity_decay;
        for body in &mut self.bodies {
            match (body.fx, body.fy) {
                (Some(fx), Some(fy)) => {
                    body.x = fx;
                    body.y = fy;
                    body.vx = 0.0;
                    body.vy = 0.0;
                }
                _ => {
                    body.vx *= keep;
                    body.vy *= keep;
                    body.x += body.vx;
                    body.y += body.vy;
                }
            }
        }
        self.spatial = SpatialIndex::at_rest(&self.bodies);
        self.ticks += 1;
        true
    }

    /// Tick until settled or `max_ticks` have run; returns ticks run
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut n = 0;
        while n < max_ticks && self.tick() {
            n += 1;
        }
        n
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.params.alpha_min && self.dragging.is_none()
    }

    /// Restart from full energy, e.g. when new data arrives
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
    }

    /// Re-anchor the center force on a new viewport size
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.center = size.center();
        self.alpha = self.alpha.max(REHEAT_ALPHA);
    }

    // === Dragging ===

    /// Pin a body where it is and keep the simulation warm while it moves
    ///
    /// Only one body is dragged at a time; a drag already in progress on
    /// another body is released first.
    pub fn drag_start(&mut self, name: &str) -> bool {
        let Some(i) = self.index_of(name) else {
            return false;
        };
        if let Some(prev) = self.dragging.filter(|&prev| prev != i) {
            self.bodies[prev].fx = None;
            self.bodies[prev].fy = None;
        }
        let body = &mut self.bodies[i];
        body.fx = Some(body.x);
        body.fy = Some(body.y);
        self.dragging = Some(i);
        self.alpha_target = REHEAT_ALPHA;
        true
    }

    pub fn drag_to(&mut self, name: &str, x: f64, y: f64) -> bool {
        let Some(i) = self.index_of(name) else {
            return false;
        };
        let body = &mut self.bodies[i];
        body.fx = Some(x);
        body.fy = Some(y);
        body.x = x;
        body.y = y;
        self.spatial = SpatialIndex::at_rest(&self.bodies);
        true
    }

    pub fn drag_end(&mut self, name: &str) -> bool {
        let Some(i) = self.index_of(name) else {
            return false;
        };
        let body = &mut self.bodies[i];
        body.fx = None;
        body.fy = None;
        if self.dragging == Some(i) {
            self.dragging = None;
        }
        self.alpha_target = 0.0;
        true
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.map(|i| self.names[i].as_str())
    }

    // === Reads ===

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn body(&self, name: &str) -> Option<&Body> {
        self.index_of(name).map(|i| &self.bodies[i])
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Extent of all bodies including their radii
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::union_all(self.bodies.iter().map(|b| Bounds::around(b.position(), b.radius)))
    }

    /// Current positions by name, for carrying into the next simulation
    pub fn positions(&self) -> HashMap<String, Point> {
        self.names
            .iter()
            .cloned()
            .zip(self.bodies.iter().map(Body::position))
            .collect()
    }

    /// Topmost body whose circle contains the world point
    pub fn body_at(&self, p: Point) -> Option<&str> {
        self.spatial
            .topmost_at(p)
            .map(|i| self.names[i].as_str())
    }
}
