//! Down-scaled overview of the whole layout

use serde::{Deserialize, Serialize};

use super::bounds::{Bounds, Point, Size};
use super::transform::ViewTransform;
use crate::config::MinimapConfig;
use crate::layout::Simulation;

/// Uniform scale plus offset from world to minimap coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimapProjection {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl MinimapProjection {
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset_x,
            p.y * self.scale + self.offset_y,
        )
    }

    pub fn apply_bounds(&self, b: Bounds) -> Bounds {
        let lo = self.apply(Point::new(b.min_x, b.min_y));
        let hi = self.apply(Point::new(b.max_x, b.max_y));
        Bounds::new(lo.x, lo.y, hi.x, hi.y)
    }
}

/// Everything needed to draw the minimap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimapFrame {
    pub size: Size,
    pub projection: MinimapProjection,
    /// Node centers in minimap coordinates, scene order
    pub nodes: Vec<Point>,
    pub edges: Vec<(Point, Point)>,
    /// Main viewport's visible area in minimap coordinates
    pub viewport: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimap {
    pub size: Size,
    pub padding: f64,
}

impl Default for Minimap {
    fn default() -> Self {
        Self::from_config(&MinimapConfig::default())
    }
}

impl Minimap {
    pub fn from_config(config: &MinimapConfig) -> Self {
        Self {
            size: Size::new(config.width, config.height),
            padding: config.padding,
        }
    }

    /// Fit `world` inside the padded minimap box, centered
    ///
    /// A zero extent on one axis is fitted on the other; zero extent on both
    /// (or no bounds at all) uses scale 1 around the minimap center.
    pub fn projection(&self, world: Option<Bounds>) -> MinimapProjection {
        let inner_w = self.size.width - 2.0 * self.padding;
        let inner_h = self.size.height - 2.0 * self.padding;
        let center = self.size.center();

        let Some(world) = world else {
            return MinimapProjection {
                scale: 1.0,
                offset_x: center.x,
                offset_y: center.y,
            };
        };

        let sx = if world.width() > 0.0 {
            inner_w / world.width()
        } else {
            f64::INFINITY
        };
        let sy = if world.height() > 0.0 {
            inner_h / world.height()
        } else {
            f64::INFINITY
        };
        let mut scale = sx.min(sy);
        if !scale.is_finite() || scale <= 0.0 {
            scale = 1.0;
        }

        let wc = world.center();
        MinimapProjection {
            scale,
            offset_x: center.x - wc.x * scale,
            offset_y: center.y - wc.y * scale,
        }
    }

    pub fn frame(
        &self,
        sim: &Simulation,
        edges: &[(usize, usize)],
        transform: &ViewTransform,
        viewport: Size,
    ) -> MinimapFrame {
        let projection = self.projection(sim.bounds());
        let nodes: Vec<Point> = sim
            .bodies()
            .iter()
            .map(|b| projection.apply(b.position()))
            .collect();
        let edges = edges
            .iter()
            .filter_map(|&(s, t)| Some((*nodes.get(s)?, *nodes.get(t)?)))
            .collect();

        MinimapFrame {
            size: self.size,
            projection,
            nodes,
            edges,
            viewport: projection.apply_bounds(transform.visible_world(viewport)),
        }
    }
}
