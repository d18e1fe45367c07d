//! Owned view context
//!
//! A `GraphView` holds everything one rendered graph needs: the scene, its
//! simulation, the zoom/pan transform, highlight and minimap state, and the
//! pointer interaction in progress. Views are independent; nothing is
//! shared between instances.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, LayoutConfig, ViewportConfig};
use crate::graph::{GraphId, Node, NodeCategory};
use crate::layout::{LayoutParams, Simulation};
use crate::scene::{GraphPayload, Scene};
use crate::view::{
    Emphasis, Highlight, Minimap, MinimapFrame, Point, Size, TransformAnimation, ViewTransform,
    ZoomRange,
};

/// Callback invoked by [`GraphView::click_at`]
pub type ClickHandler = Box<dyn FnMut(Option<&Node>) + Send>;

/// Wheel delta (pixels) to zoom exponent
const WHEEL_SENSITIVITY: f64 = 0.002;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ViewState {
    Empty,
    Loading {
        #[serde(rename = "graphId")]
        graph_id: GraphId,
    },
    Ready,
    /// The requested graph or node does not exist; any previous scene is
    /// still drawn
    #[serde(rename = "not_found")]
    NotFound {
        what: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Pointer {
    Idle,
    Dragging { name: String },
    Panning { start: Point, origin: ViewTransform },
}

/// Serializable snapshot for a presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "graphId", skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<GraphId>,
    pub state: ViewState,
    pub size: Size,
    pub transform: ViewTransform,
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<FrameEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimap: Option<MinimapFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub category: NodeCategory,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub connections: usize,
    pub emphasis: Emphasis,
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation: String,
    pub emphasis: Emphasis,
}

pub struct GraphView {
    viewport: ViewportConfig,
    layout: LayoutConfig,
    size: Size,
    state: ViewState,
    graph_id: Option<GraphId>,
    scene: Scene,
    edge_index: Vec<(usize, usize)>,
    sim: Option<Simulation>,
    transform: ViewTransform,
    animation: Option<TransformAnimation>,
    fit_pending: Option<Duration>,
    highlight: Highlight,
    minimap: Minimap,
    minimap_frame: Option<MinimapFrame>,
    pointer: Pointer,
    click_handler: Option<ClickHandler>,
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("graph_id", &self.graph_id)
            .field("state", &self.state)
            .field("nodes", &self.scene.len())
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

impl Default for GraphView {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl GraphView {
    pub fn new(config: &Config) -> Self {
        Self {
            size: Size::new(config.viewport.width, config.viewport.height),
            viewport: config.viewport.clone(),
            layout: config.layout.clone(),
            state: ViewState::Empty,
            graph_id: None,
            scene: Scene::default(),
            edge_index: Vec::new(),
            sim: None,
            transform: ViewTransform::IDENTITY,
            animation: None,
            fit_pending: None,
            highlight: Highlight::default(),
            minimap: Minimap::from_config(&config.minimap),
            minimap_frame: None,
            pointer: Pointer::Idle,
            click_handler: None,
        }
    }

    fn zoom_range(&self) -> ZoomRange {
        ZoomRange {
            min: self.viewport.min_zoom,
            max: self.viewport.max_zoom,
        }
    }

    // === Data ===

    /// Replace the rendered node/edge set
    ///
    /// Positions carry over by name when the payload is for the graph
    /// already shown; a different graph starts from scratch and is fitted
    /// once its layout has run for the configured delay.
    pub fn render(&mut self, payload: GraphPayload) {
        let same_graph = self.graph_id.as_ref() == Some(&payload.graph_id);
        let prior = match (&self.sim, same_graph) {
            (Some(sim), true) => sim.positions(),
            _ => HashMap::new(),
        };

        let graph_id = payload.graph_id.clone();
        let scene = Scene::from_payload(payload);
        let params = LayoutParams::from_config(scene.len(), &self.layout);
        let sim = Simulation::builder(&scene, self.size)
            .params(params)
            .seed_opt(self.layout.seed)
            .positions(prior)
            .build();

        info!(
            graph = %graph_id,
            nodes = scene.len(),
            edges = scene.edges().len(),
            dropped = scene.dropped_edges(),
            carried = same_graph,
            "rendering graph"
        );

        if !same_graph {
            self.highlight.clear();
            self.animation = None;
            self.transform = ViewTransform::IDENTITY;
            self.fit_pending = Some(Duration::from_millis(self.viewport.fit_delay_ms));
        }
        self.pointer = Pointer::Idle;
        self.edge_index = scene.edge_indices();
        self.scene = scene;
        self.sim = Some(sim);
        self.graph_id = Some(graph_id);
        self.state = ViewState::Ready;
        self.refresh_minimap();
    }

    /// Mark a fetch for `graph_id` as in flight; the current view stays up
    pub fn set_loading(&mut self, graph_id: GraphId) {
        self.state = ViewState::Loading { graph_id };
    }

    /// Record a failed fetch
    ///
    /// Returns `true` when a previous view is kept on screen, `false` when
    /// there was nothing to fall back to and the view is now in error.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.sim.is_some() {
            self.state = ViewState::Ready;
            true
        } else {
            self.state = ViewState::Error {
                message: message.into(),
            };
            false
        }
    }

    /// Record that the requested graph or node does not exist
    ///
    /// The message is kept in the state either way; returns `true` when a
    /// previous scene stays on screen underneath it.
    pub fn not_found(&mut self, what: impl Into<String>) -> bool {
        self.state = ViewState::NotFound { what: what.into() };
        self.sim.is_some()
    }

    /// Tear down and forget positions
    pub fn clear(&mut self) {
        self.graph_id = None;
        self.scene = Scene::default();
        self.edge_index.clear();
        self.sim = None;
        self.animation = None;
        self.fit_pending = None;
        self.highlight.clear();
        self.minimap_frame = None;
        self.pointer = Pointer::Idle;
        self.state = ViewState::Empty;
    }

    // === Scheduling ===

    /// One scheduler step: tick the layout, step any animation and the
    /// pending fit. Returns whether anything visible changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let moved = self.sim.as_mut().is_some_and(|sim| sim.tick());

        let mut changed = moved;
        if let Some(anim) = self.animation.as_mut() {
            self.transform = anim.advance(dt);
            if anim.is_finished() {
                self.animation = None;
            }
            changed = true;
        }

        if let Some(remaining) = self.fit_pending {
            if remaining <= dt {
                self.fit_pending = None;
                changed |= self.zoom_to_fit();
            } else {
                self.fit_pending = Some(remaining - dt);
            }
        }

        if changed {
            self.refresh_minimap();
        }
        changed
    }

    pub fn is_settled(&self) -> bool {
        self.sim.as_ref().map_or(true, Simulation::is_settled) && self.animation.is_none()
    }

    // === Interaction ===

    pub fn on_node_click(&mut self, handler: impl FnMut(Option<&Node>) + Send + 'static) {
        self.click_handler = Some(Box::new(handler));
    }

    /// Hit-test a screen point and notify the click handler
    pub fn click_at(&mut self, screen_x: f64, screen_y: f64) -> Option<Node> {
        let hit = self.node_at(screen_x, screen_y).cloned();
        if let Some(handler) = self.click_handler.as_mut() {
            handler(hit.as_ref());
        }
        hit
    }

    fn node_at(&self, screen_x: f64, screen_y: f64) -> Option<&Node> {
        let world = self
            .transform
            .screen_to_world(Point::new(screen_x, screen_y));
        let name = self.sim.as_ref()?.body_at(world)?;
        self.scene.node(name).map(|n| &n.node)
    }

    /// Start dragging the node under the pointer, or panning if none
    ///
    /// A press while a drag is still active releases that drag first.
    pub fn pointer_down(&mut self, screen_x: f64, screen_y: f64) {
        self.pointer_up();
        let hit = self.node_at(screen_x, screen_y).map(|n| n.name.clone());
        self.pointer = match (hit, self.sim.as_mut()) {
            (Some(name), Some(sim)) => {
                sim.drag_start(&name);
                debug!(node = %name, "drag start");
                Pointer::Dragging { name }
            }
            _ => Pointer::Panning {
                start: Point::new(screen_x, screen_y),
                origin: self.transform,
            },
        };
    }

    pub fn pointer_move(&mut self, screen_x: f64, screen_y: f64) {
        match &self.pointer {
            Pointer::Idle => {}
            Pointer::Dragging { name } => {
                let world = self
                    .transform
                    .screen_to_world(Point::new(screen_x, screen_y));
                if let Some(sim) = self.sim.as_mut() {
                    sim.drag_to(name, world.x, world.y);
                }
            }
            Pointer::Panning { start, origin } => {
                let mut t = *origin;
                t.pan_by(screen_x - start.x, screen_y - start.y);
                self.transform = t;
                self.animation = None;
                self.refresh_minimap();
            }
        }
    }

    pub fn pointer_up(&mut self) {
        if let Pointer::Dragging { name } = std::mem::replace(&mut self.pointer, Pointer::Idle) {
            if let Some(sim) = self.sim.as_mut() {
                sim.drag_end(&name);
            }
        }
    }

    /// Zoom about the pointer; positive `delta_y` zooms out
    pub fn wheel(&mut self, delta_y: f64, screen_x: f64, screen_y: f64) {
        let factor = 2f64.powf(-delta_y * WHEEL_SENSITIVITY);
        let range = self.zoom_range();
        self.transform
            .zoom_at(factor, Point::new(screen_x, screen_y), range);
        self.animation = None;
        self.refresh_minimap();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
        if let Some(sim) = self.sim.as_mut() {
            sim.resize(self.size);
        }
        self.refresh_minimap();
    }

    /// Fit the whole layout into the viewport; `false` when nothing is shown
    pub fn zoom_to_fit(&mut self) -> bool {
        let Some(bounds) = self.sim.as_ref().and_then(Simulation::bounds) else {
            return false;
        };
        self.transform = ViewTransform::fit(
            bounds,
            self.size,
            self.viewport.fit_padding,
            self.viewport.fit_max_zoom,
            self.zoom_range(),
        );
        self.animation = None;
        self.refresh_minimap();
        true
    }

    /// Animate to center `name` at the focus zoom; unknown names are ignored
    pub fn focus(&mut self, name: &str) -> bool {
        let Some(body) = self.sim.as_ref().and_then(|s| s.body(name)) else {
            return false;
        };
        let k = self.zoom_range().clamp(self.viewport.focus_zoom);
        let target = ViewTransform::centered_on(body.position(), self.size, k);
        self.animation = Some(TransformAnimation::new(
            self.transform,
            target,
            Duration::from_millis(self.viewport.focus_duration_ms),
        ));
        true
    }

    /// Emphasize the named nodes; an empty set restores neutral styling
    pub fn highlight_nodes<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight.apply(names);
    }

    // === Reads ===

    pub fn node_types(&self) -> BTreeMap<String, usize> {
        self.scene.node_types()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn graph_id(&self) -> Option<&GraphId> {
        self.graph_id.as_ref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn simulation(&self) -> Option<&Simulation> {
        self.sim.as_ref()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn is_fit_pending(&self) -> bool {
        self.fit_pending.is_some()
    }

    pub fn minimap_frame(&self) -> Option<&MinimapFrame> {
        self.minimap_frame.as_ref()
    }

    fn refresh_minimap(&mut self) {
        self.minimap_frame = self.sim.as_ref().map(|sim| {
            self.minimap
                .frame(sim, &self.edge_index, &self.transform, self.size)
        });
    }

    pub fn frame(&self) -> Frame {
        let bodies = self.sim.as_ref().map(Simulation::bodies).unwrap_or(&[]);
        let nodes = self
            .scene
            .nodes()
            .iter()
            .zip(bodies)
            .map(|(n, b)| FrameNode {
                name: n.node.name.clone(),
                node_type: n.node.node_type.clone(),
                category: n.node.category(),
                x: b.x,
                y: b.y,
                radius: b.radius,
                connections: n.connections,
                emphasis: self.highlight.node(n.name()),
                pinned: b.is_pinned(),
            })
            .collect();
        let edges = self
            .scene
            .edges()
            .iter()
            .map(|e| FrameEdge {
                id: e.id.to_string(),
                source: e.source.clone(),
                target: e.target.clone(),
                relation: e.relation.clone(),
                emphasis: self.highlight.edge(&e.source, &e.target),
            })
            .collect();

        Frame {
            graph_id: self.graph_id.clone(),
            state: self.state.clone(),
            size: self.size,
            transform: self.transform,
            nodes,
            edges,
            minimap: self.minimap_frame.clone(),
        }
    }
}
