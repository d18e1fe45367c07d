//! Single-task scheduler for a view
//!
//! `ViewDriver` owns one [`GraphView`] and interleaves two event sources on
//! one task: a fixed frame interval that steps the layout, and a channel of
//! completed fetches. Fetches run as spawned tasks against a
//! [`GraphSource`]; a frame never waits on one. Results are keyed by graph
//! id and anything for a graph that is no longer current is dropped.
//!
//! A fetch that reports the graph or node missing puts the view in its
//! not-found state. Any other failure, including a panicking source, is
//! logged and the view falls back to what it showed before.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiResult, GraphSource};
use crate::graph::{Graph, GraphId, Node};
use crate::query::Neighborhood;
use crate::scene::GraphPayload;
use crate::viewer::GraphView;

/// Synchronous view mutation run on the driver task
pub type ViewFn = Box<dyn FnOnce(&mut GraphView) + Send>;

/// Requests accepted by [`ViewDriver::run`]
pub enum Command {
    LoadGraph(GraphId),
    Expand {
        graph_id: GraphId,
        name: String,
        depth: i64,
    },
    Search(String),
    /// Interaction such as a drag step or zoom
    View(ViewFn),
    Shutdown,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::LoadGraph(id) => f.debug_tuple("LoadGraph").field(id).finish(),
            Command::Expand {
                graph_id,
                name,
                depth,
            } => f
                .debug_struct("Expand")
                .field("graph_id", graph_id)
                .field("name", name)
                .field("depth", depth)
                .finish(),
            Command::Search(q) => f.debug_tuple("Search").field(q).finish(),
            Command::View(_) => f.write_str("View(..)"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// A finished fetch
#[derive(Debug)]
pub enum Outcome {
    Graph {
        graph_id: GraphId,
        result: ApiResult<Graph>,
    },
    Neighbors {
        graph_id: GraphId,
        result: ApiResult<Neighborhood>,
    },
    Search {
        graph_id: GraphId,
        result: ApiResult<Vec<Node>>,
    },
}

impl Outcome {
    pub fn graph_id(&self) -> &GraphId {
        match self {
            Outcome::Graph { graph_id, .. }
            | Outcome::Neighbors { graph_id, .. }
            | Outcome::Search { graph_id, .. } => graph_id,
        }
    }
}

/// Run a source call on its own task so that a panic inside it comes back
/// as [`ApiError::Join`] instead of losing the outcome
async fn isolated<T, F>(call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: std::future::Future<Output = ApiResult<T>> + Send + 'static,
{
    tokio::spawn(call).await?
}

/// What one scheduler turn did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Frame,
    Fetched,
}

pub struct ViewDriver {
    view: GraphView,
    source: Arc<dyn GraphSource>,
    current: Option<GraphId>,
    frame: Duration,
    interval: Interval,
    tx: mpsc::UnboundedSender<Outcome>,
    rx: mpsc::UnboundedReceiver<Outcome>,
    in_flight: usize,
}

impl ViewDriver {
    /// Must be called inside a Tokio runtime
    pub fn new(view: GraphView, source: Arc<dyn GraphSource>, frame: Duration) -> Self {
        let mut interval = tokio::time::interval(frame);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            view,
            source,
            current: None,
            frame,
            interval,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn view(&self) -> &GraphView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut GraphView {
        &mut self.view
    }

    pub fn into_view(self) -> GraphView {
        self.view
    }

    /// Graph id whose results are currently accepted
    pub fn current(&self) -> Option<&GraphId> {
        self.current.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    // === Fetches ===

    /// Fetch a whole graph; supersedes any pending result for another graph
    pub fn load_graph(&mut self, graph_id: GraphId) {
        self.current = Some(graph_id.clone());
        self.view.set_loading(graph_id.clone());
        let source = Arc::clone(&self.source);
        self.spawn(async move {
            let id = graph_id.clone();
            let result = isolated(async move { source.get_graph(&id).await }).await;
            Outcome::Graph { graph_id, result }
        });
    }

    /// Fetch the neighborhood of `name` and render it in place of the
    /// current view
    pub fn expand(&mut self, graph_id: GraphId, name: impl Into<String>, depth: i64) {
        self.current = Some(graph_id.clone());
        self.view.set_loading(graph_id.clone());
        let source = Arc::clone(&self.source);
        let name = name.into();
        self.spawn(async move {
            let id = graph_id.clone();
            let result =
                isolated(async move { source.get_neighbors(&id, &name, depth).await }).await;
            Outcome::Neighbors { graph_id, result }
        });
    }

    /// Search the current graph and highlight the matches; ignored when no
    /// graph is current
    pub fn search(&mut self, query: impl Into<String>) {
        let Some(graph_id) = self.current.clone() else {
            debug!("search without a current graph ignored");
            return;
        };
        let query = query.into();
        let source = Arc::clone(&self.source);
        self.spawn(async move {
            let id = graph_id.clone();
            let result = isolated(async move { source.search_nodes(&id, &query).await }).await;
            Outcome::Search { graph_id, result }
        });
    }

    fn spawn<F>(&mut self, fetch: F)
    where
        F: std::future::Future<Output = Outcome> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The driver may already be gone
            let _ = tx.send(fetch.await);
        });
    }

    /// Apply a finished fetch to the view
    pub fn receive(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.current.as_ref() != Some(outcome.graph_id()) {
            debug!(graph = %outcome.graph_id(), "discarding stale fetch result");
            return;
        }

        match outcome {
            Outcome::Graph { result: Ok(graph), .. } => {
                self.view.render(GraphPayload::from(graph));
            }
            Outcome::Neighbors {
                graph_id,
                result: Ok(hood),
            } => {
                self.view
                    .render(GraphPayload::from_neighborhood(graph_id, hood));
            }
            Outcome::Search { result: Ok(nodes), .. } => {
                self.view
                    .highlight_nodes(nodes.into_iter().map(|n| n.name));
            }
            Outcome::Graph {
                graph_id,
                result: Err(e),
            }
            | Outcome::Neighbors {
                graph_id,
                result: Err(e),
            } => {
                let kept = match e {
                    ApiError::NotFound { what } => {
                        info!(graph = %graph_id, %what, "fetch found nothing");
                        self.view.not_found(what)
                    }
                    e => {
                        let kept = self.view.fail(e.to_string());
                        warn!(graph = %graph_id, error = %e, kept_previous = kept, "fetch failed");
                        kept
                    }
                };
                if kept {
                    // Fall back to whatever graph is still on screen
                    self.current = self.view.graph_id().cloned();
                }
            }
            Outcome::Search {
                graph_id,
                result: Err(e),
            } => {
                warn!(graph = %graph_id, error = %e, "search failed");
            }
        }
    }

    // === Scheduling ===

    /// Wait for the next frame or fetch result and handle it
    pub async fn step(&mut self) -> Step {
        tokio::select! {
            _ = self.interval.tick() => {
                self.view.advance(self.frame);
                Step::Frame
            }
            Some(outcome) = self.rx.recv() => {
                self.receive(outcome);
                Step::Fetched
            }
        }
    }

    /// Keep stepping until no fetch is outstanding
    pub async fn settle_fetches(&mut self) {
        while self.in_flight > 0 {
            self.step().await;
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::LoadGraph(id) => self.load_graph(id),
            Command::Expand {
                graph_id,
                name,
                depth,
            } => self.expand(graph_id, name, depth),
            Command::Search(query) => self.search(query),
            Command::View(f) => f(&mut self.view),
            Command::Shutdown => {}
        }
    }

    /// Drive frames, fetch results and commands until `Shutdown` or the
    /// command channel closes; returns the view
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> GraphView {
        info!(frame_ms = self.frame.as_millis() as u64, "view driver started");
        loop {
            tokio::select! {
                _ = self.interval.tick() => {
                    self.view.advance(self.frame);
                }
                Some(outcome) = self.rx.recv() => self.receive(outcome),
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.dispatch(command),
                },
            }
        }
        info!("view driver stopped");
        self.view
    }
}
