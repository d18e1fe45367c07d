//! Ideamap CLI: manage stored graphs and run headless layouts.
//!
//! Usage:
//!   ideamap [--config file] [--db path] graphs
//!   ideamap import <file.json>
//!   ideamap expand <graph> <node> [--depth N]
//!   ideamap search <graph> <text>
//!   ideamap view <graph> [--search text] [--focus node]

use clap::{Parser, Subcommand};
use ideamap::{
    ApiError, Command, Config, ConfigError, Graph, GraphApi, GraphId, GraphSource, GraphStore,
    GraphView, OpenStore, SqliteStore, StorageError, ViewDriver, ViewState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ideamap", version, about = "Knowledge graph explorer")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file (overrides the config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored graphs
    Graphs,
    /// Replace a graph with the contents of a JSON file
    Import {
        file: PathBuf,
    },
    /// Print a stored graph as JSON
    Export {
        graph: String,
    },
    /// Delete a stored graph
    Delete {
        graph: String,
    },
    /// Neighborhood of a node, as JSON
    Expand {
        graph: String,
        node: String,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        depth: i64,
    },
    /// Nodes whose name contains the text
    Search {
        graph: String,
        text: String,
    },
    /// Node counts per type
    Types {
        graph: String,
    },
    /// Lay a graph out headlessly and print the final frame as JSON
    View {
        graph: String,
        /// Highlight the results of this search
        #[arg(long)]
        search: Option<String>,
        /// Center this node once the layout settles
        #[arg(long)]
        focus: Option<String>,
        /// Upper bound on layout time, in milliseconds
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{}: {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),
    #[error("view failed: {0}")]
    View(String),
    #[error("invalid graph file: {0}")]
    Json(#[from] serde_json::Error),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("IDEAMAP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("ideamap=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_api(config: &Config, db: Option<PathBuf>) -> Result<GraphApi, CliError> {
    let db_path = db.unwrap_or_else(|| config.store.db_path());
    debug!(path = %db_path.display(), "opening store");
    let store = SqliteStore::open(&db_path)?;
    Ok(GraphApi::new(Arc::new(store)).with_config(config))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_graphs(api: &GraphApi) -> Result<(), CliError> {
    let graphs = api.list_graphs()?;
    if graphs.is_empty() {
        println!("No graphs stored.");
        return Ok(());
    }
    println!(
        "{:<24}  {:<24}  {:>7}  {:>7}  {:<12}  {}",
        "ID", "NAME", "NODES", "EDGES", "TOP TYPE", "UPDATED"
    );
    println!("{}", "-".repeat(100));
    for g in graphs {
        println!(
            "{:<24}  {:<24}  {:>7}  {:>7}  {:<12}  {}",
            g.id,
            g.name,
            g.node_count,
            g.rel_count,
            g.top_type.as_deref().unwrap_or("-"),
            g.updated_at.map(|t| t.display()).unwrap_or_default(),
        );
    }
    Ok(())
}

fn cmd_import(api: &GraphApi, file: &Path) -> Result<(), CliError> {
    let text = std::fs::read_to_string(file).map_err(|e| CliError::Read(file.to_path_buf(), e))?;
    let graph: Graph = serde_json::from_str(&text)?;
    let summary = api.import_graph(&graph)?;
    println!(
        "Imported '{}' ({} nodes, {} edges)",
        summary.id, summary.node_count, summary.rel_count
    );
    Ok(())
}

fn cmd_delete(api: &GraphApi, graph: &GraphId) -> Result<(), CliError> {
    if api.store().delete_graph(graph)? {
        println!("Deleted '{}'", graph);
        Ok(())
    } else {
        Err(ApiError::NotFound {
            what: format!("graph {graph}"),
        }
        .into())
    }
}

fn cmd_types(api: &GraphApi, graph: &GraphId) -> Result<(), CliError> {
    let mut view = GraphView::default();
    view.render(api.get_graph(graph)?.into());
    for (node_type, count) in view.node_types() {
        println!("{:<24}  {:>7}", node_type, count);
    }
    Ok(())
}

async fn cmd_view(
    api: GraphApi,
    config: &Config,
    graph: GraphId,
    search: Option<String>,
    focus: Option<String>,
    timeout: Duration,
) -> Result<(), CliError> {
    let frame = Duration::from_millis(config.viewport.frame_ms);
    let source: Arc<dyn GraphSource> = Arc::new(api);
    let mut driver = ViewDriver::new(GraphView::new(config), source, frame);

    driver.load_graph(graph.clone());
    driver.settle_fetches().await;
    match driver.view().state() {
        ViewState::Error { message } => return Err(CliError::View(message.clone())),
        ViewState::NotFound { what } => {
            return Err(ApiError::NotFound { what: what.clone() }.into())
        }
        _ => {}
    }
    if let Some(text) = search {
        driver.search(text);
        driver.settle_fetches().await;
    }

    let started = tokio::time::Instant::now();
    while !driver.view().is_settled() && started.elapsed() < timeout {
        driver.step().await;
    }
    if let Some(name) = focus {
        driver.dispatch(Command::View(Box::new(move |view: &mut GraphView| {
            view.focus(&name);
        })));
        while !driver.view().is_settled() && started.elapsed() < timeout {
            driver.step().await;
        }
    } else {
        driver.view_mut().zoom_to_fit();
    }

    info!(graph = %graph, elapsed_ms = started.elapsed().as_millis() as u64, "layout finished");
    print_json(&driver.view().frame())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    let api = open_api(&config, cli.db)?;

    match cli.command {
        Commands::Graphs => cmd_graphs(&api),
        Commands::Import { file } => cmd_import(&api, &file),
        Commands::Export { graph } => print_json(&api.get_graph(&GraphId::from(graph))?),
        Commands::Delete { graph } => cmd_delete(&api, &GraphId::from(graph)),
        Commands::Expand { graph, node, depth } => {
            print_json(&api.get_neighbors(&GraphId::from(graph), &node, depth)?)
        }
        Commands::Search { graph, text } => {
            let nodes = api.search_nodes(&GraphId::from(graph), &text)?;
            for node in nodes {
                println!("{:<32}  {}", node.name, node.node_type);
            }
            Ok(())
        }
        Commands::Types { graph } => cmd_types(&api, &GraphId::from(graph)),
        Commands::View {
            graph,
            search,
            focus,
            timeout_ms,
        } => {
            cmd_view(
                api,
                &config,
                GraphId::from(graph),
                search,
                focus,
                Duration::from_millis(timeout_ms),
            )
            .await
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
