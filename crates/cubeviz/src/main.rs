//! Cubeviz demo CLI.
//!
//! Loads a graph payload from a JSON file (a serialized
//! [`cubeviz::fetch::GraphResponse`]), runs it through the graph state
//! engine, and prints the visible graph for the requested depth and group
//! selection.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use cubeviz::controller::{Action, ViewController, ViewState};
use cubeviz::domain::NodeId;
use cubeviz::error::Error;
use cubeviz::fetch::{GraphFetcher, GraphRequest, GraphResponse, TraitRequest};
use cubeviz::render::HeadlessRenderer;
use cubeviz::scope::{storage_key, FileScopeStore, Scope, ScopeStorage};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Explore a cube dependency graph payload from the command line.
#[derive(Debug, Parser)]
#[command(name = "cubeviz", version, about)]
struct Cli {
    /// Path to a JSON graph payload (a serialized GraphResponse).
    graph: PathBuf,

    /// Cube name to visualize.
    #[arg(long)]
    cube: String,

    /// Visible depth; defaults to the payload's selected level.
    #[arg(long)]
    level: Option<u32>,

    /// Groups to display, comma separated; defaults to the payload's
    /// selection.
    #[arg(long, value_delimiter = ',')]
    groups: Vec<String>,

    /// Scope text, e.g. "state:OH, product:WORKCOMP".
    #[arg(long)]
    scope: Option<String>,

    /// Node IDs whose subtrees should be collapsed.
    #[arg(long, value_delimiter = ',')]
    cluster: Vec<String>,

    /// Path of the persisted scope store.
    #[arg(long, default_value = ".cubeviz/scopemap.json")]
    scope_store: PathBuf,
}

/// Fetcher that serves a single payload from disk.
struct FileFetcher {
    response: GraphResponse,
}

#[async_trait]
impl GraphFetcher for FileFetcher {
    async fn fetch_graph(&self, _request: GraphRequest) -> cubeviz::error::Result<GraphResponse> {
        Ok(self.response.clone())
    }

    async fn fetch_traits(&self, _request: TraitRequest) -> cubeviz::error::Result<GraphResponse> {
        Err(Error::Fetch("trait fetch is not available offline".to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cubeviz=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.graph)
        .with_context(|| format!("reading graph payload {}", cli.graph.display()))?;
    let response: GraphResponse =
        serde_json::from_str(&text).context("parsing graph payload")?;

    let fetcher = FileFetcher { response };
    let mut store = FileScopeStore::new(&cli.scope_store);

    // Persist the requested scope up front; load() resolves scope from the
    // store, the same way an edited scope field is saved before a reload.
    if let Some(scope) = &cli.scope {
        let key = storage_key("cubeviz-cli", &cli.cube);
        store.save(&key, &Scope::parse(scope))?;
    }

    let mut controller = ViewController::new(
        Box::new(fetcher),
        Box::new(store),
        HeadlessRenderer::new(),
        "cubeviz-cli",
    );

    controller.dispatch(Action::SelectCube(cli.cube.clone())).await?;

    match controller.state() {
        ViewState::Loaded => {}
        ViewState::MissingScope => {
            println!(
                "{} supply scope via --scope (current: \"{}\")",
                "missing start scope:".yellow(),
                controller.scope_text()
            );
            return Ok(());
        }
        _ => {
            for notice in controller.take_notices() {
                eprintln!("{} {}", "error:".red(), notice.message);
            }
            std::process::exit(1);
        }
    }

    if let Some(level) = cli.level {
        controller.dispatch(Action::SetLevel(level)).await?;
    }
    if !cli.groups.is_empty() {
        for row in controller.group_rows() {
            let wanted = cli.groups.iter().any(|g| g.eq_ignore_ascii_case(&row.key));
            if row.selected != wanted {
                controller.dispatch(Action::ToggleGroup(row.key.clone())).await?;
            }
        }
        controller.dispatch(Action::Reload).await?;
    }
    for root in &cli.cluster {
        controller
            .dispatch(Action::Cluster(NodeId::new(root.clone())))
            .await?;
    }

    print_view(&mut controller);
    Ok(())
}

fn print_view(controller: &mut ViewController<HeadlessRenderer>) {
    println!("{}", controller.counts_line().bold());
    println!(
        "scope: {}",
        if controller.scope_text().is_empty() {
            "(none)".to_string()
        } else {
            controller.scope_text()
        }
    );
    if let Some(level) = controller.selected_level() {
        println!("level: {level} of {}", controller.level_options().len());
    }

    println!();
    for row in controller.group_rows() {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        println!("{mark} {} ({})", row.label, row.key);
    }

    println!();
    let renderer = controller.renderer();
    for node in renderer.displayed_nodes() {
        println!(
            "{} {} {}",
            node.id.as_str().green(),
            node.label,
            format!("(level {}, {})", node.level, node.group).dimmed()
        );
    }
    for id in renderer.collapsed_clusters() {
        println!("{} {}", id.as_str().cyan(), "collapsed cluster".dimmed());
    }
    println!();
    println!("{} edges displayed", renderer.displayed_edges().len());

    for notice in controller.take_notices() {
        eprintln!("{} {}", "note:".yellow(), notice.message);
    }
}
