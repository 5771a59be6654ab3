//! CLI entry point for the metalcore-network view engine.
//!
//! `show` fetches one graph and writes the render scene as JSON to stdout.
//! `replay` plays a recorded list of user actions (JSON on stdin) through a
//! live session, one at a time once the previous one has settled, and writes
//! the final session view.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

use metalcore_client::{GraphFetchClient, GraphSource};
use metalcore_core::{DashboardConfig, RelationshipKind, UserAction};
use metalcore_network::{Completion, Effect, NetworkSession, NetworkState, RelationshipFilter};

#[derive(Parser)]
#[command(name = "metalcore-network")]
#[command(about = "Relationship graph view engine for the Metalcore dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: metalcore).
    #[arg(short, long, default_value = "metalcore", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch one graph and print the render scene.
    Show {
        /// Artist (or any node label) to center on.
        #[arg(long)]
        center: Option<String>,
        /// Traversal depth, clamped to 1..=3.
        #[arg(long)]
        depth: Option<u8>,
        /// Top-N cap for the uncentered overview.
        #[arg(long)]
        top: Option<u32>,
        /// Relationship kind to hide (repeatable), e.g. `signed_to`.
        #[arg(long = "hide")]
        hide: Vec<String>,
        /// Only show artist-to-artist links.
        #[arg(long)]
        artist_only: bool,
    },
    /// Replay a JSON array of user actions from stdin.
    Replay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = DashboardConfig::load(&cli.config)?;
    let client = GraphFetchClient::new(&config.api)?;
    tracing::info!(base_url = %client.base_url(), "Configuration loaded");

    match cli.command {
        Command::Show {
            center,
            depth,
            top,
            hide,
            artist_only,
        } => {
            let mut filter = RelationshipFilter::new();
            for name in &hide {
                let kind: RelationshipKind = name.parse()?;
                filter.set_enabled(kind, false);
            }
            filter.set_artist_only(artist_only);

            let mut state = NetworkState::new(&config.network)
                .with_center(center.as_deref())
                .with_filter(filter);

            let mut request = state.refresh();
            let mut controls = Vec::new();
            if let Some(depth) = depth {
                controls.push(UserAction::SetDepth { depth });
            }
            if let Some(top_n) = top {
                controls.push(UserAction::SetTopN { top_n: Some(top_n) });
            }
            for action in controls {
                for effect in state.dispatch(action, Instant::now())? {
                    if let Effect::Fetch(next) = effect {
                        request = next;
                    }
                }
            }

            let result = client.fetch_graph(&request.query).await;
            if let Completion::Failed(err) = state.complete_fetch(request.seq, result) {
                return Err(err.into());
            }
            println!("{}", serde_json::to_string_pretty(&state.scene())?);
        }
        Command::Replay => {
            let input = std::io::read_to_string(std::io::stdin())?;
            let actions: Vec<UserAction> = serde_json::from_str(&input)?;
            tracing::info!(actions = actions.len(), "Replaying actions");

            let source: Arc<dyn GraphSource> = Arc::new(client);
            let mut handle = NetworkSession::spawn(source, NetworkState::new(&config.network));
            // Each action runs against the graph its predecessors loaded.
            handle.settle().await?;
            for action in actions {
                handle.send(action).await?;
                handle.settle().await?;
            }
            let view = handle.close().await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}
