//! One-shot interaction dispatcher.
//!
//! Reads a single interaction payload (JSON) from the file named on the
//! command line, or from stdin, routes it through the demo game, and prints
//! the response body to stdout. Logs go to stderr.
//!
//! ```text
//! discord_router interaction.json
//! echo '{"type":1}' | discord_router
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use discord_router::game::{self, GameContext, GameStore};
use discord_router::types::Interaction;
use discord_router::BoxError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

struct Config {
    /// `RUST_LOG`, defaulting to `info`.
    log_filter: String,
    /// `DISCORD_ROUTER_SEED`: JSON file of games to preload.
    seed: Option<PathBuf>,
}

impl Config {
    fn from_env() -> Self {
        Self {
            log_filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            seed: std::env::var_os("DISCORD_ROUTER_SEED").map(PathBuf::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(config).await {
        error!(error = %e, "dispatch failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    let store = match &config.seed {
        Some(path) => GameStore::load(path).await?,
        None => GameStore::new(),
    };
    let store = Arc::new(store);
    let router = game::router()?;

    let input = read_input(std::env::args().nth(1)).await?;
    let interaction = Interaction::from_json(&input)?;
    let guild = interaction.guild_id().map(str::to_string);
    info!(kind = ?interaction.kind(), guild = ?guild, "received interaction");

    let response = router
        .dispatch(interaction, || {
            GameContext::resolve(Arc::clone(&store), guild.as_deref())
        })
        .await?;

    match response {
        Some(response) => println!("{}", serde_json::to_string_pretty(&response)?),
        None => info!("handler sent no response body"),
    }
    Ok(())
}

async fn read_input(path: Option<String>) -> std::io::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            Ok(input)
        }
    }
}
