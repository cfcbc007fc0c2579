//! Query server for routing code lookups.
//!
//! Loads the validation and record snapshots once, then serves validation,
//! lookup, district search and nearby search over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pinpoint::{Config, QueryEngine};

mod routes;
use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Routing code query server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// Validation snapshot (overrides config)
    #[arg(long)]
    validation_snapshot: Option<PathBuf>,

    /// Record snapshot (overrides config)
    #[arg(long)]
    record_snapshot: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(path) = self.validation_snapshot {
            config.data.validation_snapshot = path;
        }
        if let Some(path) = self.record_snapshot {
            config.data.record_snapshot = path;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config()?;

    info!("Pinpoint Query Server");

    let engine = QueryEngine::open(&config.data);
    let stats = engine.stats();
    info!(
        "Serving {} codes across {} prefixes, {} post office records",
        stats.codes, stats.prefixes, stats.records
    );

    let state = Arc::new(AppState {
        engine,
        query: config.query.clone(),
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
