//! Synoptic chart analysis API service.
//!
//! HTTP server exposing the analysis engine: triggers runs per level and
//! observation time, ingests encoded station reports, and serves results as
//! GeoJSON FeatureCollections.

mod geojson;
mod handlers;
mod state;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "chart-api")]
#[command(about = "Synoptic chart analysis API server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Use the in-memory store instead of PostgreSQL
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(AppState::new(args.dev).await?);
    info!(dev_mode = args.dev, "Application state initialized");

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/analysis/:level", post(handlers::analyze))
        .route("/stations", post(handlers::upsert_station))
        .route("/reports/synop", post(handlers::ingest_synop))
        .route("/reports/ttaa", post(handlers::ingest_ttaa))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(listen = %args.listen, "chart-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
