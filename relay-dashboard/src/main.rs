//! Relay Guard Dashboard Server
//!
//! Operator dashboard for relay attack detection: enter one row of relay
//! telemetry, get an Attack / Natural verdict, browse the analytics charts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RELAY GUARD DASHBOARD                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  Pages    │  │  JSON API │  │  Session Store          │ │
//! │  │  (maud)   │  │  (v1)     │  │  (cookie -> context)    │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │     ┌──────────────────────────┐   ┌──────────────────┐     │
//! │     │ ModelRegistry (5 x ONNX) │   │  analytics.csv   │     │
//! │     └──────────────────────────┘   └──────────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod session;
mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use relay_core::{AnalyticsSource, ModelRegistry};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};
use session::SessionStore;

const DEFAULT_LOG_FILTER: &str = "relay_dashboard=debug,relay_core=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("{} v{} starting...", relay_core::constants::APP_NAME, relay_core::constants::APP_VERSION);

    // Every section needs its classifier; no partial mode
    let models = ModelRegistry::load(&config.model_dir)
        .with_context(|| format!("Failed to load classifiers from {}", config.model_dir.display()))?;

    let analytics = AnalyticsSource::new(&config.analytics_path);
    if !analytics.exists() {
        tracing::warn!("Analytics file {} not found; charts will show warnings", analytics.path().display());
    }

    // Build application state
    let state = AppState {
        models: Arc::new(models),
        analytics: Arc::new(analytics),
        sessions: Arc::new(SessionStore::new(config.session_ttl())),
        config: config.clone(),
    };

    let app = create_router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelRegistry>,
    pub analytics: Arc<AnalyticsSource>,
    pub sessions: Arc<SessionStore>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Dashboard pages (session cookie)
    let page_routes = Router::new()
        .route("/", get(handlers::dashboard::index))
        .route("/predict/:section", post(handlers::dashboard::predict))
        .route("/session/overall.csv", get(handlers::dashboard::export_overall));

    // JSON API (stateless)
    let api_routes = Router::new()
        .route("/api/v1/schemas", get(handlers::api::schemas))
        .route("/api/v1/predict/:section", post(handlers::api::predict))
        .route("/api/v1/status", get(handlers::api::status));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(page_routes)
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
