//! Preflight API Server - HTTP wrapper around the validation engine
//!
//! Provides REST endpoints for:
//! - Specification CRUD
//! - Order-text parsing
//! - Document upload and validation
//! - Validation result retrieval

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod handlers;
mod models;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("preflight_api=info".parse()?)
                .add_directive("preflight_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing Preflight API...");
    let state = Arc::new(AppState::new());

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Specification CRUD
        .route("/api/specs", post(handlers::create_spec))
        .route("/api/specs", get(handlers::list_specs))
        .route("/api/specs/:id", get(handlers::get_spec))
        // Order parsing
        .route("/api/orders/parse", post(handlers::parse_order_text))
        // Validation
        .route("/api/validate", post(handlers::validate))
        .route("/api/results/:id", get(handlers::get_result))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Parse bind address
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting Preflight API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
