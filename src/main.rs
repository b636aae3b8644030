//! Slides Backend
//!
//! A REST API server for AI-powered lesson slide deck generation.
//! Provides a full-deck endpoint and an SSE endpoint that streams slides
//! one by one as they are generated.

mod api;
mod backend;
mod config;
mod error;
mod generation;
mod state;

use axum::{
    extract::Request,
    extract::State,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use backend::{BackendClient, HttpCompletionApi};
use config::Config;
use generation::SlideService;
use serde::Serialize;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Serialize)]
struct HelloResponse {
    message: String,
    status: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    available_slots: usize,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!(
        max_concurrent = config.generation.max_concurrent_generations,
        timeout_secs = config.generation.llm_request_timeout_secs,
        cache_enabled = config.cache.enabled,
        model = %config.backend.model,
        "Configuration loaded"
    );
    if config.backend.api_key.is_empty() {
        warn!("LLM_API_KEY is not set; generation requests will fail");
    }

    // Initialize shared state: one HTTP client, one backend client, one
    // generation service for the whole process.
    let http_client = reqwest::Client::new();
    let completion_api = HttpCompletionApi::new(http_client, &config.backend);
    let backend_client = BackendClient::new(
        Arc::new(completion_api),
        config.generation.llm_request_timeout_secs,
    );
    let app_state = AppState::new(SlideService::new(
        backend_client,
        &config.generation,
        &config.cache,
    ));

    // Build our application with routes
    let app = Router::new()
        // Health check and hello world
        .route("/", get(hello_world))
        .route("/api/health", get(health_check))
        // Slide deck generation API
        .route("/api/slides", post(api::slides::generate_deck))
        .route("/api/slides/stream", post(api::slides::stream_deck))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive()) // Allow CORS for development
        .with_state(app_state);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("🚀 Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from Slides Backend!".to_string(),
        status: "ok".to_string(),
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        available_slots: state.slides.available_slots(),
    })
}
