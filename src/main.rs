use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use farefinder::config::AppConfig;
use farefinder::db;
use farefinder::handlers;
use farefinder::services::ai::openai::OpenAiClient;
use farefinder::services::flights::duffel::DuffelClient;
use farefinder::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    anyhow::ensure!(!config.openai_api_key.is_empty(), "OPENAI_API_KEY must be set");
    anyhow::ensure!(!config.duffel_api_key.is_empty(), "DUFFEL_API_KEY must be set");

    tracing::info!(model = %config.openai_model, "using OpenAI structured output client");
    let ai = OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    );
    let flights = DuffelClient::new(config.duffel_api_key.clone(), config.duffel_base_url.clone());

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        ai: Box::new(ai),
        flights: Box::new(flights),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .route("/searches/history", get(handlers::searches::get_history))
        .route("/searches/popular", get(handlers::searches::get_popular))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
