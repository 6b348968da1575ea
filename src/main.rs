use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use agendabot::config::AppConfig;
use agendabot::db;
use agendabot::handlers;
use agendabot::models::Catalog;
use agendabot::services::gateway::ledger::LedgerGateway;
use agendabot::services::messaging::zapi::ZapiProvider;
use agendabot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let catalog = Catalog::load(&config.price_list_path)?;
    tracing::info!(services = catalog.len(), "loaded service catalog");

    let conn = db::init_db(&config.database_url)?;
    let db = Arc::new(Mutex::new(conn));

    let gateway = LedgerGateway::new(Arc::clone(&db), &catalog);

    if config.zapi_instance_id.is_empty() {
        tracing::warn!("Z_API_INSTANCE_ID not set, outbound messages will fail");
    }
    let messaging = ZapiProvider::new(
        config.zapi_instance_id.clone(),
        config.zapi_token.clone(),
        config.zapi_client_token.clone(),
    );

    let state = Arc::new(AppState::new(
        db,
        config.clone(),
        Box::new(gateway),
        Box::new(messaging),
        catalog,
    ));

    let app = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/webhook", post(handlers::webhook::receive_webhook))
        .route("/chat/message", post(handlers::chat::chat_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
