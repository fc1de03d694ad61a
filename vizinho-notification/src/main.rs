use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use vizinho_shared::clients::rabbitmq::RabbitMQClient;

pub use vizinho_shared::clients::db::DbPool;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vizinho_shared::middleware::init_tracing("vizinho-notification");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("VIZINHO_JWT_SECRET", &config.jwt_secret);

    let db = vizinho_shared::clients::db::create_pool(&config.database_url, 10)?;

    let metrics_handle = vizinho_shared::middleware::init_metrics();

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq, metrics_handle });

    let exchange_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_exchange_events(exchange_state).await {
            tracing::error!(error = %e, "exchange event subscriber failed");
        }
    });

    let message_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_message_events(message_state).await {
            tracing::error!(error = %e, "message event subscriber failed");
        }
    });

    let business_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_business_events(business_state).await {
            tracing::error!(error = %e, "business event subscriber failed");
        }
    });

    let moderation_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_moderation_events(moderation_state).await {
            tracing::error!(error = %e, "moderation event subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/unread-count", get(routes::notifications::unread_count))
        .route("/notifications/mark-all-read", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", post(routes::notifications::mark_read))
        .layer(axum::middleware::from_fn(vizinho_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "vizinho-notification starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
