use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod ratings;
mod routes;
mod schema;

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
    vizinho_shared::middleware::init_tracing("vizinho-business");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("VIZINHO_JWT_SECRET", &config.jwt_secret);

    let db = vizinho_shared::clients::db::create_pool(&config.database_url, 10)?;

    let metrics_handle = vizinho_shared::middleware::init_metrics();

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq, metrics_handle });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/categories", get(routes::categories::list_categories))
        .route(
            "/businesses",
            get(routes::businesses::list_businesses).post(routes::businesses::create_business),
        )
        .route("/businesses/mine", get(routes::businesses::list_my_businesses))
        .route(
            "/businesses/:id",
            get(routes::businesses::get_business).patch(routes::businesses::update_business),
        )
        .route(
            "/businesses/:id/reviews",
            get(routes::reviews::list_reviews).post(routes::reviews::create_review),
        )
        // Admin moderation queue
        .route("/admin/businesses", get(routes::businesses::list_for_moderation))
        .route("/businesses/:id/approve", post(routes::businesses::approve_business))
        .route("/businesses/:id/reject", post(routes::businesses::reject_business))
        .layer(axum::middleware::from_fn(vizinho_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "vizinho-business starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
