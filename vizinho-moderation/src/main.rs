use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
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
    vizinho_shared::middleware::init_tracing("vizinho-moderation");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("VIZINHO_JWT_SECRET", &config.jwt_secret);

    let db = vizinho_shared::clients::db::create_pool(&config.database_url, 10)?;

    let metrics_handle = vizinho_shared::middleware::init_metrics();

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq, metrics_handle });

    let admin_routes = Router::new()
        .route("/reports", get(routes::admin_routes::list_reports))
        .route("/reports/:id", get(routes::admin_routes::get_report))
        .route("/reports/:id/review", put(routes::admin_routes::review_report))
        .route("/users/:id/block", post(routes::admin_routes::block_user))
        .route("/users/:id/unblock", post(routes::admin_routes::unblock_user))
        .route("/users/:id/role", put(routes::admin_routes::change_role))
        .route("/users/:id", delete(routes::admin_routes::delete_user))
        .route("/requests/:id", delete(routes::admin_routes::remove_request))
        .route("/stats", get(routes::admin_routes::get_stats))
        .route("/audit-log", get(routes::admin_routes::get_audit_log));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/reports", post(routes::user_routes::create_report))
        .route("/reports/mine", get(routes::user_routes::list_my_reports))
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn(vizinho_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "vizinho-moderation starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
