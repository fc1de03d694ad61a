use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod domain;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use vizinho_shared::clients::minio::MinioClient;
use vizinho_shared::clients::rabbitmq::RabbitMQClient;

pub use vizinho_shared::clients::db::DbPool;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub minio: MinioClient,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vizinho_shared::middleware::init_tracing("vizinho-exchange");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("VIZINHO_JWT_SECRET", &config.jwt_secret);

    let db = vizinho_shared::clients::db::create_pool(&config.database_url, 10)?;

    let metrics_handle = vizinho_shared::middleware::init_metrics();

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let minio = MinioClient::new(
        &config.minio_endpoint,
        &config.minio_access_key,
        &config.minio_secret_key,
        &config.minio_bucket,
        &config.minio_public_url,
    )
    .await;

    let state = Arc::new(AppState { db, config, rabbitmq, minio, metrics_handle });

    // Moderation decisions arrive over RabbitMQ, not HTTP
    let sub_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_moderation_events(sub_state).await {
            tracing::error!(error = %e, "moderation subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route(
            "/profiles/me",
            get(routes::profiles::get_me).put(routes::profiles::update_me),
        )
        .route(
            "/profiles/me/avatar",
            post(routes::profiles::upload_avatar).layer(DefaultBodyLimit::max(5 * 1024 * 1024)),
        )
        .route("/profiles/:id", get(routes::profiles::get_user))
        .route("/profiles/:id/reviews", get(routes::reviews::list_reviews_for_user))
        .route("/ranking", get(routes::ranking::get_ranking))
        .route(
            "/requests",
            get(routes::requests::list_requests).post(routes::requests::create_request),
        )
        .route("/requests/:id", get(routes::requests::get_request))
        .route("/requests/:id/cancel", post(routes::requests::cancel_request))
        .route(
            "/requests/:id/offers",
            get(routes::offers::list_offers_for_request).post(routes::offers::submit_offer),
        )
        .route(
            "/requests/:id/images",
            post(routes::images::upload_request_image)
                .layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route(
            "/requests/:id/images/:image_id",
            axum::routing::delete(routes::images::delete_request_image),
        )
        .route("/offers/mine", get(routes::offers::list_my_offers))
        .route("/offers/:id/accept", post(routes::offers::accept_offer))
        .route("/offers/:id/reject", post(routes::offers::reject_offer))
        .route("/offers/:id/borrowed", post(routes::offers::mark_borrowed))
        .route("/offers/:id/returned", post(routes::offers::mark_returned))
        .route("/reviews", post(routes::reviews::create_review))
        // Internal service-to-service endpoints (no auth)
        .route("/internal/users", post(routes::internal::provision_user))
        .route("/internal/profiles/batch", post(routes::internal::batch_profiles))
        .layer(axum::middleware::from_fn(vizinho_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "vizinho-exchange starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
