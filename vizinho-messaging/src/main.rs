use axum::routing::{get, post};
use axum::Router;
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod socket;

use config::AppConfig;
use vizinho_shared::clients::rabbitmq::RabbitMQClient;
use vizinho_shared::clients::redis::RedisClient;

pub use vizinho_shared::clients::db::DbPool;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub io: SocketIo,
    pub http_client: reqwest::Client,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vizinho_shared::middleware::init_tracing("vizinho-messaging");

    let config = AppConfig::load()?;
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("VIZINHO_JWT_SECRET", &config.jwt_secret);

    let db = vizinho_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    // io lives in AppState so REST handlers can emit to connected clients
    let (sio_layer, io) = SocketIo::builder().build_layer();

    let metrics_handle = vizinho_shared::middleware::init_metrics();

    let http_client = reqwest::Client::new();
    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        io: io.clone(),
        http_client,
        metrics_handle,
    });

    io.ns("/", {
        let state = state.clone();
        move |socket: socketioxide::extract::SocketRef| {
            let state = state.clone();
            async move {
                socket::handlers::on_connect_with_state(socket, state).await;
            }
        }
    });

    // New offers open their conversation eagerly
    let sub_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_offer_submitted(sub_state).await {
            tracing::error!(error = %e, "offer.submitted subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route(
            "/conversations",
            get(routes::conversations::list_conversations)
                .post(routes::conversations::open_conversation),
        )
        .route("/conversations/:id", get(routes::conversations::get_conversation))
        .route(
            "/conversations/:id/messages",
            get(routes::messages::list_messages).post(routes::messages::send_message),
        )
        .route("/conversations/:id/read", post(routes::messages::mark_as_read))
        .route("/unread-count", get(routes::messages::get_unread_count))
        .layer(axum::middleware::from_fn(vizinho_shared::middleware::metrics_middleware))
        .layer(sio_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "vizinho-messaging starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
