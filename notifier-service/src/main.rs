mod api_client;
mod cache;
mod campaign;
mod composer;
mod config;
mod dispatch;
mod handlers;
mod mailer;
mod openapi;
mod subscribers;

use axum::{
    Router,
    routing::{get, post},
};
use common::tracing::init_tracing_pretty;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing_pretty();

    let config = config::Config::from_env();
    let cancellation_token = CancellationToken::new();

    let pool = subscribers::create_pool(&config.database_url).await?;

    let client =
        api_client::ForecastClient::new(config.weather_api_url.clone(), config.http_timeout_seconds);
    let cache = Arc::new(cache::ForecastCache::new(
        client,
        Duration::from_secs(config.cache_ttl_seconds),
    ));
    let mailer = Arc::new(mailer::HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_server_token.clone(),
        config.send_timeout_seconds,
    ));
    let dispatch = Arc::new(dispatch::DispatchExecutor::new(
        mailer,
        config.mail_sender.clone(),
        config.max_inflight_sends,
        Duration::from_secs(config.send_timeout_seconds),
    ));
    let store = Arc::new(subscribers::PgSubscriberStore::new(pool));
    let runner = Arc::new(campaign::CampaignRunner::new(
        store,
        Arc::clone(&cache),
        composer::NotificationComposer::new(),
        Arc::clone(&dispatch),
        config.weather_api_key.clone(),
        config.max_concurrent_lookups,
        cancellation_token.clone(),
    ));

    let state = handlers::AppState {
        runner,
        cache,
        dispatch: Arc::clone(&dispatch),
        api_key: config.weather_api_key.clone(),
    };

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/campaign/send", post(handlers::send_campaign))
        .route("/api/campaign/stats", get(handlers::campaign_stats))
        .route("/api/forecast/{state}/{city}", get(handlers::get_forecast))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Notifier service starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancellation_token))
        .await?;

    info!("Draining in-flight notification sends...");
    dispatch.drain().await;

    info!("Notifier service stopped");
    Ok(())
}

async fn shutdown_signal(cancellation_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    // Stop handing new work to the campaign; in-flight sends drain after
    // the server loop exits.
    cancellation_token.cancel();
    warn!("Cancelled campaign processing, shutting down gracefully...");
}
