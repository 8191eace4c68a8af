mod config;
mod db;
mod jobs;
mod routes;
mod scheduler;
mod telegram;
mod types;

use crate::config::ServerConfig;
use crate::db::SyncRepository;
use crate::jobs::{CatalogSync, Notifier};
use crate::routes::AppState;
use crate::telegram::TelegramClient;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use version_sentry_feed::ReleaseDataClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    // Spawn the periodic sync-then-notify loop
    let feed = Arc::new(
        ReleaseDataClient::new(&config.github_token).expect("failed to build feed client"),
    );
    let sender = Arc::new(
        TelegramClient::new(&config.telegram.bot_token).expect("failed to build telegram client"),
    );
    let sync = CatalogSync::new(
        Arc::new(SyncRepository::new(db_pool.clone())),
        feed,
        Duration::from_millis(config.sync.fetch_delay_ms),
    );
    let notifier = Notifier::new(
        db_pool.clone(),
        sender,
        Duration::from_millis(config.sync.send_delay_ms),
    );
    let _sync_loop = scheduler::spawn(
        sync,
        notifier,
        Duration::from_secs(config.sync.interval_seconds),
    );

    let state = AppState::new(db_pool, config.app_name, config.telegram.webhook_secret);
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install shutdown signal handler");
    tracing::info!("shutdown signal received");
}
