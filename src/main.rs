use std::sync::Arc;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use price_watcher::{
    AppState,
    config::AppConfig,
    handlers::build_router,
    jobs::{
        price_watch::{PriceWatcher, start_price_watch_job},
        telegram_bot::{TelegramBot, start_telegram_bot_job},
    },
    scrapers::router::PriceRouter,
    services::{
        notification::{Notifier, TelegramNotifier},
        price_storage::SeaOrmPriceStorage,
        telegram::TelegramClient,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,price_watcher=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    if config.watch.watched_urls().is_empty() {
        tracing::warn!("No product URLs configured; the watch loop will idle");
    }

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    let storage = Arc::new(SeaOrmPriceStorage::new(db));
    let router = Arc::new(PriceRouter::new(config.http_timeout)?);
    let telegram = TelegramClient::new(&config.telegram.bot_token)?;
    let notifier = Arc::new(TelegramNotifier::new(
        telegram.clone(),
        storage.clone(),
        config.telegram.admin_chat_id,
    ));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            tracing::info!("Shutdown signal received");
            cancel.cancel();
        });
    }

    let startup_message = format!(
        "Price watcher started. Watching {} product(s), checking every {} minute(s).",
        config.watch.watched_urls().len(),
        config.watch.effective_interval_minutes()
    );
    if notifier.notify_admin(&startup_message, &cancel).await.is_err() {
        return Ok(());
    }

    let watcher = PriceWatcher::new(router, storage.clone(), notifier, config.watch.clone());
    let watch_job = start_price_watch_job(watcher, cancel.clone());

    let bot = TelegramBot::new(telegram, storage.clone(), config.watch.effective_interval_minutes());
    let bot_job = start_telegram_bot_job(bot, cancel.clone());

    let state = AppState {
        storage,
        watch: Arc::new(config.watch),
        cancel: cancel.clone(),
    };
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.http_bind_address).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    // The server can also stop on its own; make sure the jobs follow
    cancel.cancel();
    let _ = tokio::join!(watch_job, bot_job);

    tracing::info!("Price watcher stopped");
    Ok(())
}
