#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use price_watcher::error::Cancelled;
use price_watcher::models::price::{PriceCheckResult, ProductPriceHistory};
use price_watcher::models::subscriber::Subscriber;
use price_watcher::scrapers::router::PriceSource;
use price_watcher::services::notification::{DeliveryReport, Notifier};
use price_watcher::services::price_storage::{PriceStorage, StorageError};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;

/// Fresh in-memory SQLite database with all migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });

    addr
}

/// Price source answering from a fixed table; unknown URLs yield no price.
#[derive(Default)]
pub struct ScriptedPriceSource {
    prices: Mutex<HashMap<String, Decimal>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedPriceSource {
    pub fn set_price(&self, url: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(url.to_string(), price);
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    async fn fetch_price(&self, url: &str, _cancel: &CancellationToken) -> Result<Option<Decimal>, Cancelled> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(self.prices.lock().unwrap().get(url).copied())
    }
}

/// Price source that never answers until cancelled.
pub struct HangingPriceSource;

#[async_trait]
impl PriceSource for HangingPriceSource {
    async fn fetch_price(&self, _url: &str, cancel: &CancellationToken) -> Result<Option<Decimal>, Cancelled> {
        cancel.cancelled().await;
        Err(Cancelled)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<PriceCheckResult>>,
    admin_messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<PriceCheckResult> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn admin_messages(&self) -> Vec<String> {
        self.admin_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_price_change(
        &self,
        result: &PriceCheckResult,
        _cancel: &CancellationToken,
    ) -> Result<DeliveryReport, Cancelled> {
        self.notifications.lock().unwrap().push(result.clone());
        Ok(DeliveryReport {
            delivered: 1,
            failed: 0,
        })
    }

    async fn notify_admin(&self, message: &str, _cancel: &CancellationToken) -> Result<bool, Cancelled> {
        self.admin_messages.lock().unwrap().push(message.to_string());
        Ok(true)
    }
}

/// Storage whose every operation fails with a database error.
pub struct FailingStorage;

fn unavailable<T>() -> Result<T, StorageError> {
    Err(StorageError::Database("database is unavailable".to_string()))
}

#[async_trait]
impl PriceStorage for FailingStorage {
    async fn get_last_price(
        &self,
        _product_url: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<ProductPriceHistory>, StorageError> {
        unavailable()
    }

    async fn upsert_price(
        &self,
        _history: &ProductPriceHistory,
        _cancel: &CancellationToken,
    ) -> Result<(), StorageError> {
        unavailable()
    }

    async fn list_price_histories(&self, _cancel: &CancellationToken) -> Result<Vec<ProductPriceHistory>, StorageError> {
        unavailable()
    }

    async fn list_active_subscribers(&self, _cancel: &CancellationToken) -> Result<Vec<Subscriber>, StorageError> {
        unavailable()
    }

    async fn get_subscriber(&self, _chat_id: i64, _cancel: &CancellationToken) -> Result<Option<Subscriber>, StorageError> {
        unavailable()
    }

    async fn add_or_activate_subscriber(
        &self,
        _chat_id: i64,
        _cancel: &CancellationToken,
    ) -> Result<Subscriber, StorageError> {
        unavailable()
    }

    async fn deactivate_subscriber(&self, _chat_id: i64, _cancel: &CancellationToken) -> Result<bool, StorageError> {
        unavailable()
    }

    async fn count_watched_products(&self, _cancel: &CancellationToken) -> Result<u64, StorageError> {
        unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        assert!(db.is_ok(), "In-memory test database should be created and migrated");
    }
}
