//! Persistence of price history and Telegram subscribers.
//!
//! Every logical operation runs inside one critical section so that read-then-write
//! sequences (upsert, add-or-activate) from the watch loop and the bot never interleave.

use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::entities::prelude::{ProductPriceHistory as PriceHistoryEntity, TelegramSubscribers};
use crate::entities::{product_price_history, telegram_subscribers};
use crate::models::price::ProductPriceHistory;
use crate::models::subscriber::Subscriber;

#[derive(Debug)]
pub enum StorageError {
    Cancelled,
    Database(String),
    InvalidRecord(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Cancelled => write!(f, "Storage operation cancelled"),
            StorageError::Database(msg) => write!(f, "Database error: {}", msg),
            StorageError::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<DbErr> for StorageError {
    fn from(e: DbErr) -> Self {
        StorageError::Database(e.to_string())
    }
}

#[async_trait]
pub trait PriceStorage: Send + Sync {
    async fn get_last_price(
        &self,
        product_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ProductPriceHistory>, StorageError>;

    /// Insert or update the record for `history.product_url`. An existing record keeps its id.
    async fn upsert_price(
        &self,
        history: &ProductPriceHistory,
        cancel: &CancellationToken,
    ) -> Result<(), StorageError>;

    async fn list_price_histories(&self, cancel: &CancellationToken) -> Result<Vec<ProductPriceHistory>, StorageError>;

    /// Active subscribers, oldest first.
    async fn list_active_subscribers(&self, cancel: &CancellationToken) -> Result<Vec<Subscriber>, StorageError>;

    async fn get_subscriber(&self, chat_id: i64, cancel: &CancellationToken) -> Result<Option<Subscriber>, StorageError>;

    async fn add_or_activate_subscriber(
        &self,
        chat_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Subscriber, StorageError>;

    /// True if a record existed and is now inactive.
    async fn deactivate_subscriber(&self, chat_id: i64, cancel: &CancellationToken) -> Result<bool, StorageError>;

    async fn count_watched_products(&self, cancel: &CancellationToken) -> Result<u64, StorageError>;
}

/// SeaORM-backed storage (SQLite by default, Postgres supported).
pub struct SeaOrmPriceStorage {
    db: DatabaseConnection,
    lock: Mutex<()>,
}

impl SeaOrmPriceStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            lock: Mutex::new(()),
        }
    }

    /// Run `operation` while holding the storage lock, abandoning it on cancellation.
    async fn exclusive<T, F>(&self, cancel: &CancellationToken, operation: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StorageError::Cancelled),
            result = async {
                let _guard = self.lock.lock().await;
                operation.await
            } => result,
        }
    }

    async fn load_history(&self, product_url: &str) -> Result<Option<ProductPriceHistory>, StorageError> {
        PriceHistoryEntity::find()
            .filter(product_price_history::Column::ProductUrl.eq(product_url))
            .one(&self.db)
            .await?
            .map(history_from_model)
            .transpose()
    }

    async fn save_history(&self, history: &ProductPriceHistory) -> Result<(), StorageError> {
        let existing = PriceHistoryEntity::find()
            .filter(product_price_history::Column::ProductUrl.eq(&history.product_url))
            .one(&self.db)
            .await?;

        match existing {
            Some(record) => {
                let mut active = record.into_active_model();
                active.last_price = Set(history.last_price.to_string());
                active.last_check_time = Set(history.last_check_time.naive_utc());
                active.update(&self.db).await?;
            }
            None => {
                let record = product_price_history::ActiveModel {
                    id: Set(history.id.to_string()),
                    product_url: Set(history.product_url.clone()),
                    last_price: Set(history.last_price.to_string()),
                    last_check_time: Set(history.last_check_time.naive_utc()),
                };
                record.insert(&self.db).await?;
            }
        }

        Ok(())
    }

    async fn load_histories(&self) -> Result<Vec<ProductPriceHistory>, StorageError> {
        PriceHistoryEntity::find()
            .order_by_asc(product_price_history::Column::ProductUrl)
            .all(&self.db)
            .await?
            .into_iter()
            .map(history_from_model)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn count_histories(&self) -> Result<u64, StorageError> {
        Ok(PriceHistoryEntity::find().count(&self.db).await?)
    }

    async fn load_active_subscribers(&self) -> Result<Vec<Subscriber>, StorageError> {
        TelegramSubscribers::find()
            .filter(telegram_subscribers::Column::IsActive.eq(true))
            .order_by_asc(telegram_subscribers::Column::CreatedAt)
            .order_by_asc(telegram_subscribers::Column::ChatId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(subscriber_from_model)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn find_subscriber(&self, chat_id: i64) -> Result<Option<telegram_subscribers::Model>, StorageError> {
        Ok(TelegramSubscribers::find()
            .filter(telegram_subscribers::Column::ChatId.eq(chat_id))
            .one(&self.db)
            .await?)
    }

    async fn load_subscriber(&self, chat_id: i64) -> Result<Option<Subscriber>, StorageError> {
        self.find_subscriber(chat_id).await?.map(subscriber_from_model).transpose()
    }

    async fn activate_subscriber(&self, chat_id: i64) -> Result<Subscriber, StorageError> {
        let model = match self.find_subscriber(chat_id).await? {
            Some(record) if record.is_active => record,
            Some(record) => {
                let mut active = record.into_active_model();
                active.is_active = Set(true);
                active.update(&self.db).await?
            }
            None => {
                let record = telegram_subscribers::ActiveModel {
                    id: Set(Uuid::new_v4().to_string()),
                    chat_id: Set(chat_id),
                    is_active: Set(true),
                    created_at: Set(Utc::now().naive_utc()),
                };
                record.insert(&self.db).await?
            }
        };

        subscriber_from_model(model)
    }

    async fn disable_subscriber(&self, chat_id: i64) -> Result<bool, StorageError> {
        let Some(record) = self.find_subscriber(chat_id).await? else {
            return Ok(false);
        };

        let mut active = record.into_active_model();
        active.is_active = Set(false);
        active.update(&self.db).await?;
        Ok(true)
    }
}

fn history_from_model(model: product_price_history::Model) -> Result<ProductPriceHistory, StorageError> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|e| StorageError::InvalidRecord(format!("price history id {}: {}", model.id, e)))?;
    let last_price = Decimal::from_str(&model.last_price)
        .map_err(|e| StorageError::InvalidRecord(format!("price {} for {}: {}", model.last_price, model.product_url, e)))?;

    Ok(ProductPriceHistory {
        id,
        product_url: model.product_url,
        last_price,
        last_check_time: model.last_check_time.and_utc(),
    })
}

fn subscriber_from_model(model: telegram_subscribers::Model) -> Result<Subscriber, StorageError> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|e| StorageError::InvalidRecord(format!("subscriber id {}: {}", model.id, e)))?;

    Ok(Subscriber {
        id,
        chat_id: model.chat_id,
        is_active: model.is_active,
        created_at: model.created_at.and_utc(),
    })
}

#[async_trait]
impl PriceStorage for SeaOrmPriceStorage {
    async fn get_last_price(
        &self,
        product_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ProductPriceHistory>, StorageError> {
        self.exclusive(cancel, self.load_history(product_url)).await
    }

    async fn upsert_price(
        &self,
        history: &ProductPriceHistory,
        cancel: &CancellationToken,
    ) -> Result<(), StorageError> {
        self.exclusive(cancel, self.save_history(history)).await
    }

    async fn list_price_histories(&self, cancel: &CancellationToken) -> Result<Vec<ProductPriceHistory>, StorageError> {
        self.exclusive(cancel, self.load_histories()).await
    }

    async fn list_active_subscribers(&self, cancel: &CancellationToken) -> Result<Vec<Subscriber>, StorageError> {
        self.exclusive(cancel, self.load_active_subscribers()).await
    }

    async fn get_subscriber(&self, chat_id: i64, cancel: &CancellationToken) -> Result<Option<Subscriber>, StorageError> {
        self.exclusive(cancel, self.load_subscriber(chat_id)).await
    }

    async fn add_or_activate_subscriber(
        &self,
        chat_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Subscriber, StorageError> {
        self.exclusive(cancel, self.activate_subscriber(chat_id)).await
    }

    async fn deactivate_subscriber(&self, chat_id: i64, cancel: &CancellationToken) -> Result<bool, StorageError> {
        self.exclusive(cancel, self.disable_subscriber(chat_id)).await
    }

    async fn count_watched_products(&self, cancel: &CancellationToken) -> Result<u64, StorageError> {
        self.exclusive(cancel, self.count_histories()).await
    }
}
