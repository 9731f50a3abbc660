// src/lib.rs

use std::sync::Arc;

use config::WatchSettings;
use services::price_storage::PriceStorage;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn PriceStorage>,
    pub watch: Arc<WatchSettings>,
    pub cancel: CancellationToken,
}

pub mod entities {
    pub mod prelude;
    pub mod product_price_history;
    pub mod telegram_subscribers;
}

pub mod services {
    pub mod commands;
    pub mod notification;
    pub mod price_storage;
    pub mod telegram;
}

pub mod config;
pub mod error;
pub mod models;
pub mod handlers;
pub mod jobs;
pub mod scrapers;
