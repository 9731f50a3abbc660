//! Chat commands understood by the bot.

use tokio_util::sync::CancellationToken;

use crate::services::price_storage::{PriceStorage, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Stop,
    Status,
    Unknown,
}

impl BotCommand {
    /// Case-insensitive; accepts the `/cmd@BotName` form Telegram uses in groups.
    pub fn parse(text: &str) -> Self {
        let first_word = text.split_whitespace().next().unwrap_or_default().to_lowercase();
        let command = first_word.split('@').next().unwrap_or_default();

        match command {
            "/start" => BotCommand::Start,
            "/stop" => BotCommand::Stop,
            "/status" => BotCommand::Status,
            _ => BotCommand::Unknown,
        }
    }
}

pub const SUBSCRIBED_REPLY: &str = "You are now subscribed to price updates.";
pub const UNSUBSCRIBED_REPLY: &str = "Your subscription has been stopped.";
pub const NOT_SUBSCRIBED_REPLY: &str = "You are not subscribed.";
pub const HELP_REPLY: &str = "Supported commands: /start, /stop, /status";

/// Apply `text` from `chat_id` and return the reply to send back.
pub async fn handle_command<S: PriceStorage + ?Sized>(
    storage: &S,
    request_interval_minutes: u64,
    chat_id: i64,
    text: &str,
    cancel: &CancellationToken,
) -> Result<String, StorageError> {
    let reply = match BotCommand::parse(text) {
        BotCommand::Start => {
            storage.add_or_activate_subscriber(chat_id, cancel).await?;
            tracing::info!(chat_id = chat_id, "Chat subscribed");
            SUBSCRIBED_REPLY.to_string()
        }
        BotCommand::Stop => {
            let deactivated = storage.deactivate_subscriber(chat_id, cancel).await?;
            tracing::info!(chat_id = chat_id, deactivated = deactivated, "Chat unsubscribe requested");
            let reply = if deactivated { UNSUBSCRIBED_REPLY } else { NOT_SUBSCRIBED_REPLY };
            reply.to_string()
        }
        BotCommand::Status => {
            let subscriber = storage.get_subscriber(chat_id, cancel).await?;
            let watched = storage.count_watched_products(cancel).await?;
            let state = if subscriber.is_some_and(|s| s.is_active) {
                "Active subscription"
            } else {
                "Not subscribed"
            };

            format!(
                "Status: {}\nWatched products: {}\nCheck interval: {} minute(s)",
                state, watched, request_interval_minutes
            )
        }
        BotCommand::Unknown => HELP_REPLY.to_string(),
    };

    Ok(reply)
}
