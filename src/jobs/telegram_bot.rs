use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Cancelled;
use crate::services::commands::handle_command;
use crate::services::price_storage::{PriceStorage, StorageError};
use crate::services::telegram::{TelegramClient, TelegramError, Update};

const LONG_POLL_TIMEOUT_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Answers `/start`, `/stop` and `/status` from Telegram chats.
pub struct TelegramBot<S: ?Sized> {
    telegram: TelegramClient,
    storage: Arc<S>,
    request_interval_minutes: u64,
}

impl<S: PriceStorage + ?Sized> TelegramBot<S> {
    pub fn new(telegram: TelegramClient, storage: Arc<S>, request_interval_minutes: u64) -> Self {
        Self {
            telegram,
            storage,
            request_interval_minutes,
        }
    }

    pub async fn run(&self, cancel: &CancellationToken) {
        let mut offset = match self.skip_pending_updates(cancel).await {
            Ok(offset) => offset,
            Err(TelegramError::Cancelled) => return,
            Err(e) => {
                error!(error = %e, "Failed to skip pending Telegram updates");
                0
            }
        };

        info!("Telegram bot polling started");

        'poll: loop {
            match self.telegram.get_updates(offset, LONG_POLL_TIMEOUT_SECS, cancel).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if self.handle_update(update, cancel).await.is_err() {
                            break 'poll;
                        }
                    }
                }
                Err(TelegramError::Cancelled) => break,
                Err(e) => {
                    error!(error = %e, "Telegram getUpdates failed");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        info!("Telegram bot polling stopped");
    }

    /// Offset just past the newest update queued before startup.
    async fn skip_pending_updates(&self, cancel: &CancellationToken) -> Result<i64, TelegramError> {
        let pending = self.telegram.get_updates(-1, 0, cancel).await?;
        Ok(pending.iter().map(|u| u.update_id + 1).max().unwrap_or(0))
    }

    /// Handle one update. Only cancellation is returned; other failures are logged.
    async fn handle_update(&self, update: Update, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let Some(message) = update.message else {
            return Ok(());
        };
        let Some(text) = message.text else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        debug!(chat_id = chat_id, text = %text, "Telegram message received");

        let reply = match handle_command(self.storage.as_ref(), self.request_interval_minutes, chat_id, &text, cancel).await {
            Ok(reply) => reply,
            Err(StorageError::Cancelled) => return Err(Cancelled),
            Err(e) => {
                error!(chat_id = chat_id, error = %e, "Failed to handle Telegram command");
                return Ok(());
            }
        };

        match self.telegram.send_message(chat_id, &reply, cancel).await {
            Ok(()) => Ok(()),
            Err(TelegramError::Cancelled) => Err(Cancelled),
            Err(e) => {
                error!(chat_id = chat_id, error = %e, "Failed to send Telegram reply");
                Ok(())
            }
        }
    }
}

pub fn start_telegram_bot_job<S>(bot: TelegramBot<S>, cancel: CancellationToken) -> JoinHandle<()>
where
    S: PriceStorage + ?Sized + 'static,
{
    tokio::spawn(async move {
        bot.run(&cancel).await;
    })
}
