//! Minimal Telegram Bot API client: `sendMessage` and long-polling `getUpdates`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug)]
pub enum TelegramError {
    Cancelled,
    Http(String),
    Api { status: u16, description: String },
}

impl std::fmt::Display for TelegramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelegramError::Cancelled => write!(f, "Telegram request cancelled"),
            TelegramError::Http(msg) => write!(f, "Telegram HTTP error: {}", msg),
            TelegramError::Api { status, description } => {
                write!(f, "Telegram API error {}: {}", status, description)
            }
        }
    }
}

impl std::error::Error for TelegramError {}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Result<Self, TelegramError> {
        // Longer than the getUpdates long-poll timeout
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self::with_base_url(client, &format!("{}/bot{}", TELEGRAM_API_URL, bot_token)))
    }

    /// Client against an arbitrary bot endpoint, e.g. a local stand-in.
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn send_message(&self, chat_id: i64, text: &str, cancel: &CancellationToken) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessageRequest { chat_id, text }, cancel)
            .await?;
        Ok(())
    }

    /// Updates with id >= `offset`, waiting up to `timeout_secs` for new ones.
    ///
    /// A negative offset returns the most recent updates, which is how pending
    /// updates are skipped at startup.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &request, cancel).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, cancel: &CancellationToken) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let request = self.client.post(&url).json(body);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TelegramError::Cancelled),
            result = async {
                let response = request.send().await?;
                let status = response.status();
                let payload: ApiResponse<T> = response.json().await?;

                match payload {
                    ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
                    ApiResponse { description, error_code, .. } => Err(TelegramError::Api {
                        status: error_code.unwrap_or(status.as_u16()),
                        description: description.unwrap_or_else(|| "no description".to_string()),
                    }),
                }
            } => result,
        }
    }
}
