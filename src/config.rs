//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const ENV_PRODUCT_URLS: &str = "PRODUCT_URLS";
pub const ENV_REQUEST_INTERVAL_MINUTES: &str = "REQUEST_INTERVAL_MINUTES";
pub const ENV_NOTIFY_ON_EVERY_PULL: &str = "NOTIFY_ON_EVERY_PULL";
pub const ENV_MIN_CHANGE_PERCENTAGE: &str = "MIN_CHANGE_PERCENTAGE_TO_NOTIFY";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_ADMIN_CHAT_ID: &str = "TELEGRAM_ADMIN_CHAT_ID";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_HTTP_BIND_ADDRESS: &str = "HTTP_BIND_ADDRESS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

const DEFAULT_REQUEST_INTERVAL_MINUTES: u64 = 5;
const DEFAULT_MIN_CHANGE_PERCENTAGE: f64 = 0.1;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/pricewatcher.db?mode=rwc";
const DEFAULT_HTTP_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
        }
    }
}

impl std::error::Error for ConfigError {}

/// What to watch and when to notify.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSettings {
    pub product_urls: Vec<String>,
    pub request_interval_minutes: u64,
    pub notify_on_every_pull: bool,
    pub min_change_percentage_to_notify: f64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            product_urls: Vec::new(),
            request_interval_minutes: DEFAULT_REQUEST_INTERVAL_MINUTES,
            notify_on_every_pull: false,
            min_change_percentage_to_notify: DEFAULT_MIN_CHANGE_PERCENTAGE,
        }
    }
}

impl WatchSettings {
    /// Interval between cycles, never shorter than one minute.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.effective_interval_minutes().saturating_mul(60))
    }

    pub fn effective_interval_minutes(&self) -> u64 {
        self.request_interval_minutes.max(1)
    }

    /// Configured URLs with blanks dropped and surrounding whitespace trimmed.
    pub fn watched_urls(&self) -> Vec<&str> {
        self.product_urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub admin_chat_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub http_bind_address: String,
    pub http_timeout: Duration,
    pub watch: WatchSettings,
    pub telegram: TelegramSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `lookup` returns `None` for unset names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get(ENV_TELEGRAM_BOT_TOKEN).ok_or(ConfigError::Missing(ENV_TELEGRAM_BOT_TOKEN))?;

        let admin_chat_id = match get(ENV_TELEGRAM_ADMIN_CHAT_ID) {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(0) => None,
                Ok(id) => Some(id),
                Err(_) => {
                    warn!("{} is not a numeric chat id: {}", ENV_TELEGRAM_ADMIN_CHAT_ID, raw);
                    None
                }
            },
        };

        let watch = WatchSettings {
            product_urls: get(ENV_PRODUCT_URLS).map(|raw| split_urls(&raw)).unwrap_or_default(),
            request_interval_minutes: parse_or(
                ENV_REQUEST_INTERVAL_MINUTES,
                get(ENV_REQUEST_INTERVAL_MINUTES),
                DEFAULT_REQUEST_INTERVAL_MINUTES,
            ),
            notify_on_every_pull: get(ENV_NOTIFY_ON_EVERY_PULL)
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            min_change_percentage_to_notify: parse_or(
                ENV_MIN_CHANGE_PERCENTAGE,
                get(ENV_MIN_CHANGE_PERCENTAGE),
                DEFAULT_MIN_CHANGE_PERCENTAGE,
            ),
        };

        Ok(Self {
            database_url: get(ENV_DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            http_bind_address: get(ENV_HTTP_BIND_ADDRESS).unwrap_or_else(|| DEFAULT_HTTP_BIND_ADDRESS.to_string()),
            http_timeout: Duration::from_secs(parse_or(
                ENV_HTTP_TIMEOUT_SECS,
                get(ENV_HTTP_TIMEOUT_SECS),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            watch,
            telegram: TelegramSettings {
                bot_token,
                admin_chat_id,
            },
        })
    }
}

fn split_urls(raw: &str) -> Vec<String> {
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}: {:?}, using default", name, raw);
            default
        }),
    }
}
