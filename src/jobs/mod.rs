pub mod price_watch;
pub mod telegram_bot;
