pub use super::product_price_history::Entity as ProductPriceHistory;
pub use super::telegram_subscribers::Entity as TelegramSubscribers;
