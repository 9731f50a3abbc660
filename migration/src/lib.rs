pub use sea_orm_migration::prelude::*;

mod m20251020_000001_create_product_price_history;
mod m20251020_000002_create_telegram_subscribers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_create_product_price_history::Migration),
            Box::new(m20251020_000002_create_telegram_subscribers::Migration),
        ]
    }
}
