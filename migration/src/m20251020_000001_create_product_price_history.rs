use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One row per watched product; last_price is kept as its exact decimal text
        manager
            .create_table(
                Table::create()
                    .table(ProductPriceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductPriceHistory::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductPriceHistory::ProductUrl)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ProductPriceHistory::LastPrice)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductPriceHistory::LastCheckTime)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_product_price_history_product_url")
                    .table(ProductPriceHistory::Table)
                    .col(ProductPriceHistory::ProductUrl)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductPriceHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProductPriceHistory {
    Table,
    Id,
    ProductUrl,
    LastPrice,
    LastCheckTime,
}
