use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TelegramSubscribers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TelegramSubscribers::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TelegramSubscribers::ChatId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TelegramSubscribers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TelegramSubscribers::CreatedAt)
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
                    .name("idx_telegram_subscribers_is_active")
                    .table(TelegramSubscribers::Table)
                    .col(TelegramSubscribers::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TelegramSubscribers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TelegramSubscribers {
    Table,
    Id,
    ChatId,
    IsActive,
    CreatedAt,
}
