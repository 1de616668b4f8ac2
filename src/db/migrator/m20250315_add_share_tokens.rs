use crate::entities::prelude::*;
use crate::entities::share_tokens;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(ShareTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Lookups by token string happen on every shared view
        manager
            .create_index(
                Index::create()
                    .name("idx_share_tokens_token")
                    .table(ShareTokens)
                    .col(share_tokens::Column::Token)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_share_tokens_video_id")
                    .table(ShareTokens)
                    .col(share_tokens::Column::VideoId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShareTokens).to_owned())
            .await
    }
}
