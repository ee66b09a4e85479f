use sea_orm_migration::prelude::*;

/// Creates the `ai_conversations` table. Messages are stored as a JSON array.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AiConversations {
    Table,
    Id,
    UserId,
    WorkspaceId,
    ConversationType,
    Title,
    Messages,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AiConversations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiConversations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AiConversations::UserId).uuid().not_null())
                    .col(ColumnDef::new(AiConversations::WorkspaceId).uuid().null())
                    .col(
                        ColumnDef::new(AiConversations::ConversationType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AiConversations::Title).string_len(255).null())
                    .col(
                        ColumnDef::new(AiConversations::Messages)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AiConversations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AiConversations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ai_conversations_user_id")
                            .from(AiConversations::Table, AiConversations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ai_conversations_workspace_id")
                            .from(AiConversations::Table, AiConversations::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AiConversations::Table).to_owned())
            .await
    }
}
