use sea_orm_migration::prelude::*;

/// Creates the `tab_stashes` table. A stash is a named JSON list of saved tabs.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TabStashes {
    Table,
    Id,
    UserId,
    WorkspaceId,
    Name,
    Tabs,
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
                    .table(TabStashes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TabStashes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TabStashes::UserId).uuid().not_null())
                    .col(ColumnDef::new(TabStashes::WorkspaceId).uuid().null())
                    .col(ColumnDef::new(TabStashes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(TabStashes::Tabs).json_binary().not_null())
                    .col(
                        ColumnDef::new(TabStashes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TabStashes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tab_stashes_user_id")
                            .from(TabStashes::Table, TabStashes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tab_stashes_workspace_id")
                            .from(TabStashes::Table, TabStashes::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TabStashes::Table).to_owned())
            .await
    }
}
