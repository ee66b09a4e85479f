use sea_orm_migration::prelude::*;

/// Creates the `sync_data` table. One row per (user, data type, workspace) holding a
/// version counter and an opaque JSON payload.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum SyncData {
    Table,
    Id,
    UserId,
    WorkspaceId,
    DataType,
    Data,
    Version,
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
                    .table(SyncData::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncData::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SyncData::UserId).uuid().not_null())
                    .col(ColumnDef::new(SyncData::WorkspaceId).uuid().null())
                    .col(ColumnDef::new(SyncData::DataType).string_len(50).not_null())
                    .col(ColumnDef::new(SyncData::Data).json_binary().not_null())
                    .col(ColumnDef::new(SyncData::Version).big_integer().not_null())
                    .col(
                        ColumnDef::new(SyncData::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncData::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sync_data_user_id")
                            .from(SyncData::Table, SyncData::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sync_data_workspace_id")
                            .from(SyncData::Table, SyncData::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_data_user_type_workspace")
                    .table(SyncData::Table)
                    .col(SyncData::UserId)
                    .col(SyncData::DataType)
                    .col(SyncData::WorkspaceId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncData::Table).to_owned())
            .await
    }
}
