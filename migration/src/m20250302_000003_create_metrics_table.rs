use sea_orm_migration::prelude::*;

/// Creates the `metrics` table for daily productivity data points.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Metrics {
    Table,
    Id,
    UserId,
    WorkspaceId,
    MetricType,
    Value,
    Date,
    Metadata,
    CreatedAt,
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
                    .table(Metrics::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Metrics::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Metrics::UserId).uuid().not_null())
                    .col(ColumnDef::new(Metrics::WorkspaceId).uuid().null())
                    .col(
                        ColumnDef::new(Metrics::MetricType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Metrics::Value).double().null())
                    .col(ColumnDef::new(Metrics::Date).date().not_null())
                    .col(ColumnDef::new(Metrics::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(Metrics::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metrics_user_id")
                            .from(Metrics::Table, Metrics::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metrics_workspace_id")
                            .from(Metrics::Table, Metrics::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Metrics::Table).to_owned())
            .await
    }
}
