use sea_orm_migration::prelude::*;

/// Creates the `countdown_timers` table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum CountdownTimers {
    Table,
    Id,
    UserId,
    WorkspaceId,
    Name,
    TargetDate,
    NotifyBefore,
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
                    .table(CountdownTimers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CountdownTimers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CountdownTimers::UserId).uuid().not_null())
                    .col(ColumnDef::new(CountdownTimers::WorkspaceId).uuid().null())
                    .col(
                        ColumnDef::new(CountdownTimers::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CountdownTimers::TargetDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CountdownTimers::NotifyBefore)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CountdownTimers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CountdownTimers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_countdown_timers_user_id")
                            .from(CountdownTimers::Table, CountdownTimers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_countdown_timers_workspace_id")
                            .from(CountdownTimers::Table, CountdownTimers::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CountdownTimers::Table).to_owned())
            .await
    }
}
