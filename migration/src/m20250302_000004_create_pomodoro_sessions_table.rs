use sea_orm_migration::prelude::*;

/// Creates the `pomodoro_sessions` table.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum PomodoroSessions {
    Table,
    Id,
    UserId,
    WorkspaceId,
    TaskId,
    Duration,
    SessionType,
    Completed,
    StartedAt,
    CompletedAt,
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

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PomodoroSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PomodoroSessions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PomodoroSessions::UserId).uuid().not_null())
                    .col(ColumnDef::new(PomodoroSessions::WorkspaceId).uuid().null())
                    .col(ColumnDef::new(PomodoroSessions::TaskId).uuid().null())
                    .col(
                        ColumnDef::new(PomodoroSessions::Duration)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PomodoroSessions::SessionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PomodoroSessions::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PomodoroSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PomodoroSessions::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PomodoroSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pomodoro_sessions_user_id")
                            .from(PomodoroSessions::Table, PomodoroSessions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pomodoro_sessions_workspace_id")
                            .from(PomodoroSessions::Table, PomodoroSessions::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pomodoro_sessions_task_id")
                            .from(PomodoroSessions::Table, PomodoroSessions::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PomodoroSessions::Table).to_owned())
            .await
    }
}
