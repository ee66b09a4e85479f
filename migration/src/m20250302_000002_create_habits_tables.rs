use sea_orm_migration::prelude::*;

/// Creates `habits` and `habit_entries`. Entries are unique per (habit, day) so a
/// check-in upserts rather than duplicating.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Habits {
    Table,
    Id,
    UserId,
    WorkspaceId,
    Name,
    Description,
    Color,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum HabitEntries {
    Table,
    Id,
    HabitId,
    Date,
    Completed,
    Notes,
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
                    .table(Habits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Habits::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Habits::UserId).uuid().not_null())
                    .col(ColumnDef::new(Habits::WorkspaceId).uuid().null())
                    .col(ColumnDef::new(Habits::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Habits::Description).text().null())
                    .col(ColumnDef::new(Habits::Color).string_len(20).null())
                    .col(
                        ColumnDef::new(Habits::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Habits::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habits_user_id")
                            .from(Habits::Table, Habits::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habits_workspace_id")
                            .from(Habits::Table, Habits::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HabitEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HabitEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HabitEntries::HabitId).uuid().not_null())
                    .col(ColumnDef::new(HabitEntries::Date).date().not_null())
                    .col(
                        ColumnDef::new(HabitEntries::Completed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(HabitEntries::Notes).text().null())
                    .col(
                        ColumnDef::new(HabitEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_habit_entries_habit_id")
                            .from(HabitEntries::Table, HabitEntries::HabitId)
                            .to(Habits::Table, Habits::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_habit_entries_habit_date")
                    .table(HabitEntries::Table)
                    .col(HabitEntries::HabitId)
                    .col(HabitEntries::Date)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HabitEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Habits::Table).to_owned())
            .await
    }
}
