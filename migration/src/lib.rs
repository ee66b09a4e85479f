pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_table;
mod m20250301_000002_create_refresh_tokens_table;
mod m20250301_000003_create_subscriptions_table;
mod m20250301_000004_create_workspaces_table;
mod m20250302_000001_create_tasks_table;
mod m20250302_000002_create_habits_tables;
mod m20250302_000003_create_metrics_table;
mod m20250302_000004_create_pomodoro_sessions_table;
mod m20250302_000005_create_countdown_timers_table;
mod m20250303_000001_create_integrations_table;
mod m20250303_000002_create_ai_conversations_table;
mod m20250303_000003_create_file_uploads_table;
mod m20250303_000004_create_tab_stashes_table;
mod m20250303_000005_create_sync_data_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_table::Migration),
            Box::new(m20250301_000002_create_refresh_tokens_table::Migration),
            Box::new(m20250301_000003_create_subscriptions_table::Migration),
            Box::new(m20250301_000004_create_workspaces_table::Migration),
            Box::new(m20250302_000001_create_tasks_table::Migration),
            Box::new(m20250302_000002_create_habits_tables::Migration),
            Box::new(m20250302_000003_create_metrics_table::Migration),
            Box::new(m20250302_000004_create_pomodoro_sessions_table::Migration),
            Box::new(m20250302_000005_create_countdown_timers_table::Migration),
            Box::new(m20250303_000001_create_integrations_table::Migration),
            Box::new(m20250303_000002_create_ai_conversations_table::Migration),
            Box::new(m20250303_000003_create_file_uploads_table::Migration),
            Box::new(m20250303_000004_create_tab_stashes_table::Migration),
            Box::new(m20250303_000005_create_sync_data_table::Migration),
        ]
    }
}
