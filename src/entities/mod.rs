//! `SeaORM` entity definitions for all Momentum tables.

pub mod ai_conversation;
pub mod countdown_timer;
pub mod file_upload;
pub mod habit;
pub mod habit_entry;
pub mod integration;
pub mod metric;
pub mod pomodoro_session;
pub mod refresh_token;
pub mod subscription;
pub mod sync_data;
pub mod tab_stash;
pub mod task;
pub mod user;
pub mod workspace;
