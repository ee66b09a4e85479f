use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

pub mod ai;
pub mod auth;
pub mod billing;
pub mod countdowns;
pub mod files;
pub mod habits;
pub mod health;
pub mod integrations;
pub mod metrics;
pub mod pomodoro;
pub mod subscriptions;
pub mod sync;
pub mod tabstash;
pub mod tasks;
pub mod users;
pub mod workspaces;

/// Build the complete application router.
///
/// `GET /health` is unversioned; everything else lives under `/api/v1`.
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/workspaces", workspaces::router())
        .nest("/tasks", tasks::router())
        .nest("/habits", habits::router())
        .nest("/metrics", metrics::router())
        .nest("/pomodoro", pomodoro::router())
        .nest("/countdowns", countdowns::router())
        .nest("/integrations", integrations::router())
        .nest("/ai", ai::router())
        .nest("/files", files::router())
        .nest("/sync", sync::router())
        .nest("/tabstash", tabstash::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/billing", billing::router());

    Router::new()
        .merge(health::router())
        .nest("/api/v1", api_v1)
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found.".to_string())
}
