use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub mod auth;
pub mod health;
pub mod notes;
pub mod sharing;
pub mod users;

/// Every route except `/api/auth`, which the server nests separately so it can
/// carry its own rate limiter.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/users", users::router())
        .nest("/api/notes", notes::router().merge(sharing::note_router()))
        .nest("/api/shared-settings", sharing::router())
}
