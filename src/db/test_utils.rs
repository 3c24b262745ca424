//! Fixtures for database-backed tests.

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::models::{CreateNote, CreateUser, Note, TemplateEntry, User};
use crate::db::repository::{NoteRepository, UserRepository};
use crate::AppState;

/// Fresh, migrated in-memory database.
///
/// Every pool gets its own randomly named database so tests stay isolated
/// (see https://github.com/launchbadge/sqlx/issues/2510). A single connection
/// keeps the in-memory database alive for the whole test.
pub async fn test_pool() -> SqlitePool {
    let url = format!(
        "sqlite://notesmem{}?mode=memory&cache=private",
        uuid::Uuid::new_v4().simple()
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(&url)
        .await
        .expect("open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.jwt.secret = "test-secret".to_string();
    config.password.bcrypt_cost = 4;
    config
}

pub async fn test_state() -> Arc<AppState> {
    Arc::new(AppState {
        db: test_pool().await,
        config: test_config(),
    })
}

pub async fn seed_user(pool: &SqlitePool, given_name: &str) -> User {
    UserRepository::create(
        pool,
        CreateUser {
            given_name: given_name.to_string(),
            family_name: "Tester".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .expect("seed user")
}

pub async fn seed_note(pool: &SqlitePool, owner_id: &str, title: &str) -> Note {
    NoteRepository::create(
        pool,
        CreateNote {
            user_id: owner_id.to_string(),
            title: title.to_string(),
            contents: format!("contents of {}", title),
        },
    )
    .await
    .expect("seed note")
}

/// Template entries in a stable order for set comparisons.
pub fn sorted_entries(mut entries: Vec<TemplateEntry>) -> Vec<TemplateEntry> {
    entries.sort_by(|a, b| a.shared_user_id.cmp(&b.shared_user_id));
    entries
}
