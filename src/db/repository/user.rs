use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

impl UserRepository {
    pub async fn create(pool: &SqlitePool, user: CreateUser) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, given_name, family_name, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, given_name, family_name, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(user.given_name)
        .bind(user.family_name)
        .bind(user.password_hash)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, given_name, family_name, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, given_name, family_name, password_hash, created_at
            FROM users
            ORDER BY family_name ASC, given_name ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }
}
