use chrono::Utc;
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::models::{CreateNote, Note, UpdateNote, VisibilityScope};
use crate::db::repository::AccessGrantRepository;
use crate::error::{AppError, AppResult};

// ============================================================================
// Note Repository
// ============================================================================

pub struct NoteRepository;

impl NoteRepository {
    pub async fn create<'e, E>(executor: E, note: CreateNote) -> AppResult<Note>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, title, contents, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, title, contents, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(note.user_id)
        .bind(note.title)
        .bind(note.contents)
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<Note>> {
        sqlx::query_as::<_, Note>(
            r#"
            SELECT id, user_id, title, contents, created_at, updated_at
            FROM notes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Owner of the note, or `None` when the note does not exist.
    pub async fn get_owner(pool: &SqlitePool, id: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT user_id FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn exists(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        Ok(Self::get_owner(pool, id).await?.is_some())
    }

    /// Update title and/or contents; fields left as `None` keep their value.
    pub async fn update(pool: &SqlitePool, id: &str, update: UpdateNote) -> AppResult<Note> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET
                title = COALESCE(?, title),
                contents = COALESCE(?, contents),
                updated_at = ?
            WHERE id = ?
            RETURNING id, user_id, title, contents, created_at, updated_at
            "#,
        )
        .bind(update.title)
        .bind(update.contents)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))
    }

    /// Delete a note together with its grants. Returns `false` when the note
    /// did not exist.
    pub async fn delete(pool: &SqlitePool, id: &str) -> AppResult<bool> {
        let mut tx = pool.begin().await.map_err(AppError::Database)?;

        let grants = AccessGrantRepository::delete_by_note(&mut *tx, id).await?;
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::debug!("Deleted note {} and {} grants", id, grants);
        Ok(result.rows_affected() > 0)
    }

    /// Notes owned by the user plus notes carrying a read grant, newest first.
    pub async fn visible_to(
        pool: &SqlitePool,
        user_id: &str,
        scope: VisibilityScope,
    ) -> AppResult<Vec<Note>> {
        sqlx::query_as::<_, Note>(
            r#"
            SELECT n.id, n.user_id, n.title, n.contents, n.created_at, n.updated_at
            FROM notes n
            WHERE n.user_id = ?
               OR EXISTS (
                    SELECT 1 FROM note_access a
                    WHERE a.note_id = n.id
                      AND a.can_read = 1
                      AND (? OR a.user_id = ?)
               )
            ORDER BY n.updated_at DESC, n.id ASC
            "#,
        )
        .bind(user_id)
        .bind(scope == VisibilityScope::AnyGrant)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Visible notes whose contents contain `query`.
    pub async fn search_visible(
        pool: &SqlitePool,
        user_id: &str,
        scope: VisibilityScope,
        query: &str,
    ) -> AppResult<Vec<Note>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", query);

        sqlx::query_as::<_, Note>(
            r#"
            SELECT n.id, n.user_id, n.title, n.contents, n.created_at, n.updated_at
            FROM notes n
            WHERE (
                n.user_id = ?
                OR EXISTS (
                    SELECT 1 FROM note_access a
                    WHERE a.note_id = n.id
                      AND a.can_read = 1
                      AND (? OR a.user_id = ?)
                )
            )
            AND n.contents LIKE ?
            ORDER BY n.updated_at DESC, n.id ASC
            "#,
        )
        .bind(user_id)
        .bind(scope == VisibilityScope::AnyGrant)
        .bind(user_id)
        .bind(pattern)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }
}
