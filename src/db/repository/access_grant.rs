use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::models::{Access, AccessGrant};
use crate::error::{AppError, AppResult};

// ============================================================================
// Note Access Repository
// ============================================================================

pub struct AccessGrantRepository;

fn ensure_write_implies_read(can_read: bool, can_write: bool) -> AppResult<()> {
    if can_write && !can_read {
        return Err(AppError::Validation("Write access requires read access".to_string()));
    }
    Ok(())
}

impl AccessGrantRepository {
    /// Insert a new grant row. Existing grants for the same (note, grantee)
    /// pair are left untouched, so duplicates are possible.
    pub async fn grant<'e, E>(
        executor: E,
        note_id: &str,
        grantee_user_id: &str,
        can_read: bool,
        can_write: bool,
    ) -> AppResult<AccessGrant>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        ensure_write_implies_read(can_read, can_write)?;

        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, AccessGrant>(
            r#"
            INSERT INTO note_access (id, note_id, user_id, can_read, can_write, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, note_id, user_id, can_read, can_write, created_at
            "#,
        )
        .bind(id)
        .bind(note_id)
        .bind(grantee_user_id)
        .bind(can_read)
        .bind(can_write)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Overwrite the flags of every grant row on the note, whoever the grantee.
    pub async fn update_by_note(
        pool: &SqlitePool,
        note_id: &str,
        can_read: bool,
        can_write: bool,
    ) -> AppResult<u64> {
        ensure_write_implies_read(can_read, can_write)?;

        let result = sqlx::query(
            r#"
            UPDATE note_access
            SET can_read = ?, can_write = ?
            WHERE note_id = ?
            "#,
        )
        .bind(can_read)
        .bind(can_write)
        .bind(note_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Overwrite the flags of every grant row of one (note, grantee) pair.
    pub async fn update_for_grantee(
        pool: &SqlitePool,
        note_id: &str,
        grantee_user_id: &str,
        can_read: bool,
        can_write: bool,
    ) -> AppResult<u64> {
        ensure_write_implies_read(can_read, can_write)?;

        let result = sqlx::query(
            "UPDATE note_access SET can_read = ?, can_write = ? WHERE note_id = ? AND user_id = ?",
        )
        .bind(can_read)
        .bind(can_write)
        .bind(note_id)
        .bind(grantee_user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Grants with read access on the note, oldest first.
    pub async fn list_readable(pool: &SqlitePool, note_id: &str) -> AppResult<Vec<AccessGrant>> {
        sqlx::query_as::<_, AccessGrant>(
            r#"
            SELECT id, note_id, user_id, can_read, can_write, created_at
            FROM note_access
            WHERE note_id = ? AND can_read = 1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(note_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Every grant on the note regardless of flags, oldest first.
    pub async fn list_by_note<'e, E>(executor: E, note_id: &str) -> AppResult<Vec<AccessGrant>>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, AccessGrant>(
            r#"
            SELECT id, note_id, user_id, can_read, can_write, created_at
            FROM note_access
            WHERE note_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(note_id)
        .fetch_all(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Most permissive flags held by the grantee on the note, or no access
    /// when there is no grant. Ownership is not considered here.
    pub async fn grantee_access(
        pool: &SqlitePool,
        note_id: &str,
        grantee_user_id: &str,
    ) -> AppResult<Access> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(MAX(can_read), 0) AS can_read,
                COALESCE(MAX(can_write), 0) AS can_write
            FROM note_access
            WHERE note_id = ? AND user_id = ?
            "#,
        )
        .bind(note_id)
        .bind(grantee_user_id)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)?;

        let can_read: i64 = row.try_get("can_read").map_err(AppError::Database)?;
        let can_write: i64 = row.try_get("can_write").map_err(AppError::Database)?;

        Ok(Access {
            read: can_read != 0,
            write: can_write != 0,
        })
    }

    pub async fn delete_by_note<'e, E>(executor: E, note_id: &str) -> AppResult<u64>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM note_access WHERE note_id = ?")
            .bind(note_id)
            .execute(executor)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{seed_note, seed_user, test_pool};

    #[tokio::test]
    async fn grant_rejects_write_without_read() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "John").await;
        let grantee = seed_user(&pool, "Bob").await;
        let note = seed_note(&pool, &owner.id, "my note").await;

        let res = AccessGrantRepository::grant(&pool, &note.id, &grantee.id, false, true).await;
        assert!(matches!(res, Err(AppError::Validation(_))));

        let grants = AccessGrantRepository::list_by_note(&pool, &note.id).await.unwrap();
        assert!(grants.is_empty());
    }

    #[tokio::test]
    async fn grant_allows_duplicate_rows_for_same_pair() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "John").await;
        let grantee = seed_user(&pool, "Bob").await;
        let note = seed_note(&pool, &owner.id, "my note").await;

        AccessGrantRepository::grant(&pool, &note.id, &grantee.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &grantee.id, true, true)
            .await
            .unwrap();

        let grants = AccessGrantRepository::list_by_note(&pool, &note.id).await.unwrap();
        assert_eq!(grants.len(), 2);
    }

    #[tokio::test]
    async fn grantee_access_returns_most_permissive_row() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "John").await;
        let grantee = seed_user(&pool, "Bob").await;
        let stranger = seed_user(&pool, "Eve").await;
        let note = seed_note(&pool, &owner.id, "my note").await;

        AccessGrantRepository::grant(&pool, &note.id, &grantee.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &grantee.id, true, true)
            .await
            .unwrap();

        let access = AccessGrantRepository::grantee_access(&pool, &note.id, &grantee.id)
            .await
            .unwrap();
        assert_eq!(access, Access::FULL);

        let none = AccessGrantRepository::grantee_access(&pool, &note.id, &stranger.id)
            .await
            .unwrap();
        assert_eq!(none, Access::NONE);
    }

    #[tokio::test]
    async fn update_by_note_touches_every_grantee() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;
        let eve = seed_user(&pool, "Eve").await;
        let note = seed_note(&pool, &owner.id, "my note").await;
        let other = seed_note(&pool, &owner.id, "other note").await;

        AccessGrantRepository::grant(&pool, &note.id, &bob.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &eve.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &other.id, &bob.id, true, false)
            .await
            .unwrap();

        let updated = AccessGrantRepository::update_by_note(&pool, &note.id, true, true)
            .await
            .unwrap();
        assert_eq!(updated, 2);

        let grants = AccessGrantRepository::list_by_note(&pool, &note.id).await.unwrap();
        assert!(grants.iter().all(|g| g.can_read && g.can_write));

        let untouched = AccessGrantRepository::list_by_note(&pool, &other.id).await.unwrap();
        assert!(!untouched[0].can_write);
    }

    #[tokio::test]
    async fn update_for_grantee_leaves_other_grantees_alone() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;
        let eve = seed_user(&pool, "Eve").await;
        let note = seed_note(&pool, &owner.id, "my note").await;

        AccessGrantRepository::grant(&pool, &note.id, &bob.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &eve.id, true, false)
            .await
            .unwrap();

        AccessGrantRepository::update_for_grantee(&pool, &note.id, &bob.id, true, true)
            .await
            .unwrap();

        let bob_access = AccessGrantRepository::grantee_access(&pool, &note.id, &bob.id)
            .await
            .unwrap();
        let eve_access = AccessGrantRepository::grantee_access(&pool, &note.id, &eve.id)
            .await
            .unwrap();
        assert_eq!(bob_access, Access::FULL);
        assert_eq!(
            eve_access,
            Access {
                read: true,
                write: false
            }
        );
    }

    #[tokio::test]
    async fn list_readable_skips_revoked_rows() {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;
        let eve = seed_user(&pool, "Eve").await;
        let note = seed_note(&pool, &owner.id, "my note").await;

        AccessGrantRepository::grant(&pool, &note.id, &bob.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &eve.id, false, false)
            .await
            .unwrap();

        let readable = AccessGrantRepository::list_readable(&pool, &note.id).await.unwrap();
        assert_eq!(readable.len(), 1);
        assert_eq!(readable[0].user_id, bob.id);
    }
}
