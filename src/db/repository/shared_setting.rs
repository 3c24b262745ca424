use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

use crate::db::models::{SharedSetting, TemplateEntry};
use crate::error::{AppError, AppResult};

// ============================================================================
// Shared Setting Repository
// ============================================================================

pub struct SharedSettingRepository;

impl SharedSettingRepository {
    pub async fn create<'e, E>(
        executor: E,
        owner_id: &str,
        shared_user_id: &str,
        can_read: bool,
        can_write: bool,
        name: &str,
    ) -> AppResult<SharedSetting>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().naive_utc();

        sqlx::query_as::<_, SharedSetting>(
            r#"
            INSERT INTO shared_settings (
                id, owner_id, shared_user_id, can_read, can_write, name, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, owner_id, shared_user_id, can_read, can_write, name, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(shared_user_id)
        .bind(can_read)
        .bind(can_write)
        .bind(name)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(AppError::Database)
    }

    /// Snapshot every grant currently on the note into template rows named
    /// `name`, owned by the note's owner. Any earlier template of that owner
    /// with the same name is replaced. Runs in a single transaction and
    /// returns the number of rows written (zero when the note has no grants).
    pub async fn save_from_note_grants(
        pool: &SqlitePool,
        note_id: &str,
        name: &str,
    ) -> AppResult<u64> {
        let mut tx = pool.begin().await.map_err(AppError::Database)?;

        let owner_id = sqlx::query_scalar::<_, String>("SELECT user_id FROM notes WHERE id = ?")
            .bind(note_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        let Some(owner_id) = owner_id else {
            return Ok(0);
        };

        let replaced = sqlx::query("DELETE FROM shared_settings WHERE owner_id = ? AND name = ?")
            .bind(&owner_id)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .rows_affected();
        if replaced > 0 {
            tracing::debug!("Replacing {} rows of template '{}'", replaced, name);
        }

        let grants = sqlx::query_as::<_, (String, bool, bool)>(
            r#"
            SELECT user_id, can_read, can_write
            FROM note_access
            WHERE note_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(note_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        let mut created = 0u64;
        for (grantee_id, can_read, can_write) in grants {
            Self::create(&mut *tx, &owner_id, &grantee_id, can_read, can_write, name).await?;
            created += 1;
        }

        tx.commit().await.map_err(AppError::Database)?;

        Ok(created)
    }

    /// Distinct template names owned by the user, sorted.
    pub async fn list_names(pool: &SqlitePool, owner_id: &str) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT name FROM shared_settings WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Grantee rows of one named template.
    pub async fn resolve_template<'e, E>(
        executor: E,
        owner_id: &str,
        name: &str,
    ) -> AppResult<Vec<TemplateEntry>>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TemplateEntry>(
            r#"
            SELECT shared_user_id, can_read, can_write
            FROM shared_settings
            WHERE owner_id = ? AND name = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .fetch_all(executor)
        .await
        .map_err(AppError::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::AccessGrantRepository;
    use crate::db::test_utils::{seed_note, seed_user, sorted_entries, test_pool};

    #[tokio::test]
    async fn save_snapshots_current_grants_under_note_owner() {
        let pool = test_pool().await;
        let john = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;
        let eve = seed_user(&pool, "Eve").await;
        let note = seed_note(&pool, &john.id, "my note").await;

        AccessGrantRepository::grant(&pool, &note.id, &bob.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &eve.id, true, true)
            .await
            .unwrap();

        let created = SharedSettingRepository::save_from_note_grants(&pool, &note.id, "team")
            .await
            .unwrap();
        assert_eq!(created, 2);

        // Later edits to the note do not reach the template.
        AccessGrantRepository::update_by_note(&pool, &note.id, false, false)
            .await
            .unwrap();

        let entries = SharedSettingRepository::resolve_template(&pool, &john.id, "team")
            .await
            .unwrap();
        assert_eq!(
            sorted_entries(entries),
            sorted_entries(vec![
                TemplateEntry {
                    shared_user_id: bob.id.clone(),
                    can_read: true,
                    can_write: false,
                },
                TemplateEntry {
                    shared_user_id: eve.id.clone(),
                    can_read: true,
                    can_write: true,
                },
            ])
        );
    }

    #[tokio::test]
    async fn save_without_grants_creates_nothing() {
        let pool = test_pool().await;
        let john = seed_user(&pool, "John").await;
        let note = seed_note(&pool, &john.id, "lonely").await;

        let created = SharedSettingRepository::save_from_note_grants(&pool, &note.id, "empty")
            .await
            .unwrap();
        assert_eq!(created, 0);
        assert!(SharedSettingRepository::list_names(&pool, &john.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn list_names_is_distinct_and_owner_scoped() {
        let pool = test_pool().await;
        let john = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;

        SharedSettingRepository::create(&pool, &john.id, &bob.id, true, false, "team")
            .await
            .unwrap();
        SharedSettingRepository::create(&pool, &john.id, "someone-else", true, true, "team")
            .await
            .unwrap();
        SharedSettingRepository::create(&pool, &john.id, &bob.id, true, true, "editors")
            .await
            .unwrap();
        SharedSettingRepository::create(&pool, &bob.id, &john.id, true, false, "bobs")
            .await
            .unwrap();

        let names = SharedSettingRepository::list_names(&pool, &john.id)
            .await
            .unwrap();
        assert_eq!(names, vec!["editors".to_string(), "team".to_string()]);
    }

    #[tokio::test]
    async fn saving_under_existing_name_replaces_template() {
        let pool = test_pool().await;
        let john = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;
        let eve = seed_user(&pool, "Eve").await;
        let first = seed_note(&pool, &john.id, "first").await;
        let second = seed_note(&pool, &john.id, "second").await;

        AccessGrantRepository::grant(&pool, &first.id, &bob.id, true, false)
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &second.id, &eve.id, true, true)
            .await
            .unwrap();

        SharedSettingRepository::save_from_note_grants(&pool, &first.id, "team")
            .await
            .unwrap();
        let created = SharedSettingRepository::save_from_note_grants(&pool, &second.id, "team")
            .await
            .unwrap();
        assert_eq!(created, 1);

        let entries = SharedSettingRepository::resolve_template(&pool, &john.id, "team")
            .await
            .unwrap();
        assert_eq!(
            entries,
            vec![TemplateEntry {
                shared_user_id: eve.id.clone(),
                can_read: true,
                can_write: true,
            }]
        );
    }

    #[tokio::test]
    async fn replacing_one_template_keeps_others() {
        let pool = test_pool().await;
        let john = seed_user(&pool, "John").await;
        let bob = seed_user(&pool, "Bob").await;
        let note = seed_note(&pool, &john.id, "my note").await;

        SharedSettingRepository::create(&pool, &john.id, &bob.id, true, false, "editors")
            .await
            .unwrap();
        SharedSettingRepository::create(&pool, &bob.id, &john.id, true, false, "team")
            .await
            .unwrap();
        AccessGrantRepository::grant(&pool, &note.id, &bob.id, true, true)
            .await
            .unwrap();

        SharedSettingRepository::save_from_note_grants(&pool, &note.id, "team")
            .await
            .unwrap();

        let editors = SharedSettingRepository::resolve_template(&pool, &john.id, "editors")
            .await
            .unwrap();
        assert_eq!(editors.len(), 1);
        let bobs = SharedSettingRepository::resolve_template(&pool, &bob.id, "team")
            .await
            .unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].shared_user_id, john.id);
    }
}
