use std::sync::Arc;

use sqlx::SqliteConnection;

use crate::db::{
    Access, AccessGrant, AccessGrantRepository, Note, NoteRepository, SharedSettingRepository,
    UserRepository,
};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Longest template name accepted, in characters.
pub const MAX_TEMPLATE_NAME_LEN: usize = 30;

/// Owner-only management of note grants and sharing templates.
///
/// Every mutating operation resolves the acting user first, then loads the
/// note owner, and only then touches the stores. A non-owner never gets past
/// [`SharingService::authorize_owner`], so nothing is written for them.
pub struct SharingService;

impl SharingService {
    /// Check that `acting_user_id` owns the note. Returns the owner id.
    pub async fn authorize_owner(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
        note_id: &str,
    ) -> AppResult<String> {
        let acting = acting_user_id.ok_or(AppError::Unauthorized)?;

        let owner_id = NoteRepository::get_owner(&state.db, note_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

        if owner_id != acting {
            tracing::warn!(
                "Access denied: user {} attempted to manage sharing of note {} owned by {}",
                acting,
                note_id,
                owner_id
            );
            return Err(AppError::Forbidden);
        }

        Ok(owner_id)
    }

    /// Grant a user access to a note. Requesting write always grants read too.
    pub async fn grant_access(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
        note_id: &str,
        grantee_user_id: &str,
        read: bool,
        write: bool,
    ) -> AppResult<AccessGrant> {
        Self::authorize_owner(state, acting_user_id, note_id).await?;

        if UserRepository::find_by_id(&state.db, grantee_user_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let access = Access::normalized(read, write);
        let grant = AccessGrantRepository::grant(
            &state.db,
            note_id,
            grantee_user_id,
            access.read,
            access.write,
        )
        .await?;

        tracing::info!(
            "Granted user {} access to note {} (read={}, write={})",
            grantee_user_id,
            note_id,
            grant.can_read,
            grant.can_write
        );
        Ok(grant)
    }

    /// Change existing grants on a note. Without a grantee every grant row of
    /// the note is overwritten; with one, only that grantee's rows are.
    pub async fn update_access(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
        note_id: &str,
        grantee_user_id: Option<&str>,
        read: bool,
        write: bool,
    ) -> AppResult<u64> {
        Self::authorize_owner(state, acting_user_id, note_id).await?;

        let access = Access::normalized(read, write);
        let (pool, read, write) = (&state.db, access.read, access.write);
        let updated = if let Some(grantee) = grantee_user_id {
            AccessGrantRepository::update_for_grantee(pool, note_id, grantee, read, write).await?
        } else {
            AccessGrantRepository::update_by_note(pool, note_id, read, write).await?
        };

        tracing::info!(
            "Updated {} grants on note {} (read={}, write={})",
            updated,
            note_id,
            access.read,
            access.write
        );
        Ok(updated)
    }

    /// Grants that currently allow reading the note.
    pub async fn list_access(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
        note_id: &str,
    ) -> AppResult<Vec<AccessGrant>> {
        Self::authorize_owner(state, acting_user_id, note_id).await?;
        AccessGrantRepository::list_readable(&state.db, note_id).await
    }

    /// Save the note's current grants as a named template of its owner.
    pub async fn save_template(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
        note_id: &str,
        name: &str,
    ) -> AppResult<u64> {
        Self::authorize_owner(state, acting_user_id, note_id).await?;
        let name = validate_template_name(name)?;

        let created =
            SharedSettingRepository::save_from_note_grants(&state.db, note_id, name).await?;
        if created == 0 {
            tracing::warn!(
                "Template '{}' saved from note {} without grants and is now empty",
                name,
                note_id
            );
        } else {
            tracing::info!(
                "Saved template '{}' with {} grants from note {}",
                name,
                created,
                note_id
            );
        }
        Ok(created)
    }

    pub async fn list_template_names(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let acting = acting_user_id.ok_or(AppError::Unauthorized)?;
        SharedSettingRepository::list_names(&state.db, acting).await
    }

    /// Create one grant on `note_id` per row of the owner's template `name`.
    ///
    /// Runs on the caller's connection so note creation can insert the note
    /// and its grants in one transaction.
    pub async fn apply_template(
        conn: &mut SqliteConnection,
        note_id: &str,
        owner_id: &str,
        name: &str,
    ) -> AppResult<usize> {
        let entries = SharedSettingRepository::resolve_template(&mut *conn, owner_id, name).await?;
        if entries.is_empty() {
            return Err(AppError::NotFound(format!("Template '{}' not found", name)));
        }

        for entry in &entries {
            AccessGrantRepository::grant(
                &mut *conn,
                note_id,
                &entry.shared_user_id,
                entry.can_read,
                entry.can_write,
            )
            .await?;
        }

        tracing::info!(
            "Applied template '{}' to note {} ({} grants)",
            name,
            note_id,
            entries.len()
        );
        Ok(entries.len())
    }

    /// Apply one of the owner's templates to an existing note, all or nothing.
    pub async fn apply_template_to_note(
        state: &Arc<AppState>,
        acting_user_id: Option<&str>,
        note_id: &str,
        name: &str,
    ) -> AppResult<usize> {
        let owner_id = Self::authorize_owner(state, acting_user_id, note_id).await?;

        let mut tx = state.db.begin().await.map_err(AppError::Database)?;
        let applied = Self::apply_template(&mut tx, note_id, &owner_id, name).await?;
        tx.commit().await.map_err(AppError::Database)?;

        Ok(applied)
    }

    /// What `user_id` may do with the note. The owner can always read and write.
    pub async fn effective_access(
        state: &Arc<AppState>,
        note: &Note,
        user_id: &str,
    ) -> AppResult<Access> {
        if note.user_id == user_id {
            return Ok(Access::FULL);
        }
        AccessGrantRepository::grantee_access(&state.db, &note.id, user_id).await
    }
}

fn validate_template_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Template name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Template name cannot exceed {} characters",
            MAX_TEMPLATE_NAME_LEN
        )));
    }
    Ok(name)
}
