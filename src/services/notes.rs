use std::sync::Arc;

use crate::db::{CreateNote, Note, NoteRepository, UpdateNote, User};
use crate::error::{AppError, AppResult};
use crate::services::sharing::SharingService;
use crate::AppState;

/// Longest accepted title and contents, in characters.
pub const MAX_TITLE_LEN: usize = 30;
pub const MAX_CONTENTS_LEN: usize = 1000;

pub struct NoteService;

impl NoteService {
    pub fn validate_title(title: &str) -> AppResult<()> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title cannot exceed {} characters",
                MAX_TITLE_LEN
            )));
        }
        Ok(())
    }

    pub fn validate_contents(contents: &str) -> AppResult<()> {
        if contents.chars().count() > MAX_CONTENTS_LEN {
            return Err(AppError::Validation(format!(
                "Contents cannot exceed {} characters",
                MAX_CONTENTS_LEN
            )));
        }
        Ok(())
    }

    /// Create a note owned by `owner`, optionally sharing it through one of
    /// the owner's templates. Note and grants are committed together.
    pub async fn create(
        state: &Arc<AppState>,
        owner: &User,
        title: String,
        contents: String,
        template: Option<&str>,
    ) -> AppResult<Note> {
        Self::validate_title(&title)?;
        Self::validate_contents(&contents)?;

        let template = template.map(str::trim).filter(|t| !t.is_empty());

        let mut tx = state.db.begin().await.map_err(AppError::Database)?;

        let note = NoteRepository::create(
            &mut *tx,
            CreateNote {
                user_id: owner.id.clone(),
                title,
                contents,
            },
        )
        .await?;

        if let Some(name) = template {
            SharingService::apply_template(&mut tx, &note.id, &owner.id, name).await?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("User {} created note {}", owner.id, note.id);
        Ok(note)
    }

    /// Load a note the user may read.
    pub async fn get(state: &Arc<AppState>, user_id: &str, note_id: &str) -> AppResult<Note> {
        let note = Self::find(state, note_id).await?;

        if !SharingService::effective_access(state, &note, user_id)
            .await?
            .read
        {
            tracing::warn!(
                "Access denied: user {} attempted to read note {} without a read grant",
                user_id,
                note_id
            );
            return Err(AppError::Forbidden);
        }

        Ok(note)
    }

    /// Update a note the user may write.
    pub async fn update(
        state: &Arc<AppState>,
        user_id: &str,
        note_id: &str,
        update: UpdateNote,
    ) -> AppResult<Note> {
        if let Some(ref title) = update.title {
            Self::validate_title(title)?;
        }
        if let Some(ref contents) = update.contents {
            Self::validate_contents(contents)?;
        }

        let note = Self::find(state, note_id).await?;

        if !SharingService::effective_access(state, &note, user_id)
            .await?
            .write
        {
            tracing::warn!(
                "Access denied: user {} attempted to edit note {} without a write grant",
                user_id,
                note_id
            );
            return Err(AppError::Forbidden);
        }

        let updated = NoteRepository::update(&state.db, note_id, update).await?;
        tracing::info!("User {} updated note {}", user_id, note_id);
        Ok(updated)
    }

    /// Delete a note and its grants. Only the owner may do this.
    pub async fn delete(state: &Arc<AppState>, user_id: &str, note_id: &str) -> AppResult<()> {
        let note = Self::find(state, note_id).await?;

        if note.user_id != user_id {
            tracing::warn!(
                "Access denied: user {} attempted to delete note {} owned by {}",
                user_id,
                note_id,
                note.user_id
            );
            return Err(AppError::Forbidden);
        }

        NoteRepository::delete(&state.db, note_id).await?;
        tracing::info!("User {} deleted note {}", user_id, note_id);
        Ok(())
    }

    pub async fn list_visible(state: &Arc<AppState>, user_id: &str) -> AppResult<Vec<Note>> {
        let scope = state.config.sharing.visibility_scope;
        NoteRepository::visible_to(&state.db, user_id, scope).await
    }

    pub async fn search(state: &Arc<AppState>, user_id: &str, query: &str) -> AppResult<Vec<Note>> {
        NoteRepository::search_visible(
            &state.db,
            user_id,
            state.config.sharing.visibility_scope,
            query,
        )
        .await
    }

    /// Count non-overlapping occurrences of `keyword` in a readable note.
    pub async fn analyse(
        state: &Arc<AppState>,
        user_id: &str,
        note_id: &str,
        keyword: &str,
    ) -> AppResult<usize> {
        let note = Self::get(state, user_id, note_id).await?;
        Ok(count_occurrences(&note.contents, keyword))
    }

    async fn find(state: &Arc<AppState>, note_id: &str) -> AppResult<Note> {
        NoteRepository::find_by_id(&state.db, note_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Note not found".to_string()))
    }
}

pub fn count_occurrences(haystack: &str, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }
    haystack.matches(keyword).count()
}
