use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{Note, UpdateNote};
use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::services::notes::NoteService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        // NOTE: "/search" must stay a static segment next to "/:id"
        .route("/search", get(search_notes))
        .route("/:id", get(get_note).put(update_note).delete(delete_note))
        .route("/:id/analyse", get(analyse_note))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub contents: String,
    /// Name of one of the caller's sharing templates to apply on creation.
    pub template: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub contents: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyseResponse {
    pub keyword: String,
    pub count: usize,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_notes(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Note>>> {
    let notes = NoteService::list_visible(&state, &user.id).await?;
    Ok(Json(notes))
}

async fn create_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> AppResult<impl IntoResponse> {
    let note = NoteService::create(
        &state,
        &user,
        request.title,
        request.contents,
        request.template.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

async fn search_notes(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<KeywordQuery>,
) -> AppResult<Json<Vec<Note>>> {
    let notes = NoteService::search(&state, &user.id, &query.q).await?;
    Ok(Json(notes))
}

async fn get_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Note>> {
    let note = NoteService::get(&state, &user.id, &id).await?;
    Ok(Json(note))
}

async fn update_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> AppResult<Json<Note>> {
    let note = NoteService::update(
        &state,
        &user.id,
        &id,
        UpdateNote {
            title: request.title,
            contents: request.contents,
        },
    )
    .await?;
    Ok(Json(note))
}

async fn delete_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    NoteService::delete(&state, &user.id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn analyse_note(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Query(query): Query<KeywordQuery>,
) -> AppResult<Json<AnalyseResponse>> {
    let count = NoteService::analyse(&state, &user.id, &id, &query.q).await?;
    Ok(Json(AnalyseResponse {
        keyword: query.q,
        count,
    }))
}
