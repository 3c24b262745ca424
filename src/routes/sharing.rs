use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::AccessGrant;
use crate::error::AppResult;
use crate::routes::auth::Session;
use crate::services::sharing::SharingService;
use crate::AppState;

/// Per-note sharing endpoints, merged into the `/api/notes` router.
pub fn note_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/:id/access",
            get(list_access).post(grant_access).put(update_access),
        )
        .route("/:id/shared-settings", post(save_shared_setting))
        .route("/:id/shared-settings/apply", post(apply_shared_setting))
}

/// Template listing, mounted at `/api/shared-settings`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_shared_settings))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GrantAccessRequest {
    pub user_id: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccessRequest {
    /// Restrict the update to one grantee. Without it every grant of the note changes.
    pub user_id: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

#[derive(Debug, Deserialize)]
pub struct SharedSettingRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_access(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(note_id): Path<String>,
) -> AppResult<Json<Vec<AccessGrant>>> {
    let grants = SharingService::list_access(&state, session.user_id(), &note_id).await?;
    Ok(Json(grants))
}

async fn grant_access(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(note_id): Path<String>,
    Json(request): Json<GrantAccessRequest>,
) -> AppResult<impl IntoResponse> {
    let grant = SharingService::grant_access(
        &state,
        session.user_id(),
        &note_id,
        &request.user_id,
        request.read,
        request.write,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(grant)))
}

async fn update_access(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(note_id): Path<String>,
    Json(request): Json<UpdateAccessRequest>,
) -> AppResult<Json<CountResponse>> {
    let count = SharingService::update_access(
        &state,
        session.user_id(),
        &note_id,
        request.user_id.as_deref(),
        request.read,
        request.write,
    )
    .await?;

    Ok(Json(CountResponse { count }))
}

async fn save_shared_setting(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(note_id): Path<String>,
    Json(request): Json<SharedSettingRequest>,
) -> AppResult<impl IntoResponse> {
    let count =
        SharingService::save_template(&state, session.user_id(), &note_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(CountResponse { count })))
}

async fn apply_shared_setting(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(note_id): Path<String>,
    Json(request): Json<SharedSettingRequest>,
) -> AppResult<Json<CountResponse>> {
    let applied = SharingService::apply_template_to_note(
        &state,
        session.user_id(),
        &note_id,
        &request.name,
    )
    .await?;

    Ok(Json(CountResponse {
        count: applied as u64,
    }))
}

async fn list_shared_settings(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> AppResult<Json<Vec<String>>> {
    let names = SharingService::list_template_names(&state, session.user_id()).await?;
    Ok(Json(names))
}
