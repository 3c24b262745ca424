use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::db::UserRepository;
use crate::error::AppResult;
use crate::routes::auth::{AuthUser, UserResponse};
use crate::AppState;

/// Router for user-related endpoints
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_users))
}

/// List every user so owners can pick grantees. Requires authentication.
async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepository::list_all(&state.db).await?;
    let res: Vec<UserResponse> = users.into_iter().map(Into::into).collect();

    Ok(Json(res))
}
