use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::db::{User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::services::auth::{decode_jwt, AuthService};
use crate::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub given_name: String,
    pub family_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub given_name: String,
    pub family_name: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            given_name: u.given_name,
            family_name: u.family_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

// ============================================================================
// Handlers
// ============================================================================

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = AuthService::register(
        &state,
        &request.given_name,
        &request.family_name,
        &request.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Verify credentials, then hand out the token both in the body (Bearer use)
/// and as an HttpOnly cookie (browser use).
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let (user, token) = AuthService::login(&state, &request.user_id, &request.password).await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.server.cookie_secure)
        .max_age(time::Duration::hours(state.config.jwt.expiration_hours))
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Tokens are stateless, so logging out only drops the cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(serde_json::json!({ "message": "Logged out" })),
    )
}

async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

// ============================================================================
// Session resolution
// ============================================================================

/// Resolve the user behind a request, if any.
///
/// A Bearer token in the `Authorization` header wins over the `session`
/// cookie. Missing, malformed or expired tokens and tokens for deleted users
/// all resolve to `None`; only store failures are errors.
pub async fn current_user(state: &Arc<AppState>, parts: &Parts) -> AppResult<Option<User>> {
    let token = match bearer_token(parts) {
        Some(token) => token,
        None => match CookieJar::from_headers(&parts.headers).get(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => return Ok(None),
        },
    };

    let claims = match decode_jwt(&state.config, &token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Ignoring invalid session token: {:?}", e);
            return Ok(None);
        }
    };

    UserRepository::find_by_id(&state.db, &claims.sub).await
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    if !header.to_ascii_lowercase().starts_with("bearer ") {
        tracing::debug!("Authorization header doesn't start with 'Bearer '");
        return None;
    }

    let token = header[7..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Extractor for an optional session. Never rejects for missing credentials.
pub struct Session(pub Option<User>);

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Session(current_user(state, parts).await?))
    }
}

/// Extractor for an authenticated user. Rejects with 401 when there is no session.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match current_user(state, parts).await? {
            Some(user) => {
                tracing::debug!("Authenticated user: {}", user.id);
                Ok(AuthUser(user))
            }
            None => Err(AppError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{seed_user, test_state};
    use crate::services::auth::create_jwt;

    fn parts_with(header: http::HeaderName, value: &str) -> Parts {
        let (parts, _) = http::Request::builder()
            .header(header, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[tokio::test]
    async fn resolves_bearer_token() {
        let state = test_state().await;
        let user = seed_user(&state.db, "John").await;
        let token = create_jwt(&state.config, &user.id).unwrap();

        let parts = parts_with(http::header::AUTHORIZATION, &format!("Bearer {}", token));
        let resolved = current_user(&state, &parts).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn resolves_session_cookie() {
        let state = test_state().await;
        let user = seed_user(&state.db, "John").await;
        let token = create_jwt(&state.config, &user.id).unwrap();

        let parts = parts_with(http::header::COOKIE, &format!("session={}", token));
        let resolved = current_user(&state, &parts).await.unwrap();
        assert_eq!(resolved.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn bad_or_missing_tokens_are_anonymous() {
        let state = test_state().await;

        let (empty, _) = http::Request::builder().body(()).unwrap().into_parts();
        assert!(current_user(&state, &empty).await.unwrap().is_none());

        let garbage = parts_with(http::header::AUTHORIZATION, "Bearer not-a-jwt");
        assert!(current_user(&state, &garbage).await.unwrap().is_none());

        let token = create_jwt(&state.config, "deleted-user").unwrap();
        let orphan = parts_with(http::header::AUTHORIZATION, &format!("Bearer {}", token));
        assert!(current_user(&state, &orphan).await.unwrap().is_none());
    }
}
