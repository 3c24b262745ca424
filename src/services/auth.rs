use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::{CreateUser, User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub struct AuthService;

impl AuthService {
    /// Register a new user and return it.
    pub async fn register(
        state: &Arc<AppState>,
        given_name: &str,
        family_name: &str,
        password: &str,
    ) -> AppResult<User> {
        let given_name = given_name.trim();
        let family_name = family_name.trim();

        if given_name.is_empty() || family_name.is_empty() {
            return Err(AppError::Validation("Given and family names are required".to_string()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Password cannot be empty".to_string()));
        }

        let password_hash = bcrypt::hash(password, state.config.password.bcrypt_cost)?;

        let user = UserRepository::create(
            &state.db,
            CreateUser {
                given_name: given_name.to_string(),
                family_name: family_name.to_string(),
                password_hash,
            },
        )
        .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials and issue a session token.
    pub async fn login(
        state: &Arc<AppState>,
        user_id: &str,
        password: &str,
    ) -> AppResult<(User, String)> {
        let user = match UserRepository::find_by_id(&state.db, user_id).await? {
            Some(user) => user,
            None => {
                tracing::info!("Failed login for unknown user {}", user_id);
                return Err(AppError::Unauthorized);
            }
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            tracing::info!("Failed login for user {}", user.id);
            return Err(AppError::Unauthorized);
        }

        let token = create_jwt(&state.config, &user.id)?;
        tracing::info!("User {} logged in", user.id);
        Ok((user, token))
    }
}

/// Create a signed JWT for a user id
pub fn create_jwt(config: &Config, user_id: &str) -> AppResult<String> {
    let now = Utc::now();
    let exp = now + Duration::hours(config.jwt.expiration_hours);
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Decode and validate a JWT, returning the claims
pub fn decode_jwt(config: &Config, token: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
