use std::env;

use serde::Deserialize;

use crate::db::VisibilityScope;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub rate_limit: RateLimitConfig,
    pub sharing: SharingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    /// Whether to set the `Secure` flag on the session cookie.
    /// Read from env var `COOKIE_SECURE` (accepted values: "true"/"false", "1"/"0", "yes"/"no").
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// bcrypt work factor used when registering users.
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for auth endpoints (e.g. /api/auth/login)
    pub auth_per_second: u32,
    /// Burst size for auth endpoints
    pub auth_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SharingConfig {
    /// Which read grants make a note visible in a user's note list.
    /// Read from `NOTES_VISIBILITY_SCOPE` ("grantee" or "any_grant").
    pub visibility_scope: VisibilityScope,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                cookie_secure: match env::var("COOKIE_SECURE") {
                    Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"),
                    Err(_) => false,
                },
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/notes.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .map_err(|_| ConfigError::MissingEnv("JWT_SECRET".to_string()))?,
                expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
            },
            password: PasswordConfig {
                bcrypt_cost: env::var("BCRYPT_COST")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(bcrypt::DEFAULT_COST),
            },
            rate_limit: RateLimitConfig {
                auth_per_second: env::var("RATE_LIMIT_AUTH_PER_SECOND")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                auth_burst: env::var("RATE_LIMIT_AUTH_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            sharing: SharingConfig {
                visibility_scope: match env::var("NOTES_VISIBILITY_SCOPE") {
                    Ok(v) => parse_visibility_scope(&v)?,
                    Err(_) => VisibilityScope::default(),
                },
            },
        })
    }
}

fn parse_visibility_scope(value: &str) -> Result<VisibilityScope, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "grantee" => Ok(VisibilityScope::Grantee),
        "any_grant" | "any" => Ok(VisibilityScope::AnyGrant),
        _ => Err(ConfigError::InvalidValue("NOTES_VISIBILITY_SCOPE".to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
                cookie_secure: false,
            },
            database: DatabaseConfig {
                url: "sqlite://data/notes.db".to_string(),
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: String::new(),
                expiration_hours: 24,
            },
            password: PasswordConfig {
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            rate_limit: RateLimitConfig {
                auth_per_second: 3,
                auth_burst: 10,
            },
            sharing: SharingConfig {
                visibility_scope: VisibilityScope::Grantee,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_visibility_scope_values() {
        assert_eq!(
            parse_visibility_scope("grantee").unwrap(),
            VisibilityScope::Grantee
        );
        assert_eq!(
            parse_visibility_scope(" ANY_GRANT ").unwrap(),
            VisibilityScope::AnyGrant
        );
        assert!(matches!(
            parse_visibility_scope("everyone"),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn default_scope_filters_by_grantee() {
        assert_eq!(
            Config::default().sharing.visibility_scope,
            VisibilityScope::Grantee
        );
    }
}
