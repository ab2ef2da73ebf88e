//! Environment-driven configuration. Loaded once at startup into a typed
//! struct and carried in [`crate::state::AppState`].

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Seed credentials for the first admin account. Only applied when the
/// admins table is empty.
#[derive(Debug, Clone)]
pub struct DefaultAdmin {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// HMAC key for token signing. Required; there is no fallback secret.
    pub jwt_secret: String,
    /// Token lifetime in seconds. Default 24h.
    pub token_ttl_secs: i64,
    /// Directory uploaded images are written to. Created on demand.
    pub upload_dir: PathBuf,
    /// Base URL prefixed to returned upload paths.
    pub public_base_url: String,
    pub default_admin: Option<DefaultAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8000");
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::Invalid("BIND_ADDR", bind_addr))?;

        let token_ttl_secs = env_or("TOKEN_TTL_SECS", "86400");
        let token_ttl_secs = token_ttl_secs
            .parse::<i64>()
            .ok()
            .filter(|t| *t > 0)
            .ok_or(ConfigError::Invalid("TOKEN_TTL_SECS", token_ttl_secs))?;

        let upload_dir = PathBuf::from(env_or("UPLOAD_DIR", "uploads"));
        let public_base_url = env_or("PUBLIC_BASE_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string();

        // Seeding is opt-in: both credentials must be set.
        let default_admin = match (std::env::var("ADMIN_USERNAME"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(DefaultAdmin {
                    username,
                    password,
                    email: std::env::var("ADMIN_EMAIL").ok().filter(|e| !e.is_empty()),
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            token_ttl_secs,
            upload_dir,
            public_base_url,
            default_admin,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
