//! Product catalog REST backend: admin auth, product/category/settings CRUD,
//! and image upload over PostgreSQL.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use auth::{AdminClaims, Claims};
pub use config::AppConfig;
pub use error::{AppError, ConfigError};
pub use routes::app;
pub use state::AppState;
pub use store::{ensure_schema, seed_default_admin};
