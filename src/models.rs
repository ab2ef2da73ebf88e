//! Row types for the catalog schema.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Public projection of an admin, safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AdminPublic {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
}

impl From<Admin> for AdminPublic {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            email: admin.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Number of products referencing this category (scalar subquery).
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub category_id: Option<Uuid>,
    /// Joined from categories; null when the product has no category.
    pub category_name: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ordered image URLs, loaded separately from product_images.
    #[sqlx(skip)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Setting {
    pub setting_key: String,
    pub setting_value: String,
    pub updated_at: DateTime<Utc>,
}
