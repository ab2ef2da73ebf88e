//! Catalog schema DDL and first-run seeding.

use crate::auth::hash_password;
use crate::config::DefaultAdmin;
use crate::error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Idempotent schema setup, run at startup.
const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email TEXT,
        last_login TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        price NUMERIC(10,2) NOT NULL,
        category_id UUID REFERENCES categories(id),
        description TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_images (
        id UUID PRIMARY KEY,
        product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        image_url TEXT NOT NULL,
        sort_order INT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        setting_key TEXT PRIMARY KEY,
        setting_value TEXT NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_category ON products (category_id)",
    "CREATE INDEX IF NOT EXISTS idx_products_created ON products (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_product_images_product ON product_images (product_id, sort_order)",
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for ddl in DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Create the seed admin account if the admins table is empty. No-op
/// otherwise, so restarts never clobber a changed password.
pub async fn seed_default_admin(pool: &PgPool, admin: &DefaultAdmin) -> Result<(), AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let password_hash = hash_password(&admin.password)?;
    sqlx::query(
        "INSERT INTO admins (id, username, password_hash, email) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(&admin.username)
    .bind(&password_hash)
    .bind(&admin.email)
    .execute(pool)
    .await?;
    tracing::info!(username = %admin.username, "seeded default admin account");
    Ok(())
}
