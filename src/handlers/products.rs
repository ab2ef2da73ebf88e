//! Product CRUD with filtering, pagination, and the ordered image list.
//!
//! A product row and its images live in separate tables; every write that
//! touches both runs in one transaction so the pair is never half-applied.

use crate::auth::AdminClaims;
use crate::error::AppError;
use crate::models::Product;
use crate::response::{created, message, CreatedBody, MessageBody, Paginated, Pagination};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;

const SELECT: &str = r#"
    SELECT p.id, p.name, p.price, p.category_id, c.name AS category_name,
           p.description, p.created_at, p.updated_at
    FROM products p
    LEFT JOIN categories c ON p.category_id = c.id
"#;

/// Shared filter clause for the list and count queries.
/// $1 = category id (or null), $2 = `%search%` pattern (or null).
const LIST_FILTER: &str = r#"
    ($1::uuid IS NULL OR p.category_id = $1)
    AND ($2::text IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2)
"#;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    /// Page floored at 1; limit clamped to 1..=100, default 10.
    fn page_and_limit(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (page, limit)
    }

    fn category_id(&self) -> Result<Option<Uuid>, AppError> {
        match self.category.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Uuid::parse_str(s)
                .map(Some)
                .map_err(|_| AppError::BadRequest("invalid category id".into())),
            None => Ok(None),
        }
    }

    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

/// GET /api/products
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<Product>>, AppError> {
    let (page, limit) = params.page_and_limit();
    let category = params.category_id()?;
    let search = params.search_pattern();
    let offset = i64::from(page - 1) * i64::from(limit);

    let count_sql = format!("SELECT COUNT(*) FROM products p WHERE {LIST_FILTER}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(category)
        .bind(&search)
        .fetch_one(&state.pool)
        .await?;

    let rows_sql = format!(
        "{SELECT} WHERE {LIST_FILTER} ORDER BY p.created_at DESC LIMIT $3 OFFSET $4"
    );
    let mut products: Vec<Product> = sqlx::query_as(&rows_sql)
        .bind(category)
        .bind(&search)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    // One batched query for the whole page instead of one per product.
    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut images = load_images(&state.pool, &ids).await?;
    for product in &mut products {
        product.images = images.remove(&product.id).unwrap_or_default();
    }

    Ok(Json(Paginated {
        data: products,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/products/:id
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let sql = format!("{SELECT} WHERE p.id = $1");
    let product: Option<Product> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let mut product = product.ok_or_else(|| AppError::NotFound("product not found".into()))?;
    product.images = load_images(&state.pool, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Json(body): Json<CreateProduct>,
) -> Result<(StatusCode, Json<CreatedBody>), AppError> {
    let name = body.name.as_deref().map(str::trim).unwrap_or("");
    let (Some(price), Some(category_id)) = (body.price, body.category_id) else {
        return Err(AppError::BadRequest("name, price and category required".into()));
    };
    if name.is_empty() {
        return Err(AppError::BadRequest("name, price and category required".into()));
    }
    ensure_category_exists(&state, category_id).await?;

    let id = Uuid::new_v4();
    let mut tx = state.pool.begin().await?;
    sqlx::query(
        "INSERT INTO products (id, name, price, category_id, description) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(category_id)
    .bind(body.description.as_deref().unwrap_or(""))
    .execute(&mut *tx)
    .await?;
    if let Some(images) = &body.images {
        insert_images(&mut *tx, id, images).await?;
    }
    tx.commit().await?;

    Ok(created(id, "product created"))
}

/// PUT /api/products/:id — partial update; an `images` array, when
/// present, replaces the whole list.
pub async fn update(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProduct>,
) -> Result<Json<MessageBody>, AppError> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("product not found".into()));
    }
    if let Some(category_id) = body.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let has_field_updates = body.name.is_some()
        || body.price.is_some()
        || body.category_id.is_some()
        || body.description.is_some();

    let mut tx = state.pool.begin().await?;
    if has_field_updates {
        sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                category_id = COALESCE($4, category_id),
                description = COALESCE($5, description),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(body.name.as_deref().map(str::trim))
        .bind(body.price)
        .bind(body.category_id)
        .bind(body.description)
        .execute(&mut *tx)
        .await?;
    }
    if let Some(images) = &body.images {
        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_images(&mut *tx, id, images).await?;
    }
    tx.commit().await?;

    Ok(message("product updated"))
}

/// DELETE /api/products/:id — images go with the product (FK cascade).
pub async fn delete(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageBody>, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product not found".into()));
    }
    Ok(message("product deleted"))
}

async fn ensure_category_exists(state: &AppState, category_id: Uuid) -> Result<(), AppError> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(&state.pool)
        .await?;
    exists
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("unknown category".into()))
}

/// Ordered image URLs for a set of products, keyed by product id.
async fn load_images(
    pool: &sqlx::PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<String>>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, String)> = sqlx::query_as(
        r#"
        SELECT product_id, image_url FROM product_images
        WHERE product_id = ANY($1)
        ORDER BY product_id, sort_order
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    let mut grouped: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (product_id, url) in rows {
        grouped.entry(product_id).or_default().push(url);
    }
    Ok(grouped)
}

/// Insert the image list with a dense sort order taken from list position.
async fn insert_images(
    tx: &mut PgConnection,
    product_id: Uuid,
    images: &[String],
) -> Result<(), AppError> {
    for (index, url) in images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_images (id, product_id, image_url, sort_order) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(url)
        .bind(index as i32)
        .execute(&mut *tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, limit: Option<u32>) -> ListParams {
        ListParams {
            page,
            limit,
            ..ListParams::default()
        }
    }

    #[test]
    fn page_and_limit_defaults() {
        assert_eq!(params(None, None).page_and_limit(), (1, 10));
    }

    #[test]
    fn limit_is_clamped_to_1_100() {
        assert_eq!(params(None, Some(0)).page_and_limit(), (1, 1));
        assert_eq!(params(None, Some(1000)).page_and_limit(), (1, 100));
        assert_eq!(params(Some(0), Some(5)).page_and_limit(), (1, 5));
    }

    #[test]
    fn category_filter_rejects_garbage_ignores_empty() {
        let p = ListParams {
            category: Some("not-a-uuid".into()),
            ..ListParams::default()
        };
        assert!(p.category_id().is_err());

        let p = ListParams {
            category: Some(String::new()),
            ..ListParams::default()
        };
        assert_eq!(p.category_id().unwrap(), None);
    }

    #[test]
    fn search_pattern_wraps_in_wildcards() {
        let p = ListParams {
            search: Some(" pearl ".into()),
            ..ListParams::default()
        };
        assert_eq!(p.search_pattern().as_deref(), Some("%pearl%"));
        let p = ListParams {
            search: Some("  ".into()),
            ..ListParams::default()
        };
        assert_eq!(p.search_pattern(), None);
    }
}
