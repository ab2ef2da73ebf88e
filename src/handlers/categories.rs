//! Category CRUD. Deletion is refused while products still reference the
//! category.

use crate::auth::AdminClaims;
use crate::error::{conflict_on_unique, AppError};
use crate::models::Category;
use crate::response::{created, message, CreatedBody, DataBody, MessageBody};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

const SELECT: &str = r#"
    SELECT c.id, c.name, c.created_at,
           (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count
    FROM categories c
"#;

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: Option<String>,
}

fn required_name(body: &CategoryBody) -> Result<&str, AppError> {
    match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(AppError::BadRequest("category name required".into())),
    }
}

/// GET /api/categories
pub async fn list(State(state): State<AppState>) -> Result<Json<DataBody<Vec<Category>>>, AppError> {
    let sql = format!("{SELECT} ORDER BY c.name");
    let data: Vec<Category> = sqlx::query_as(&sql).fetch_all(&state.pool).await?;
    Ok(Json(DataBody { data }))
}

/// GET /api/categories/:id
pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, AppError> {
    let sql = format!("{SELECT} WHERE c.id = $1");
    let category: Option<Category> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    category
        .map(Json)
        .ok_or_else(|| AppError::NotFound("category not found".into()))
}

/// POST /api/categories
pub async fn create(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Json(body): Json<CategoryBody>,
) -> Result<(StatusCode, Json<CreatedBody>), AppError> {
    let name = required_name(&body)?;

    let duplicate: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(&state.pool)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "a category with this name already exists".into(),
        ));
    }

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(&state.pool)
        .await
        // Concurrent create with the same name loses the UNIQUE race.
        .map_err(|e| {
            conflict_on_unique(
                e,
                AppError::Conflict("a category with this name already exists".into()),
            )
        })?;
    Ok(created(id, "category created"))
}

/// PUT /api/categories/:id
pub async fn update(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CategoryBody>,
) -> Result<Json<MessageBody>, AppError> {
    let name = required_name(&body)?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("category not found".into()));
    }

    let taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM categories WHERE name = $1 AND id != $2")
            .bind(name)
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(
            "a category with this name already exists".into(),
        ));
    }

    sqlx::query("UPDATE categories SET name = $1 WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                AppError::Conflict("a category with this name already exists".into()),
            )
        })?;
    Ok(message("category updated"))
}

/// DELETE /api/categories/:id
pub async fn delete(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageBody>, AppError> {
    let product_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
    if product_count > 0 {
        return Err(AppError::BadRequest(format!(
            "cannot delete: {product_count} product(s) in this category"
        )));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("category not found".into()));
    }
    Ok(message("category deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required_and_trimmed() {
        let ok = CategoryBody {
            name: Some("  Rings  ".into()),
        };
        assert_eq!(required_name(&ok).unwrap(), "Rings");

        for body in [CategoryBody { name: None }, CategoryBody { name: Some("   ".into()) }] {
            assert!(matches!(required_name(&body), Err(AppError::BadRequest(_))));
        }
    }
}
