//! Site settings: a flat key/value table with upsert semantics.

use crate::auth::AdminClaims;
use crate::error::AppError;
use crate::models::Setting;
use crate::response::{message, DataBody, MessageBody};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{Map, Value};

/// GET /api/settings — all settings flattened to `{data: {key: value}}`.
pub async fn list(State(state): State<AppState>) -> Result<Json<DataBody<Value>>, AppError> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT setting_key, setting_value FROM settings ORDER BY setting_key")
            .fetch_all(&state.pool)
            .await?;
    let mut data = Map::new();
    for (key, value) in rows {
        data.insert(key, Value::String(value));
    }
    Ok(Json(DataBody {
        data: Value::Object(data),
    }))
}

/// GET /api/settings/:key
pub async fn read(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Setting>, AppError> {
    let setting: Option<Setting> =
        sqlx::query_as("SELECT * FROM settings WHERE setting_key = $1")
            .bind(&key)
            .fetch_optional(&state.pool)
            .await?;
    setting
        .map(Json)
        .ok_or_else(|| AppError::NotFound("setting not found".into()))
}

/// PUT /api/settings — upsert every key/value pair in the body.
pub async fn update(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<MessageBody>, AppError> {
    let entries = match &body {
        Value::Object(map) if !map.is_empty() => map,
        _ => return Err(AppError::BadRequest("settings payload required".into())),
    };

    let mut tx = state.pool.begin().await?;
    for (key, value) in entries {
        let value = scalar_to_string(value)
            .ok_or_else(|| AppError::BadRequest(format!("setting '{key}' must be a scalar value")))?;
        sqlx::query(
            r#"
            INSERT INTO settings (setting_key, setting_value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(&value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(message("settings updated"))
}

/// DELETE /api/settings/:key
pub async fn delete(
    _claims: AdminClaims,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MessageBody>, AppError> {
    let result = sqlx::query("DELETE FROM settings WHERE setting_key = $1")
        .bind(&key)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("setting not found".into()));
    }
    Ok(message("setting deleted"))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_coerce_to_strings() {
        assert_eq!(scalar_to_string(&json!("fr")).as_deref(), Some("fr"));
        assert_eq!(scalar_to_string(&json!(42)).as_deref(), Some("42"));
        assert_eq!(scalar_to_string(&json!(true)).as_deref(), Some("true"));
    }

    #[test]
    fn composites_and_null_are_rejected() {
        assert_eq!(scalar_to_string(&json!(null)), None);
        assert_eq!(scalar_to_string(&json!([1, 2])), None);
        assert_eq!(scalar_to_string(&json!({"a": 1})), None);
    }
}
