//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use uuid::Uuid;

/// Unpaginated list or map payload: `{"data": ...}`.
#[derive(Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Paginated list payload: `{"data": [...], "pagination": {...}}`.
#[derive(Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let pages = (total + i64::from(limit) - 1) / i64::from(limit);
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Serialize)]
pub struct CreatedBody {
    pub id: Uuid,
    pub message: String,
}

pub fn message(text: &str) -> Json<MessageBody> {
    Json(MessageBody {
        message: text.to_string(),
    })
}

pub fn created(id: Uuid, text: &str) -> (StatusCode, Json<CreatedBody>) {
    (
        StatusCode::CREATED,
        Json(CreatedBody {
            id,
            message: text.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_is_ceil_of_total_over_limit() {
        assert_eq!(Pagination::new(2, 5, 12).pages, 3);
        assert_eq!(Pagination::new(1, 5, 10).pages, 2);
        assert_eq!(Pagination::new(1, 10, 1).pages, 1);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
    }
}
