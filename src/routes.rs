//! Route table. Dispatch is by method + typed path; unknown API routes
//! get a JSON 404 and wrong methods a 405 from the router itself.

use crate::error::AppError;
use crate::handlers::{auth, categories, products, settings, upload};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadyBody>, (axum::http::StatusCode, Json<ReadyBody>)> {
    if sqlx::query("SELECT 1").fetch_optional(&state.pool).await.is_err() {
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: "ok",
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn not_found() -> AppError {
    AppError::NotFound("route not found".into())
}

fn api_routes() -> Router<AppState> {
    // Uploads need headroom over the file cap for multipart framing.
    let upload_body_limit = DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES + 64 * 1024);

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/verify", post(auth::verify))
        .route("/auth/change-password", post(auth::change_password))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/:id",
            get(products::read)
                .put(products::update)
                .delete(products::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/:id",
            get(categories::read)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/settings", get(settings::list).put(settings::update))
        .route(
            "/settings/:key",
            get(settings::read).delete(settings::delete),
        )
        .route("/upload", post(upload::upload).layer(upload_body_limit))
}

/// Full application router: `/api` JSON endpoints, statically served
/// uploads, permissive CORS, request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .nest("/api", api_routes())
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
