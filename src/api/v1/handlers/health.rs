/*
 * Responsibility
 * - GET /api/v1/health (疎通用)
 * - token refresh middleware の内側にあるので、レスポンスには常に新しい token が付く
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
