/*
 * Responsibility
 * - /session 系 handler (現在の claims の参照・更新)
 * - ClaimStore への変更は token refresh middleware がレスポンスの token に反映する
 */
use axum::{Json, extract::Path, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::{api::v1::extractors::ClaimsExtractor, error::AppError, services::token::Claims};

#[derive(Debug, Serialize)]
pub struct VisitsResponse {
    pub visits: i64,
}

pub async fn get_session(ClaimsExtractor(claims): ClaimsExtractor) -> Json<Claims> {
    Json(claims.snapshot())
}

pub async fn put_claim(
    ClaimsExtractor(claims): ClaimsExtractor,
    Path(name): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<Claims>, AppError> {
    // exp is always rewritten on the way out.
    if name == "exp" {
        return Err(AppError::bad_request(
            "RESERVED_CLAIM",
            "'exp' is managed by the server",
        ));
    }

    claims.set(name, value);
    Ok(Json(claims.snapshot()))
}

pub async fn delete_claim(
    ClaimsExtractor(claims): ClaimsExtractor,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    if !claims.contains(&name) {
        return Err(AppError::not_found("claim"));
    }

    claims.remove(&name);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_visit(ClaimsExtractor(claims): ClaimsExtractor) -> Json<VisitsResponse> {
    let visits = claims
        .get("visits")
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
        .saturating_add(1);

    claims.set("visits", visits);
    Json(VisitsResponse { visits })
}
