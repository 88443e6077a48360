/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /session を route
 * - token refresh は app.rs 側で v1 全体に layer する
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    health::health,
    session::{delete_claim, get_session, put_claim, record_visit},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/session", get(get_session))
        .route(
            "/session/claims/{name}",
            put(put_claim).delete(delete_claim),
        )
        .route("/session/visits", post(record_visit))
}
