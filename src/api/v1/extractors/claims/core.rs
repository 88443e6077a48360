use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};

use crate::services::token::ClaimStore;

/// Handler で ClaimStore を受け取るための extractor
/// middleware が ClaimStore を request.extensions() に insert 済みである前提
/// 見つからない場合は 500 を返す（ミドルウェア未設定 = 配線ミス）
pub struct ClaimsExtractor(pub ClaimStore);

impl<S> FromRequestParts<S> for ClaimsExtractor
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ClaimStore>()
            .cloned()
            .map(ClaimsExtractor)
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
