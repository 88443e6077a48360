//! Token refresh middleware (axum glue for `TokenRefresh::process`).
//!
//! - Decodes `Authorization: Bearer <jwt>` or falls back to the default claims
//! - Inserts a `ClaimStore` into request extensions (handlers use `ClaimsExtractor`)
//! - Sets a freshly signed `Authorization: Bearer <jwt>` on successful responses
//!
//! Responses built from `AppError` carry `HandlingFailed` and are passed
//! through untouched, without a token.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, HandlingFailed};
use crate::services::token::TokenError;
use crate::state::AppState;

/// `/api/v1/*` に token refresh を掛ける。
///
/// 例：
/// ```ignore
/// let v1 = middleware::token_refresh::apply(api::v1::routes(), state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(
        state,
        token_refresh_middleware,
    ))
}

enum RefreshFailure {
    Handler(Response),
    Token(TokenError),
}

impl From<TokenError> for RefreshFailure {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

impl IntoResponse for RefreshFailure {
    fn into_response(self) -> Response {
        match self {
            Self::Handler(response) => response,
            Self::Token(e) => AppError::from(e).into_response(),
        }
    }
}

async fn token_refresh_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let outcome = state
        .refresh
        .process(req, |req| async move {
            let response = next.run(req).await;
            if response.extensions().get::<HandlingFailed>().is_some() {
                Err(RefreshFailure::Handler(response))
            } else {
                Ok(response)
            }
        })
        .await;

    match outcome {
        Ok(response) => response,
        Err(failure) => failure.into_response(),
    }
}
