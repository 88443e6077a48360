//! Per-request token lifecycle: decode-or-default, expose, refresh.
//!
//! `TokenRefresh::process` wraps one downstream call:
//! 1. read `Authorization: Bearer <jwt>` (missing header is an empty token)
//! 2. decode it, or fall back to the configured default claims on *any* failure
//! 3. put a fresh `ClaimStore` into the request extensions
//! 4. await the downstream call
//! 5. re-sign the (possibly mutated) claims with a new `exp` and set
//!    `Authorization: Bearer <jwt>` on the response
//!
//! A downstream error is returned untouched and no token is issued for it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, Request, Response, header};
use chrono::Utc;

use super::claim_store::{ClaimStore, Claims};
use super::codec::{HmacTokenCodec, TokenCodec, TokenError};

pub const DEFAULT_TTL_SECONDS: i64 = 1200;

const BEARER_PREFIX: &str = "Bearer ";

/// Construction-time settings. Immutable once the filter is built.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Claims for requests without a usable token.
    pub default_claims: Claims,
    /// Lifetime of every issued token.
    pub ttl_seconds: i64,
    /// Clock skew tolerated on inbound `exp`/`nbf`/`iat`.
    pub leeway_seconds: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            default_claims: Claims::new(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            leeway_seconds: 0,
        }
    }
}

#[derive(Clone)]
pub struct TokenRefresh {
    codec: Arc<dyn TokenCodec>,
    default_claims: Claims,
    ttl_seconds: i64,
}

impl fmt::Debug for TokenRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRefresh")
            .field("default_claims", &self.default_claims)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenRefresh {
    /// HS256 filter over `secret`.
    pub fn new(secret: &[u8], config: RefreshConfig) -> Result<Self, TokenError> {
        let codec = HmacTokenCodec::new(secret, config.leeway_seconds)?;
        Ok(Self::with_codec(
            Arc::new(codec),
            config.default_claims,
            config.ttl_seconds,
        ))
    }

    pub fn with_codec(
        codec: Arc<dyn TokenCodec>,
        default_claims: Claims,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            codec,
            default_claims,
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn default_claims(&self) -> &Claims {
        &self.default_claims
    }

    /// Builds the request's claim store from its `Authorization` header.
    ///
    /// Decode errors are deliberately dropped here: every failure reason means
    /// "start over from the defaults".
    pub fn claims_for(&self, headers: &HeaderMap) -> ClaimStore {
        let token = bearer_token(headers);
        if token.is_empty() {
            return ClaimStore::new(self.default_claims.clone());
        }

        match self.codec.decode(token) {
            Ok(claims) => ClaimStore::new(claims),
            Err(_) => ClaimStore::new(self.default_claims.clone()),
        }
    }

    /// Signs the store's current claims with `exp = now + ttl`.
    pub fn issue(&self, store: &ClaimStore, now: i64) -> Result<String, TokenError> {
        let claims = store.export_with_expiration(now.saturating_add(self.ttl_seconds));
        self.codec.encode(&claims)
    }

    pub async fn process<B, R, F, Fut, E>(
        &self,
        mut req: Request<B>,
        next: F,
    ) -> Result<Response<R>, E>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Result<Response<R>, E>>,
        E: From<TokenError>,
    {
        let store = self.claims_for(req.headers());
        req.extensions_mut().insert(store.clone());

        let mut response = next(req).await?;

        // `store` is a handle to the very instance handlers saw, so this reads
        // the post-handling claims.
        let token = self.issue(&store, Utc::now().timestamp())?;
        let value = HeaderValue::try_from(format!("{BEARER_PREFIX}{token}"))
            .map_err(|_| TokenError::InvalidHeader)?;
        response.headers_mut().insert(header::AUTHORIZATION, value);

        Ok(response)
    }
}

/// Token part of the `Authorization` header.
///
/// Only a leading `"Bearer "` is stripped; any other value is passed through
/// whole (and will simply fail to decode). Missing or non-UTF-8 headers give "".
pub fn bearer_token(headers: &HeaderMap) -> &str {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    value.strip_prefix(BEARER_PREFIX).unwrap_or(value)
}
