use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use thiserror::Error;

use super::claim_store::Claims;

/// The one signing algorithm tokens are issued and accepted with.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,
    /// Any verification failure: structure, signature, algorithm, `exp`/`nbf`/`iat`,
    /// or a payload that is not a claim mapping.
    #[error("token decode failed: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
    #[error("token encode failed: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("signed token is not a valid header value")]
    InvalidHeader,
}

/// Signing/verification primitive used by the refresh filter.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, claims: &Claims) -> Result<String, TokenError>;
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HS256 codec over a shared secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct HmacTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for HmacTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacTokenCodec")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl HmacTokenCodec {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        // Claims are opaque to us: `exp`/`nbf`/`iat` are checked when present, but
        // nothing is required and `aud`/`iss` are not interpreted.
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.required_spec_claims = HashSet::new();
        validation.validate_aud = false;
        validation.validate_nbf = true;
        validation.leeway = leeway_seconds;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl TokenCodec for HmacTokenCodec {
    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Decode)?;

        // jsonwebtoken never looks at `iat`; a token issued in the future is
        // as unusable as one that is not valid yet.
        let leeway = i64::try_from(self.validation.leeway).unwrap_or(i64::MAX);
        let latest = Utc::now().timestamp().saturating_add(leeway);
        let issued_in_future = data
            .claims
            .get("iat")
            .and_then(Value::as_i64)
            .is_some_and(|iat| iat > latest);
        if issued_in_future {
            return Err(TokenError::Decode(ErrorKind::ImmatureSignature.into()));
        }

        Ok(data.claims)
    }
}
