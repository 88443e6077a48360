/*
 * Responsibility
 * - 1 リクエスト分の claims (name → JSON value) を保持する
 * - middleware と handler が同じインスタンスを共有する (Clone はハンドルの複製)
 * - refresh 時に `exp` を差し替えた claims を書き出す (store 自体は変更しない)
 */
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

/// Claim mapping carried inside a token.
pub type Claims = Map<String, Value>;

/// Per-request, mutable view of the token claims.
///
/// Cloning yields another handle to the *same* claims, which is how the
/// refresh middleware observes mutations made by handlers. A new store is
/// created for every request and never put anywhere global.
#[derive(Clone, Debug, Default)]
pub struct ClaimStore {
    claims: Arc<Mutex<Claims>>,
}

impl ClaimStore {
    pub fn new(claims: Claims) -> Self {
        Self {
            claims: Arc::new(Mutex::new(claims)),
        }
    }

    /// Returns `None` when the claim is absent. A stored JSON null comes back
    /// as `Some(Value::Null)`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Current claims, as-is.
    pub fn snapshot(&self) -> Claims {
        self.lock().clone()
    }

    /// Current claims with `exp` overwritten (or inserted).
    pub fn export_with_expiration(&self, expires_at: i64) -> Claims {
        let mut claims = self.snapshot();
        claims.insert("exp".to_string(), Value::from(expires_at));
        claims
    }

    fn lock(&self) -> MutexGuard<'_, Claims> {
        // A panicking handler must not take the refresh step down with it.
        self.claims.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Claims> for ClaimStore {
    fn from(claims: Claims) -> Self {
        Self::new(claims)
    }
}
