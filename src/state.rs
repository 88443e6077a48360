/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - refresh: token の decode / 再署名 (設定は起動時に固定、リクエスト間で共有するのは読み取りのみ)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::token::TokenRefresh;

#[derive(Clone, Debug)]
pub struct AppState {
    pub refresh: Arc<TokenRefresh>,
}

impl AppState {
    pub fn new(refresh: Arc<TokenRefresh>) -> Self {
        Self { refresh }
    }
}
