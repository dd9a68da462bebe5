/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - drinks: 保存先 (Postgres / in-memory)
 *   - auth: TokenVerifier (内部に key set cache を共有で持つ)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::DrinkRepo;
use crate::services::auth::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub drinks: Arc<dyn DrinkRepo>,
    pub auth: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(drinks: Arc<dyn DrinkRepo>, auth: Arc<TokenVerifier>) -> Self {
        Self { drinks, auth }
    }
}
