/*
 * Responsibility
 * - URL 構造を定義
 * - 各 route に必要な権限をここで固定する (request から導出しない)
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::api::handlers::{
    drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
    health::health,
};
use crate::middleware::auth::access::protect;
use crate::services::auth::RequiredPermission;
use crate::state::AppState;

pub const READ_DRINK_DETAILS: RequiredPermission = RequiredPermission::new("get:drinks-detail");
pub const CREATE_DRINKS: RequiredPermission = RequiredPermission::new("post:drinks");
pub const UPDATE_DRINKS: RequiredPermission = RequiredPermission::new("patch:drinks");
pub const DELETE_DRINKS: RequiredPermission = RequiredPermission::new("delete:drinks");

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(list_drinks).merge(protect(post(create_drink), state, CREATE_DRINKS)),
        )
        .route(
            "/drinks-detail",
            protect(get(list_drinks_detail), state, READ_DRINK_DETAILS),
        )
        .route(
            "/drinks/{drink_id}",
            protect(patch(update_drink), state, UPDATE_DRINKS)
                .merge(protect(delete(delete_drink), state, DELETE_DRINKS)),
        )
}
