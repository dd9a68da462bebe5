//! Per-route permission guard: bearer credential → verified claims → permission check.
//!
//! On success the `ClaimSet` is placed in request extensions for the
//! `Authorized` extractor; on failure the handler is never invoked.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::error::AppError;
use crate::services::auth::{PermissionGuard, RequiredPermission};
use crate::state::AppState;

/// Guard every method of `method_router` with `permission`.
///
/// 例：
/// ```ignore
/// .route("/drinks", get(list_drinks).merge(protect(post(create_drink), &state, CREATE_DRINKS)))
/// ```
pub fn protect(
    method_router: MethodRouter<AppState>,
    state: &AppState,
    permission: RequiredPermission,
) -> MethodRouter<AppState> {
    let guard = PermissionGuard::new(state.auth.clone(), permission);
    // route_layer: the guard runs only for requests that matched this route
    method_router.route_layer(middleware::from_fn_with_state(guard, guard_middleware))
}

async fn guard_middleware(
    State(guard): State<PermissionGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req.headers().get(header::AUTHORIZATION).cloned();
    let required = guard.required();

    let response = guard
        .run(authorization.as_ref(), |claims| async move {
            tracing::debug!(
                subject = claims.subject.as_deref().unwrap_or("-"),
                permission = %required,
                "request authorized"
            );
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(claims);
            next.run(req).await
        })
        .await?;

    Ok(response)
}
