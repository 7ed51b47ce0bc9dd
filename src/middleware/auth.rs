use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::models::user::User;
use crate::utils::jwt::{self, Claims, TOKEN_TYPE_ACCESS};
use crate::AppState;

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

fn forbidden(code: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": code }))).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal_error" })),
    )
        .into_response()
}

/// Resolves the bearer principal: verifies the access token, rejects
/// revoked jtis, and loads the backing user row, which must be active
/// (not soft-deleted) and currently logged in.
async fn resolve_principal(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<(Claims, User), Response> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    let claims = match jwt::decode_token_of_type(token, TOKEN_TYPE_ACCESS) {
        Ok(claims) => claims,
        Err(_) => return Err(unauthorized("invalid_token")),
    };
    let (user_id, jti) = match (claims.user_id(), claims.jti()) {
        (Ok(user_id), Ok(jti)) => (user_id, jti),
        _ => return Err(unauthorized("invalid_token")),
    };

    // A failed revocation lookup must never admit the token.
    let revoked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM token_blacklist WHERE jti = $1)",
    )
    .bind(jti)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        error!("token revocation lookup failed: {}", e);
        internal_error()
    })?;
    if revoked {
        return Err(unauthorized("token_revoked"));
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password_hash, role, status, is_active, created_at
         FROM users WHERE id = $1 AND is_active = TRUE",
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| {
        error!("principal lookup failed: {}", e);
        internal_error()
    })?;
    let Some(user) = user else {
        return Err(unauthorized("invalid_token"));
    };
    if user.status != "active" {
        return Err(forbidden("logged_out"));
    }

    Ok((claims, user))
}

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_principal(&state, req.headers()).await {
        Ok((claims, user)) => {
            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_principal(&state, req.headers()).await {
        Ok((claims, user)) => {
            if !user.is_admin() {
                return forbidden("admin_access_required");
            }
            req.extensions_mut().insert(claims);
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}
