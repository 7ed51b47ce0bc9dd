use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{
        LoginPayload, LoginResponse, LogoutResponse, RefreshTokenRequest, RefreshTokenResponse,
        RegisterPayload, UpdateUserPayload, UserListQuery, UserResponse,
    },
    error::Result,
    models::user::User,
    utils::jwt::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User registered", body = Json<UserResponse>),
        (status = 400, description = "Email already registered"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state.user_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Logged in", body = Json<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = Json<RefreshTokenResponse>),
        (status = 401, description = "Invalid or revoked refresh token")
    )
)]
#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse> {
    let response = state.user_service.refresh(&payload.refresh_token).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logged out", body = Json<LogoutResponse>),
        (status = 401, description = "Missing or invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse> {
    state
        .user_service
        .logout(&user, &claims, &payload.refresh_token)
        .await?;
    Ok(Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Current user profile", body = Json<UserResponse>))
)]
#[axum::debug_handler]
pub async fn get_me(Extension(user): Extension<User>) -> Result<impl IntoResponse> {
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/me",
    request_body = UpdateUserPayload,
    responses((status = 200, description = "Profile updated", body = Json<UserResponse>))
)]
#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state.user_service.update(user.id, payload).await?;
    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/me",
    responses((status = 200, description = "Account soft-deleted", body = Json<UserResponse>))
)]
#[axum::debug_handler]
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    let deleted = state.user_service.soft_delete(user.id).await?;
    Ok(Json(UserResponse::from(deleted)))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return")
    ),
    responses((status = 200, description = "All users", body = Json<Vec<UserResponse>>))
)]
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse> {
    let users = state
        .user_service
        .list(query.skip.unwrap_or(0), query.limit.unwrap_or(100))
        .await?;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = Json<UserResponse>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get_by_id(id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "User updated", body = Json<UserResponse>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let updated = state.user_service.update(id, payload).await?;
    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User soft-deleted", body = Json<UserResponse>),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let deleted = state.user_service.soft_delete(id).await?;
    Ok(Json(UserResponse::from(deleted)))
}
