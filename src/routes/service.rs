use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::service_dto::{
        AdminServiceListQuery, CreateServicePayload, ServiceListQuery, ServiceResponse,
        UpdateServicePayload,
    },
    error::Result,
    models::user::User,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/services",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("q" = Option<String>, Query, description = "Search in title or description"),
        ("price_min" = Option<f64>, Query, description = "Minimum price"),
        ("price_max" = Option<f64>, Query, description = "Maximum price")
    ),
    responses((status = 200, description = "Active services", body = Json<Vec<ServiceResponse>>))
)]
#[axum::debug_handler]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceListQuery>,
) -> Result<impl IntoResponse> {
    let services = state
        .catalog_service
        .list(AdminServiceListQuery {
            skip: query.skip,
            limit: query.limit,
            q: query.q,
            price_min: query.price_min,
            price_max: query.price_max,
            active: Some(true),
            owner_id: None,
        })
        .await?;
    let services: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();
    Ok(Json(services))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service found", body = Json<ServiceResponse>),
        (status = 404, description = "Service not found or inactive")
    )
)]
#[axum::debug_handler]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let service = state.catalog_service.get_active_by_id(id).await?;
    Ok(Json(ServiceResponse::from(service)))
}

#[utoipa::path(
    post,
    path = "/api/admin/services",
    request_body = CreateServicePayload,
    responses(
        (status = 201, description = "Service created", body = Json<ServiceResponse>),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_service(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let service = state.catalog_service.create(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(ServiceResponse::from(service))))
}

#[utoipa::path(
    patch,
    path = "/api/admin/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    request_body = UpdateServicePayload,
    responses(
        (status = 200, description = "Service updated", body = Json<ServiceResponse>),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServicePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let service = state.catalog_service.update(id, payload).await?;
    Ok(Json(ServiceResponse::from(service)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service soft-deleted", body = Json<ServiceResponse>),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let service = state.catalog_service.soft_delete(id).await?;
    Ok(Json(ServiceResponse::from(service)))
}

#[utoipa::path(
    get,
    path = "/api/admin/services",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("q" = Option<String>, Query, description = "Search in title or description"),
        ("active" = Option<bool>, Query, description = "Filter by active flag"),
        ("owner_id" = Option<Uuid>, Query, description = "Filter by owner")
    ),
    responses((status = 200, description = "All services including inactive", body = Json<Vec<ServiceResponse>>))
)]
#[axum::debug_handler]
pub async fn list_all_services(
    State(state): State<AppState>,
    Query(query): Query<AdminServiceListQuery>,
) -> Result<impl IntoResponse> {
    let services = state.catalog_service.list(query).await?;
    let services: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();
    Ok(Json(services))
}

#[utoipa::path(
    get,
    path = "/api/admin/services/{id}",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses(
        (status = 200, description = "Service found, active or not", body = Json<ServiceResponse>),
        (status = 404, description = "Service not found")
    )
)]
#[axum::debug_handler]
pub async fn get_service_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let service = state.catalog_service.get_by_id(id).await?;
    Ok(Json(ServiceResponse::from(service)))
}
