use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::booking_dto::{
        AdminBookingListQuery, BookingListQuery, BookingResponse, CreateBookingPayload,
        UpdateBookingPayload, UpdateBookingStatusPayload,
    },
    error::Result,
    models::user::User,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Booking created", body = Json<BookingResponse>),
        (status = 404, description = "Service not found or inactive"),
        (status = 409, description = "Time slot already booked"),
        (status = 422, description = "Invalid time window")
    )
)]
#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse> {
    let booking = state.booking_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("service_id" = Option<Uuid>, Query, description = "Filter by service"),
        ("from_date" = Option<String>, Query, description = "Bookings starting at or after"),
        ("to_date" = Option<String>, Query, description = "Bookings starting at or before")
    ),
    responses((status = 200, description = "Caller's bookings", body = Json<Vec<BookingResponse>>))
)]
#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse> {
    let bookings = state
        .booking_service
        .list(AdminBookingListQuery {
            skip: query.skip,
            limit: query.limit,
            status: query.status,
            user_id: Some(user.id),
            service_id: query.service_id,
            from_date: query.from_date,
            to_date: query.to_date,
        })
        .await?;
    let bookings: Vec<BookingResponse> = bookings.into_iter().map(Into::into).collect();
    Ok(Json(bookings))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking found", body = Json<BookingResponse>),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Booking not found")
    )
)]
#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let booking = state.booking_service.get(&user, id).await?;
    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingPayload,
    responses(
        (status = 200, description = "Booking updated", body = Json<BookingResponse>),
        (status = 400, description = "Illegal self-service transition"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "New window conflicts with another booking"),
        (status = 422, description = "Invalid time window")
    )
)]
#[axum::debug_handler]
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingPayload>,
) -> Result<impl IntoResponse> {
    let booking = state.booking_service.update(&user, id, payload).await?;
    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking deleted", body = Json<BookingResponse>),
        (status = 400, description = "Booking already started"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Booking not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let booking = state.booking_service.delete(&user, id).await?;
    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    get,
    path = "/api/admin/bookings",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by user"),
        ("service_id" = Option<Uuid>, Query, description = "Filter by service")
    ),
    responses((status = 200, description = "All bookings", body = Json<Vec<BookingResponse>>))
)]
#[axum::debug_handler]
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(query): Query<AdminBookingListQuery>,
) -> Result<impl IntoResponse> {
    let bookings = state.booking_service.list(query).await?;
    let bookings: Vec<BookingResponse> = bookings.into_iter().map(Into::into).collect();
    Ok(Json(bookings))
}

#[utoipa::path(
    patch,
    path = "/api/admin/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingStatusPayload,
    responses(
        (status = 200, description = "Status updated", body = Json<BookingResponse>),
        (status = 404, description = "Booking not found")
    )
)]
#[axum::debug_handler]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingStatusPayload>,
) -> Result<impl IntoResponse> {
    let patch = UpdateBookingPayload {
        start_time: None,
        end_time: None,
        status: Some(payload.status),
    };
    let booking = state.booking_service.update(&user, id, patch).await?;
    Ok(Json(BookingResponse::from(booking)))
}

#[utoipa::path(
    get,
    path = "/api/admin/services/{id}/bookings",
    params(
        ("id" = Uuid, Path, description = "Service ID"),
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("status" = Option<String>, Query, description = "Filter by status")
    ),
    responses((status = 200, description = "Bookings for the service", body = Json<Vec<BookingResponse>>))
)]
#[axum::debug_handler]
pub async fn list_service_bookings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse> {
    let bookings = state
        .booking_service
        .list(AdminBookingListQuery {
            skip: query.skip,
            limit: query.limit,
            status: query.status,
            user_id: None,
            service_id: Some(id),
            from_date: query.from_date,
            to_date: query.to_date,
        })
        .await?;
    let bookings: Vec<BookingResponse> = bookings.into_iter().map(Into::into).collect();
    Ok(Json(bookings))
}
