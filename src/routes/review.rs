use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::review_dto::{
        AdminReviewListQuery, CreateReviewPayload, ReviewListQuery, ReviewResponse, ReviewStats,
        UpdateReviewPayload,
    },
    error::Result,
    models::user::User,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewPayload,
    responses(
        (status = 201, description = "Review created", body = Json<ReviewResponse>),
        (status = 400, description = "Booking is not completed"),
        (status = 404, description = "Booking not found or not the caller's"),
        (status = 409, description = "Review already exists for this booking"),
        (status = 422, description = "Rating out of range")
    )
)]
#[axum::debug_handler]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateReviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let review = state.review_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review found", body = Json<ReviewResponse>),
        (status = 404, description = "Review not found")
    )
)]
#[axum::debug_handler]
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let review = state.review_service.get_by_id(id).await?;
    Ok(Json(ReviewResponse::from(review)))
}

#[utoipa::path(
    patch,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = UpdateReviewPayload,
    responses(
        (status = 200, description = "Review updated", body = Json<ReviewResponse>),
        (status = 403, description = "Only the review's author may update it"),
        (status = 404, description = "Review not found"),
        (status = 422, description = "Rating out of range")
    )
)]
#[axum::debug_handler]
pub async fn update_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let review = state.review_service.update(&user, id, payload).await?;
    Ok(Json(ReviewResponse::from(review)))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted", body = Json<ReviewResponse>),
        (status = 403, description = "Caller is neither author nor admin"),
        (status = 404, description = "Review not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let review = state.review_service.delete(&user, id).await?;
    Ok(Json(ReviewResponse::from(review)))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Service ID"),
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("min_rating" = Option<i32>, Query, description = "Minimum rating"),
        ("max_rating" = Option<i32>, Query, description = "Maximum rating")
    ),
    responses((status = 200, description = "Reviews for the service", body = Json<Vec<ReviewResponse>>))
)]
#[axum::debug_handler]
pub async fn list_service_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReviewListQuery>,
) -> Result<impl IntoResponse> {
    let reviews = state
        .review_service
        .list(AdminReviewListQuery {
            skip: query.skip,
            limit: query.limit,
            user_id: None,
            service_id: Some(id),
            min_rating: query.min_rating,
            max_rating: query.max_rating,
        })
        .await?;
    let reviews: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/api/services/{id}/reviews/stats",
    params(("id" = Uuid, Path, description = "Service ID")),
    responses((status = 200, description = "Review aggregates", body = Json<ReviewStats>))
)]
#[axum::debug_handler]
pub async fn service_review_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let stats = state.review_service.service_stats(id).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/me/reviews",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return")
    ),
    responses((status = 200, description = "Caller's reviews", body = Json<Vec<ReviewResponse>>))
)]
#[axum::debug_handler]
pub async fn list_my_reviews(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ReviewListQuery>,
) -> Result<impl IntoResponse> {
    let reviews = state
        .review_service
        .list(AdminReviewListQuery {
            skip: query.skip,
            limit: query.limit,
            user_id: Some(user.id),
            service_id: None,
            min_rating: query.min_rating,
            max_rating: query.max_rating,
        })
        .await?;
    let reviews: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/api/admin/reviews",
    params(
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by review author"),
        ("service_id" = Option<Uuid>, Query, description = "Filter by service"),
        ("min_rating" = Option<i32>, Query, description = "Minimum rating"),
        ("max_rating" = Option<i32>, Query, description = "Maximum rating")
    ),
    responses((status = 200, description = "All reviews", body = Json<Vec<ReviewResponse>>))
)]
#[axum::debug_handler]
pub async fn list_all_reviews(
    State(state): State<AppState>,
    Query(query): Query<AdminReviewListQuery>,
) -> Result<impl IntoResponse> {
    let reviews = state.review_service.list(query).await?;
    let reviews: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("skip" = Option<i64>, Query, description = "Rows to skip"),
        ("limit" = Option<i64>, Query, description = "Rows to return")
    ),
    responses((status = 200, description = "Reviews by the user", body = Json<Vec<ReviewResponse>>))
)]
#[axum::debug_handler]
pub async fn list_user_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ReviewListQuery>,
) -> Result<impl IntoResponse> {
    let reviews = state
        .review_service
        .list(AdminReviewListQuery {
            skip: query.skip,
            limit: query.limit,
            user_id: Some(id),
            service_id: None,
            min_rating: query.min_rating,
            max_rating: query.max_rating,
        })
        .await?;
    let reviews: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}/review",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Review for the booking", body = Json<ReviewResponse>),
        (status = 404, description = "No review for this booking")
    )
)]
#[axum::debug_handler]
pub async fn get_booking_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let review = state.review_service.get_by_booking(id).await?;
    Ok(Json(ReviewResponse::from(review)))
}
