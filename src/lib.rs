pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;

use crate::services::{
    booking_service::BookingService, catalog_service::CatalogService,
    review_service::ReviewService, user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub booking_service: BookingService,
    pub review_service: ReviewService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let user_service = UserService::new(pool.clone());
        let catalog_service = CatalogService::new(pool.clone());
        let booking_service = BookingService::new(pool.clone());
        let review_service = ReviewService::new(pool.clone());

        Self {
            pool,
            user_service,
            catalog_service,
            booking_service,
            review_service,
        }
    }
}

/// Assembles the full application router. Public routes carry no auth;
/// the user and admin groups are wrapped by the bearer middlewares.
pub fn app_router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/register", post(routes::user::register))
        .route("/api/auth/login", post(routes::user::login))
        .route("/api/auth/refresh", post(routes::user::refresh_token))
        .route("/api/services", get(routes::service::list_services))
        .route("/api/services/:id", get(routes::service::get_service))
        .route(
            "/api/services/:id/reviews",
            get(routes::review::list_service_reviews),
        )
        .route(
            "/api/services/:id/reviews/stats",
            get(routes::review::service_review_stats),
        );

    let user_api = Router::new()
        .route("/api/auth/logout", post(routes::user::logout))
        .route(
            "/api/me",
            get(routes::user::get_me)
                .patch(routes::user::update_me)
                .delete(routes::user::delete_me),
        )
        .route("/api/me/reviews", get(routes::review::list_my_reviews))
        .route(
            "/api/bookings",
            get(routes::booking::list_bookings).post(routes::booking::create_booking),
        )
        .route(
            "/api/bookings/:id",
            get(routes::booking::get_booking)
                .patch(routes::booking::update_booking)
                .delete(routes::booking::delete_booking),
        )
        .route(
            "/api/bookings/:id/review",
            get(routes::review::get_booking_review),
        )
        .route("/api/reviews", post(routes::review::create_review))
        .route(
            "/api/reviews/:id",
            get(routes::review::get_review)
                .patch(routes::review::update_review)
                .delete(routes::review::delete_review),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user,
        ));

    let admin_api = Router::new()
        .route("/api/admin/users", get(routes::user::list_users))
        .route(
            "/api/admin/users/:id",
            get(routes::user::get_user)
                .patch(routes::user::update_user)
                .delete(routes::user::delete_user),
        )
        .route(
            "/api/admin/users/:id/reviews",
            get(routes::review::list_user_reviews),
        )
        .route(
            "/api/admin/services",
            get(routes::service::list_all_services).post(routes::service::create_service),
        )
        .route(
            "/api/admin/services/:id",
            get(routes::service::get_service_admin)
                .patch(routes::service::update_service)
                .delete(routes::service::delete_service),
        )
        .route(
            "/api/admin/services/:id/bookings",
            get(routes::booking::list_service_bookings),
        )
        .route(
            "/api/admin/bookings",
            get(routes::booking::list_all_bookings),
        )
        .route(
            "/api/admin/bookings/:id/status",
            patch(routes::booking::update_booking_status),
        )
        .route("/api/admin/reviews", get(routes::review::list_all_reviews))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    public_api
        .merge(user_api)
        .merge(admin_api)
        .with_state(state)
}
