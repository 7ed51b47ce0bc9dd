use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> (Router, PgPool) {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "60");
    env::set_var("REFRESH_TOKEN_EXPIRE_DAYS", "7");

    let _ = booking_backend::config::init_config();
    let pool = booking_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let app = booking_backend::app_router(booking_backend::AppState::new(pool.clone()));
    (app, pool)
}

async fn body_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_and_login(app: &Router, role: &str) -> String {
    let email = format!("{}_{}@example.com", role, Uuid::new_v4());
    let register_body = json!({
        "name": "Review Tester",
        "email": email,
        "password": "correct horse",
        "role": role
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(register_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let login_body = json!({"email": email, "password": "correct horse"});
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(login_body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_service(app: &Router, admin_token: &str) -> Uuid {
    let body = json!({
        "title": "Guided Tour",
        "description": null,
        "price": "25.00",
        "duration_minutes": 90
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/admin/services")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    Uuid::parse_str(created["id"].as_str().unwrap()).unwrap()
}

/// Books the service for the caller and returns the booking id. The
/// window is offset per call so bookings never collide.
async fn book(app: &Router, token: &str, service_id: Uuid, day_offset: i64) -> Uuid {
    let start = Utc::now() + Duration::days(day_offset);
    let body = json!({
        "service_id": service_id,
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(1)).to_rfc3339()
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let booking = body_json(resp).await;
    Uuid::parse_str(booking["id"].as_str().unwrap()).unwrap()
}

async fn set_status(app: &Router, admin_token: &str, booking_id: Uuid, status: &str) {
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/admin/bookings/{}/status", booking_id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::from(json!({"status": status}).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn post_review(
    app: &Router,
    token: &str,
    booking_id: Uuid,
    rating: i32,
    comment: Option<&str>,
) -> axum::response::Response {
    let body = json!({
        "booking_id": booking_id,
        "rating": rating,
        "comment": comment
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/reviews")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
#[ignore = "needs a running Postgres (DATABASE_URL)"]
async fn review_flow_end_to_end() {
    let (app, _pool) = setup().await;

    let admin_token = register_and_login(&app, "admin").await;
    let user_token = register_and_login(&app, "user").await;
    let service_id = create_service(&app, &admin_token).await;

    let first_booking = book(&app, &user_token, service_id, 1).await;

    // Pending bookings cannot be reviewed yet.
    let resp = post_review(&app, &user_token, first_booking, 5, Some("great")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    set_status(&app, &admin_token, first_booking, "completed").await;

    // Rating bounds are enforced before anything touches the store.
    let resp = post_review(&app, &user_token, first_booking, 6, None).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let resp = post_review(&app, &user_token, first_booking, 0, None).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Only the booking's owner may review it; for anyone else the
    // booking does not exist.
    let stranger_token = register_and_login(&app, "user").await;
    let resp = post_review(&app, &stranger_token, first_booking, 5, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = post_review(&app, &user_token, first_booking, 5, Some("great")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let review = body_json(resp).await;
    assert_eq!(review["rating"], 5);
    let review_id = Uuid::parse_str(review["id"].as_str().unwrap()).unwrap();

    // One review per booking.
    let resp = post_review(&app, &user_token, first_booking, 4, None).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Updates are author-only, no admin bypass.
    let patch = json!({"comment": "even better on reflection"});
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/reviews/{}", review_id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", stranger_token))
        .body(Body::from(patch.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/api/reviews/{}", review_id))
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", user_token))
        .body(Body::from(patch.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["comment"], "even better on reflection");
    assert_eq!(updated["rating"], 5);

    // Second completed booking and review, then check the aggregates.
    let second_booking = book(&app, &user_token, service_id, 2).await;
    set_status(&app, &admin_token, second_booking, "completed").await;
    let resp = post_review(&app, &user_token, second_booking, 4, None).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/services/{}/reviews/stats", service_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats = body_json(resp).await;
    assert_eq!(stats["total_reviews"], 2);
    assert_eq!(stats["average_rating"], 4.5);
    assert_eq!(stats["min_rating"], 4);
    assert_eq!(stats["max_rating"], 5);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/services/{}/reviews", service_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = body_json(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    // Admins may remove a review they did not write.
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/reviews/{}", review_id))
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/services/{}/reviews/stats", service_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let stats = body_json(resp).await;
    assert_eq!(stats["total_reviews"], 1);
}

#[tokio::test]
#[ignore = "needs a running Postgres (DATABASE_URL)"]
async fn review_stats_empty_service() {
    let (app, _pool) = setup().await;

    let admin_token = register_and_login(&app, "admin").await;
    let service_id = create_service(&app, &admin_token).await;

    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/services/{}/reviews/stats", service_id))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats = body_json(resp).await;
    assert_eq!(stats["total_reviews"], 0);
    assert!(stats["average_rating"].is_null());
    assert!(stats["min_rating"].is_null());
    assert!(stats["max_rating"].is_null());
}
